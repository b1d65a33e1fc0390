use anyhow::{anyhow, Result};
use axum::{http::StatusCode, routing::get_service, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

/// 预览生成结果的静态文件服务器
pub struct Server {
    /// 站点输出目录
    site_dir: PathBuf,
    /// 端口
    port: u16,
}

impl Server {
    pub fn new(site_dir: PathBuf, port: u16) -> Self {
        Self { site_dir, port }
    }

    pub fn router(&self) -> Router {
        let serve_dir = get_service(ServeDir::new(&self.site_dir).append_index_html_on_directories(true))
            .handle_error(|_| async move {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            });

        Router::new()
            .fallback_service(serve_dir)
            .layer(TraceLayer::new_for_http())
    }

    /// 启动服务器，直到进程退出
    pub async fn start(self) -> Result<()> {
        if !self.site_dir.exists() {
            return Err(anyhow!(
                "输出目录不存在: {}，请先运行 build",
                self.site_dir.display()
            ));
        }

        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.port).parse()?;
        info!("Serving {} at http://localhost:{}", self.site_dir.display(), self.port);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
