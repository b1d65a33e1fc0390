use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::error;
use tracing_subscriber::fmt;

use gridpress::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志系统
    fmt().with_target(false).init();

    // 解析命令行参数
    let cli = cli::Cli::parse();

    println!(
        "{} {}",
        "GridPress".bright_cyan(),
        env!("CARGO_PKG_VERSION").bright_green()
    );
    println!("{}", "A grid-based static site builder".bright_white());
    println!();

    // 执行命令
    if let Err(e) = cli::execute(cli).await {
        error!("Error: {}", e);

        // 打印错误链
        for cause in e.chain().skip(1) {
            error!("Caused by: {}", cause);
        }

        std::process::exit(1);
    }

    Ok(())
}
