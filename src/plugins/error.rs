use thiserror::Error;

/// 插件错误类型
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("注册插件失败: {message}")]
    RegistrationError {
        message: String,
    },

    #[error("未找到插件: {name}")]
    NotFound {
        name: String,
    },

    #[error("安装插件资源失败: {plugin_name} - {message}")]
    AssetError {
        plugin_name: String,
        message: String,
    },

    #[error("读取主题变量失败: {plugin_name} - {message}")]
    ThemeVarsError {
        plugin_name: String,
        message: String,
    },
}
