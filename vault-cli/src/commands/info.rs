use crate::app::CliApp;
use crate::project_info::get_version_string;
use tracing::info;
use vault_core::provider::ProviderKind;

/// 显示当前API配置信息
pub fn run_api_info(app: &CliApp) {
    info!("🔐 {}", get_version_string());
    info!("{}", app.manager.client().endpoints());
    info!("异步操作轮询间隔: {:?}", app.config.tracking.poll_interval());
    match app.config.tracking.timeout() {
        Some(timeout) => info!("异步操作超时: {:?}", timeout),
        None => info!("异步操作超时: 不限制"),
    }
}

/// 列出各 Provider 支持的操作，不需要加载配置
pub fn run_providers() {
    info!("🧩 已注册的 Provider:");
    for kind in ProviderKind::ALL {
        let operations: Vec<String> = kind.operations().iter().map(ToString::to_string).collect();
        info!("   {} ({} 项操作)", kind, operations.len());
        for operation in operations {
            info!("      - {}", operation);
        }
    }
}
