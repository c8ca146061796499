use std::path::Path;
use tracing::{info, warn};
use vault_core::config::AppConfig;

/// 运行独立的初始化流程，写出默认配置文件
pub fn run_init(config_path: &Path, force: bool) -> anyhow::Result<()> {
    info!("🔐 Vault Client 初始化");
    info!("======================");

    if !force && config_path.exists() {
        warn!("⚠️  检测到已存在的配置文件: {}", config_path.display());
        info!("如果您要重新初始化，请使用 --force 参数");
        info!("示例: vault-cli init --force");
        return Ok(());
    }

    info!("📋 步骤 1: 创建配置文件");
    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let config = AppConfig::default();
    config.save_to_file(config_path)?;
    info!("   ✅ 创建配置文件: {}", config_path.display());

    info!("📋 步骤 2: 补充保管库信息");
    info!("   👉 请在配置文件中填写 subscription_id、resource_group 与 vault_name");
    info!(
        "   👉 访问令牌可写入 access_token，或通过环境变量 {} 提供",
        vault_core::constants::api::ACCESS_TOKEN_ENV
    );

    info!("🎉 初始化完成");
    Ok(())
}
