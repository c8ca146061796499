use crate::app::CliApp;
use crate::cli::{ItemArgs, ProtectionCommand};
use crate::utils::print_json;
use tracing::info;
use vault_core::models::ProtectedItem;
use vault_core::protection::ProtectionTarget;

/// 按命令行参数查询受保护项
pub async fn resolve_item(app: &CliApp, target: &ItemArgs) -> anyhow::Result<ProtectedItem> {
    let item_ref = target.item_ref()?;
    let item = app
        .manager
        .get_protected_item(target.workload, target.management_type, item_ref)
        .await?;
    Ok(item)
}

/// 处理保护相关命令
pub async fn handle_protection_command(
    app: &CliApp,
    command: ProtectionCommand,
) -> anyhow::Result<()> {
    match command {
        ProtectionCommand::Enable { target, policy } => {
            let policy = app
                .manager
                .get_policy(target.workload, target.management_type, &policy)
                .await?;
            // 指定虚拟机时按新保护处理，否则为已有受保护项切换策略
            let protection_target = match target.vm_identity()? {
                Some(vm) => ProtectionTarget::Vm(vm),
                None => ProtectionTarget::Item(resolve_item(app, &target).await?),
            };

            info!("🛡️  开启保护，使用策略: {}", policy.name);
            let job = app.manager.enable_protection(protection_target, &policy).await?;
            info!("✅ 保护已开启");
            print_json(&job)
        }
        ProtectionCommand::Disable { target } => {
            let item = resolve_item(app, &target).await?;
            info!("🛑 停止保护: {}", item.friendly_name);
            let job = app.manager.disable_protection(&item).await?;
            info!("✅ 保护已停止");
            print_json(&job)
        }
        ProtectionCommand::Item { target } => {
            let item = resolve_item(app, &target).await?;
            print_json(&item)
        }
    }
}

/// 立即备份
pub async fn run_backup(app: &CliApp, target: &ItemArgs) -> anyhow::Result<()> {
    let item = resolve_item(app, target).await?;
    info!("💾 开始备份: {}", item.friendly_name);
    let job = app.manager.trigger_backup(&item).await?;
    info!("✅ 备份任务已完成提交");
    print_json(&job)
}

/// 从恢复点恢复到指定存储账户
pub async fn run_restore(
    app: &CliApp,
    target: &ItemArgs,
    recovery_point_id: &str,
    storage_account: &str,
) -> anyhow::Result<()> {
    let item = resolve_item(app, target).await?;
    let recovery_point = app.manager.get_recovery_point(&item, recovery_point_id).await?;

    info!(
        "♻️  从恢复点 {} 恢复 {}，存储账户: {}",
        recovery_point.name, item.friendly_name, storage_account
    );
    let job = app
        .manager
        .restore_item(&recovery_point, &item, storage_account)
        .await?;
    info!("✅ 恢复任务已完成提交");
    print_json(&job)
}
