use crate::app::CliApp;
use crate::cli::RecoveryPointCommand;
use crate::commands::resolve_item;
use crate::utils::print_json;
use tracing::info;
use vault_core::models::{IlrAction, RecoveryPointFilter};
use vault_core::protection::RecoveryPointAccess;

/// 处理恢复点相关命令
pub async fn handle_recovery_point_command(
    app: &CliApp,
    command: RecoveryPointCommand,
) -> anyhow::Result<()> {
    match command {
        RecoveryPointCommand::List { target, start, end } => {
            let item = resolve_item(app, &target).await?;
            let points = app
                .manager
                .list_recovery_points(&item, RecoveryPointFilter { start, end })
                .await?;
            info!("🕒 {} 共 {} 个恢复点", item.friendly_name, points.len());
            print_json(&points)
        }
        RecoveryPointCommand::Get { target, id } => {
            let item = resolve_item(app, &target).await?;
            let point = app.manager.get_recovery_point(&item, &id).await?;
            print_json(&point)
        }
        RecoveryPointCommand::Grant {
            target,
            id,
            target_dir,
        } => {
            let item = resolve_item(app, &target).await?;
            let point = app.manager.get_recovery_point(&item, &id).await?;
            let access = app
                .manager
                .grant_recovery_point_access(&item, &point, &target_dir)
                .await?;
            report_access(&access);
            print_json(&access)
        }
        RecoveryPointCommand::Revoke { target, id } => {
            let item = resolve_item(app, &target).await?;
            let point = app.manager.get_recovery_point(&item, &id).await?;
            let job = app.manager.revoke_recovery_point_access(&item, &point).await?;
            info!("✅ 已撤销恢复点 {} 的文件级恢复访问", point.name);
            print_json(&job)
        }
        RecoveryPointCommand::Explore {
            target,
            id,
            action,
            target_dir,
        } => {
            let item = resolve_item(app, &target).await?;
            let point = app.manager.get_recovery_point(&item, &id).await?;
            let access = app
                .manager
                .explore_recovery_point(&item, &point, action, &target_dir)
                .await?;
            if action == IlrAction::Terminate {
                info!("✅ 已结束恢复点 {} 的浏览", point.name);
            } else {
                report_access(&access);
            }
            print_json(&access)
        }
    }
}

fn report_access(access: &RecoveryPointAccess) {
    if let Some(path) = &access.script_path {
        info!("📄 运行挂载脚本以浏览恢复点文件: {}", path.display());
    }
    if access.password.is_some() {
        info!("🔑 运行脚本时需要输入输出结果中的密码");
    }
}
