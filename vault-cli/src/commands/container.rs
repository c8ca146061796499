use crate::app::CliApp;
use crate::cli::ContainerCommand;
use crate::utils::print_json;
use tracing::info;
use vault_core::models::ContainerQuery;

/// 处理保护容器相关命令
pub async fn handle_container_command(app: &CliApp, command: ContainerCommand) -> anyhow::Result<()> {
    match command {
        ContainerCommand::List {
            container_type,
            management_type,
            status,
            name,
            resource_group,
        } => {
            let query = ContainerQuery {
                container_type,
                backup_management_type: management_type,
                status,
                name,
                resource_group,
            };
            let containers = app.manager.list_containers(query).await?;
            info!("📦 共 {} 个保护容器", containers.len());
            print_json(&containers)
        }
    }
}
