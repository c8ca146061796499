use std::path::Path;

use crate::cli::Commands;
use crate::commands;
use tracing::{info, warn};
use vault_core::config::AppConfig;
use vault_core::{ProtectionManager, RestClient};

pub struct CliApp {
    pub config: AppConfig,
    pub manager: ProtectionManager<RestClient>,
}

impl CliApp {
    /// 优先使用指定的配置文件，不存在时按默认文件名智能查找
    pub fn new_with_config(config_path: &Path) -> anyhow::Result<Self> {
        let config = if config_path.exists() {
            AppConfig::load_from_file(config_path)?
        } else {
            AppConfig::find_and_load_config()?
        };
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let client = RestClient::new(&config)?;
        let manager = ProtectionManager::from_config(client, &config)?;
        Ok(Self { config, manager })
    }

    /// 收到 Ctrl-C 时取消正在跟踪的异步操作
    pub fn cancel_on_ctrl_c(&self) {
        let token = self.manager.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("⚠️  收到中断信号，停止跟踪异步操作");
                token.cancel();
            }
        });
    }

    pub async fn run_command(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Init { .. } | Commands::Providers => {
                // 在 main 中加载配置前处理
                Ok(())
            }
            Commands::ApiInfo => {
                commands::run_api_info(self);
                Ok(())
            }
            Commands::Container(container_cmd) => {
                commands::handle_container_command(self, container_cmd).await
            }
            Commands::Policy(policy_cmd) => commands::handle_policy_command(self, policy_cmd).await,
            Commands::Protection(protection_cmd) => {
                commands::handle_protection_command(self, protection_cmd).await
            }
            Commands::Backup { target } => commands::run_backup(self, &target).await,
            Commands::Restore {
                target,
                recovery_point,
                storage_account,
            } => commands::run_restore(self, &target, &recovery_point, &storage_account).await,
            Commands::RecoveryPoint(recovery_point_cmd) => {
                commands::handle_recovery_point_command(self, recovery_point_cmd).await
            }
            Commands::Job(job_cmd) => {
                info!("📋 查询备份作业");
                commands::handle_job_command(self, job_cmd).await
            }
        }
    }
}
