use crate::project_info::{metadata, version_info};
use anyhow::bail;
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vault_core::models::{
    BackupManagementType, ContainerRegistrationStatus, ContainerType, IlrAction, ItemRef,
    VmIdentity, VmLocation, WorkloadType,
};

/// 受保护项定位参数
///
/// 通过 `--container/--item` 直接指定服务端名称，
/// 或通过 `--vm` 加资源组/云服务定位虚拟机。
#[derive(Args, Debug, Clone)]
pub struct ItemArgs {
    /// 工作负载类型
    #[arg(
        long,
        default_value = "AzureVM",
        help = "工作负载类型：AzureVM、AzureSQLDatabase、FileFolder"
    )]
    pub workload: WorkloadType,

    /// 备份管理类型
    #[arg(long, help = "备份管理类型：AzureVM、AzureSql、MAB、DPM、AzureBackupServer")]
    pub management_type: Option<BackupManagementType>,

    /// 保护容器名称
    #[arg(long, requires = "item", conflicts_with = "vm")]
    pub container: Option<String>,

    /// 受保护项名称
    #[arg(long, requires = "container")]
    pub item: Option<String>,

    /// 虚拟机名称
    #[arg(long)]
    pub vm: Option<String>,

    /// Compute 虚拟机所在资源组
    #[arg(long, requires = "vm", conflicts_with = "cloud_service")]
    pub resource_group: Option<String>,

    /// 经典虚拟机所在云服务
    #[arg(long, requires = "vm")]
    pub cloud_service: Option<String>,
}

impl ItemArgs {
    pub fn vm_identity(&self) -> anyhow::Result<Option<VmIdentity>> {
        let Some(name) = &self.vm else {
            return Ok(None);
        };

        let location = match (&self.resource_group, &self.cloud_service) {
            (Some(resource_group), _) => VmLocation::Compute {
                resource_group: resource_group.clone(),
            },
            (None, Some(service_name)) => VmLocation::Classic {
                service_name: service_name.clone(),
            },
            (None, None) => bail!("虚拟机 {name} 需要指定 --resource-group 或 --cloud-service"),
        };

        Ok(Some(VmIdentity {
            name: name.clone(),
            location,
        }))
    }

    pub fn item_ref(&self) -> anyhow::Result<ItemRef> {
        if let (Some(container), Some(item)) = (&self.container, &self.item) {
            return Ok(ItemRef::new(container, item));
        }
        match self.vm_identity()? {
            Some(vm) => Ok(vm.item_ref()),
            None => bail!("请通过 --container/--item 或 --vm 指定受保护项"),
        }
    }
}

/// 备份计划与保留策略参数
#[derive(Args, Debug, Clone, Default)]
pub struct ScheduleArgs {
    /// 计划类型
    #[arg(long, value_parser = ["daily", "weekly"], help = "计划类型：daily 或 weekly")]
    pub schedule: Option<String>,

    /// 每周运行日，逗号分隔
    #[arg(long, value_delimiter = ',', help = "每周运行日，例如 Monday,Thursday")]
    pub run_days: Vec<String>,

    /// 备份开始时间
    #[arg(long, help = "备份开始时间（RFC3339），例如 2024-03-04T22:10:00+08:00")]
    pub run_time: Option<DateTime<FixedOffset>>,

    /// 保留策略文件
    #[arg(long, help = "保留策略 JSON 文件，未指定时使用默认保留策略")]
    pub retention_file: Option<PathBuf>,
}

impl ScheduleArgs {
    pub fn has_schedule(&self) -> bool {
        self.schedule.is_some() || !self.run_days.is_empty() || self.run_time.is_some()
    }
}

/// 保护容器相关命令
#[derive(Subcommand, Debug)]
pub enum ContainerCommand {
    /// 列出已注册的保护容器
    List {
        /// 容器类型
        #[arg(long, default_value = "AzureVM")]
        container_type: ContainerType,
        /// 备份管理类型
        #[arg(long, default_value = "AzureVM")]
        management_type: BackupManagementType,
        /// 注册状态
        #[arg(long)]
        status: Option<ContainerRegistrationStatus>,
        /// 按友好名称过滤
        #[arg(long)]
        name: Option<String>,
        /// 按资源组过滤
        #[arg(long)]
        resource_group: Option<String>,
    },
}

/// 保护策略相关命令
#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// 列出保护策略
    List {
        /// 按名称查询
        #[arg(long, conflicts_with = "workload")]
        name: Option<String>,
        /// 按工作负载查询
        #[arg(long)]
        workload: Option<WorkloadType>,
        /// 与工作负载一起指定管理类型
        #[arg(long, requires = "workload")]
        management_type: Option<BackupManagementType>,
    },
    /// 查看单个保护策略
    Get {
        /// 策略名称
        name: String,
        #[arg(long, default_value = "AzureVM")]
        workload: WorkloadType,
        #[arg(long)]
        management_type: Option<BackupManagementType>,
    },
    /// 创建保护策略
    New {
        /// 策略名称
        name: String,
        #[arg(long, default_value = "AzureVM")]
        workload: WorkloadType,
        #[arg(long)]
        management_type: Option<BackupManagementType>,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
    /// 修改保护策略的备份计划或保留策略
    Set {
        /// 策略名称
        name: String,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
    /// 删除保护策略
    Remove {
        /// 策略名称
        name: String,
    },
    /// 显示默认备份计划与保留策略
    Defaults {
        #[arg(long, default_value = "AzureVM")]
        workload: WorkloadType,
        #[arg(long)]
        management_type: Option<BackupManagementType>,
    },
}

/// 保护相关命令
#[derive(Subcommand, Debug)]
pub enum ProtectionCommand {
    /// 开启保护或切换受保护项的策略
    Enable {
        #[command(flatten)]
        target: ItemArgs,
        /// 使用的保护策略名称
        #[arg(long)]
        policy: String,
    },
    /// 停止保护
    Disable {
        #[command(flatten)]
        target: ItemArgs,
    },
    /// 查看受保护项
    Item {
        #[command(flatten)]
        target: ItemArgs,
    },
}

/// 恢复点相关命令
#[derive(Subcommand, Debug)]
pub enum RecoveryPointCommand {
    /// 列出恢复点
    List {
        #[command(flatten)]
        target: ItemArgs,
        /// 起始时间（RFC3339）
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// 结束时间（RFC3339）
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },
    /// 查看恢复点详情
    Get {
        #[command(flatten)]
        target: ItemArgs,
        /// 恢复点 ID
        id: String,
    },
    /// 申请文件级恢复访问并下载挂载脚本
    Grant {
        #[command(flatten)]
        target: ItemArgs,
        /// 恢复点 ID
        id: String,
        /// 脚本保存目录
        #[arg(long, default_value = ".")]
        target_dir: PathBuf,
    },
    /// 撤销文件级恢复访问
    Revoke {
        #[command(flatten)]
        target: ItemArgs,
        /// 恢复点 ID
        id: String,
    },
    /// 浏览恢复点
    Explore {
        #[command(flatten)]
        target: ItemArgs,
        /// 恢复点 ID
        id: String,
        /// 浏览动作
        #[arg(long, default_value = "connect", help = "connect、extend 或 terminate")]
        action: IlrAction,
        /// 脚本保存目录
        #[arg(long, default_value = ".")]
        target_dir: PathBuf,
    },
}

/// 备份作业相关命令
#[derive(Subcommand, Debug)]
pub enum JobCommand {
    /// 查看一个或多个作业
    Get {
        /// 作业 ID
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// 取消作业
    Stop {
        /// 作业 ID
        id: String,
    },
}

#[derive(Parser)]
#[command(name = "vault-cli")]
#[command(about = metadata::PROJECT_DESCRIPTION)]
#[command(version = version_info::CLI_VERSION)]
#[command(long_about = metadata::display::DESCRIPTION_LONG)]
#[command(author = metadata::PROJECT_AUTHORS)]
pub struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// 详细输出
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 首次使用时初始化客户端，创建配置文件
    Init {
        /// 覆盖已存在的配置文件
        #[arg(long)]
        force: bool,
    },
    /// 显示当前API配置信息
    ApiInfo,
    /// 列出各 Provider 支持的操作
    Providers,
    /// 保护容器相关命令
    #[command(subcommand)]
    Container(ContainerCommand),
    /// 保护策略相关命令
    #[command(subcommand)]
    Policy(PolicyCommand),
    /// 保护相关命令
    #[command(subcommand)]
    Protection(ProtectionCommand),
    /// 立即备份受保护项
    Backup {
        #[command(flatten)]
        target: ItemArgs,
    },
    /// 从恢复点恢复受保护项
    Restore {
        #[command(flatten)]
        target: ItemArgs,
        /// 恢复点 ID
        #[arg(long)]
        recovery_point: String,
        /// 恢复使用的存储账户名称
        #[arg(long)]
        storage_account: String,
    },
    /// 恢复点相关命令
    #[command(subcommand)]
    RecoveryPoint(RecoveryPointCommand),
    /// 备份作业相关命令
    #[command(subcommand)]
    Job(JobCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_policy_new_weekly() {
        let cli = Cli::try_parse_from([
            "vault-cli",
            "policy",
            "new",
            "WeeklyPolicy",
            "--schedule",
            "weekly",
            "--run-days",
            "Monday,Thursday",
            "--run-time",
            "2024-03-04T22:10:00+08:00",
        ])
        .unwrap();

        let Commands::Policy(PolicyCommand::New { name, workload, schedule, .. }) = cli.command
        else {
            panic!("应解析为 policy new");
        };
        assert_eq!(name, "WeeklyPolicy");
        assert_eq!(workload, WorkloadType::AzureVm);
        assert_eq!(schedule.schedule.as_deref(), Some("weekly"));
        assert_eq!(schedule.run_days, vec!["Monday", "Thursday"]);
        assert!(schedule.has_schedule());
    }

    #[test]
    fn test_item_args_from_vm() {
        let cli = Cli::try_parse_from([
            "vault-cli",
            "backup",
            "--vm",
            "web01",
            "--resource-group",
            "rg1",
        ])
        .unwrap();

        let Commands::Backup { target } = cli.command else {
            panic!("应解析为 backup");
        };
        let item = target.item_ref().unwrap();
        assert_eq!(item.container_name, "iaasvmcontainer;iaasvmcontainerv2;rg1;web01");
        assert_eq!(item.item_name, "vm;iaasvmcontainerv2;rg1;web01");
    }

    #[test]
    fn test_item_args_require_location_for_vm() {
        let cli = Cli::try_parse_from(["vault-cli", "backup", "--vm", "web01"]).unwrap();
        let Commands::Backup { target } = cli.command else {
            panic!("应解析为 backup");
        };
        assert!(target.item_ref().is_err());
    }

    #[test]
    fn test_container_conflicts_with_vm() {
        let result = Cli::try_parse_from([
            "vault-cli",
            "backup",
            "--container",
            "c1",
            "--item",
            "i1",
            "--vm",
            "web01",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_explore_action_parses() {
        let cli = Cli::try_parse_from([
            "vault-cli",
            "recovery-point",
            "explore",
            "--container",
            "c1",
            "--item",
            "i1",
            "rp1",
            "--action",
            "terminate",
        ])
        .unwrap();

        let Commands::RecoveryPoint(RecoveryPointCommand::Explore { id, action, .. }) = cli.command
        else {
            panic!("应解析为 recovery-point explore");
        };
        assert_eq!(id, "rp1");
        assert_eq!(action, IlrAction::Terminate);
    }
}
