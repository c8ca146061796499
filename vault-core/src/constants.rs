/// 保留策略相关常量
pub mod retention {
    /// 每日保留数量下限
    pub const DAILY_MIN: u32 = 7;
    /// 每日保留数量上限
    pub const DAILY_MAX: u32 = 90;

    pub const WEEKLY_MIN: u32 = 1;
    pub const WEEKLY_MAX: u32 = 30;

    pub const MONTHLY_MIN: u32 = 1;
    pub const MONTHLY_MAX: u32 = 24;

    pub const YEARLY_MIN: u32 = 1;
    pub const YEARLY_MAX: u32 = 99;

    /// 代表"当月最后一天"的日期值
    /// 与服务端约定，无论当月实际天数均编码为 29
    pub const LAST_DAY_OF_MONTH: u8 = 29;

    /// 普通日期的上限，超过则只能用 LAST_DAY_OF_MONTH
    pub const MAX_EXPLICIT_DAY_OF_MONTH: u8 = 28;
}

/// 策略名称校验常量
pub mod policy_name {
    /// 策略名称正则
    pub const PATTERN: &str = "^[A-Za-z][-A-Za-z0-9]*[A-Za-z0-9]$";

    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 150;
}

/// 备份计划相关常量
pub mod schedule {
    /// 运行时间按分钟对齐的粒度
    pub const SLOT_MINUTES: u32 = 30;

    /// 服务端唯一支持的备份类型
    pub const BACKUP_TYPE_FULL: &str = "Full";

    /// 默认策略的运行时刻 (UTC)
    pub const DEFAULT_RUN_HOUR: u32 = 22;
    pub const DEFAULT_RUN_MINUTE: u32 = 30;

    /// 默认策略的各层保留数量
    pub const DEFAULT_DAILY_RETENTION: u32 = 30;
    pub const DEFAULT_WEEKLY_RETENTION: u32 = 12;
    pub const DEFAULT_MONTHLY_RETENTION: u32 = 12;
    pub const DEFAULT_YEARLY_RETENTION: u32 = 10;
}

/// 异步操作跟踪常量
pub mod tracking {
    /// 两次轮询之间的固定间隔（秒）
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

    /// 默认整体超时（秒），0 表示不限制
    pub const DEFAULT_TIMEOUT_SECS: u64 = 0;
}

/// API服务相关常量
pub mod api {
    /// 默认管理端地址
    pub const DEFAULT_BASE_URL: &str = "https://management.azure.com";

    /// 默认 API 版本
    pub const DEFAULT_API_VERSION: &str = "2016-06-01";

    /// 默认备份 fabric
    pub const DEFAULT_FABRIC: &str = "Azure";

    /// 存储账户查询使用的 API 版本
    pub const STORAGE_API_VERSION: &str = "2016-01-01";
    pub const CLASSIC_STORAGE_API_VERSION: &str = "2015-12-01";

    /// 访问令牌环境变量
    pub const ACCESS_TOKEN_ENV: &str = "VAULT_ACCESS_TOKEN";

    /// API端点路径，均相对于保管库根路径
    pub mod endpoints {
        /// 保管库根路径（包含占位符）
        pub const VAULT_ROOT: &str = "/subscriptions/{subscription}/resourceGroups/{resource_group}/providers/Microsoft.RecoveryServices/vaults/{vault}";

        pub const POLICIES: &str = "/backupPolicies";
        pub const POLICY: &str = "/backupPolicies/{policy}";

        pub const CONTAINERS: &str = "/backupProtectionContainers";

        /// 受保护项（包含 fabric / container / item 占位符）
        pub const PROTECTED_ITEM: &str = "/backupFabrics/{fabric}/protectionContainers/{container}/protectedItems/{item}";
        pub const BACKUP: &str = "/backupFabrics/{fabric}/protectionContainers/{container}/protectedItems/{item}/backup";
        pub const RECOVERY_POINTS: &str = "/backupFabrics/{fabric}/protectionContainers/{container}/protectedItems/{item}/recoveryPoints";
        pub const RECOVERY_POINT: &str = "/backupFabrics/{fabric}/protectionContainers/{container}/protectedItems/{item}/recoveryPoints/{recovery_point}";
        pub const RESTORE: &str = "/backupFabrics/{fabric}/protectionContainers/{container}/protectedItems/{item}/recoveryPoints/{recovery_point}/restore";
        pub const PROVISION_ILR: &str = "/backupFabrics/{fabric}/protectionContainers/{container}/protectedItems/{item}/recoveryPoints/{recovery_point}/provisionInstantItemRecovery";
        pub const REVOKE_ILR: &str = "/backupFabrics/{fabric}/protectionContainers/{container}/protectedItems/{item}/recoveryPoints/{recovery_point}/revokeInstantItemRecovery";

        pub const JOB: &str = "/backupJobs/{job}";
        pub const CANCEL_JOB: &str = "/backupJobs/{job}/cancel";

        /// 存储账户查询，相对于订阅根路径
        pub const CLASSIC_STORAGE_ACCOUNTS: &str = "/subscriptions/{subscription}/providers/Microsoft.ClassicStorage/storageAccounts";
        pub const STORAGE_ACCOUNTS: &str = "/subscriptions/{subscription}/providers/Microsoft.Storage/storageAccounts";
    }

    /// HTTP相关常量
    pub mod http {
        /// 请求追踪头
        pub const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

        /// 请求追踪 ID 后缀
        pub const CLIENT_REQUEST_ID_SUFFIX: &str = "-cli";

        /// 异步操作状态头
        pub const ASYNC_OPERATION_HEADER: &str = "Azure-AsyncOperation";

        /// 默认请求超时时间（秒）
        pub const DEFAULT_TIMEOUT: u64 = 60;

        /// 用户代理
        pub const USER_AGENT: &str = concat!("vault-cli/", env!("CARGO_PKG_VERSION"));
    }
}

/// IaaS 虚拟机相关常量
pub mod vm {
    /// 经典虚拟机容器名称前缀，Compute 虚拟机为 iaasvmcontainer;iaasvmcontainerv2;
    pub const CLASSIC_CONTAINER_PREFIX: &str = "iaasvmcontainer;iaasvmcontainer;";

    pub const CLASSIC_ITEM_TYPE: &str = "Microsoft.ClassicCompute/virtualMachines";

    pub const COMPUTE_ITEM_TYPE: &str = "Microsoft.Compute/virtualMachines";
}

/// 配置文件相关常量
pub mod config {
    /// 按优先级查找的配置文件名
    pub const CONFIG_FILE_NAMES: [&str; 3] =
        ["config.toml", "vault-client.toml", ".vault-client.toml"];

    /// 默认配置文件名
    pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
}
