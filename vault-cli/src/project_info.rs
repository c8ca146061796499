/// Vault CLI 项目信息模块
///
/// vault-cli 是面向用户的主程序，项目元数据统一在这里定义，
/// vault-core 作为内部库只提供技术性常量

/// 项目元数据（自动从 vault-cli 的 Cargo.toml 同步）
pub mod metadata {
    /// 项目名称
    pub const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

    /// 项目描述
    pub const PROJECT_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

    /// 项目作者
    pub const PROJECT_AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

    /// 项目许可证
    pub const PROJECT_LICENSE: &str = env!("CARGO_PKG_LICENSE");

    /// 用户友好的显示名称（手动维护，用于 UI 显示）
    pub mod display {
        /// 用户友好的项目名称
        pub const FRIENDLY_NAME: &str = "Vault Client";

        /// 项目详细描述
        pub const DESCRIPTION_LONG: &str = "备份保管库命令行客户端，管理保护策略、开启或停止保护、触发备份与恢复、文件级恢复以及备份作业跟踪";
    }
}

/// 版本信息
pub mod version_info {
    /// CLI 版本（自动从 Cargo.toml 同步）
    pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

    /// 默认的服务端 API 版本
    pub const API_VERSION: &str = vault_core::constants::api::DEFAULT_API_VERSION;
}

/// 获取版本信息字符串
pub fn get_version_string() -> String {
    format!(
        "{} v{} (API {})",
        metadata::display::FRIENDLY_NAME,
        version_info::CLI_VERSION,
        version_info::API_VERSION
    )
}

/// 获取作者和许可证信息
pub fn get_copyright_info() -> String {
    format!(
        "© {} - Licensed under {}",
        metadata::PROJECT_AUTHORS,
        metadata::PROJECT_LICENSE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_contains_versions() {
        let version = get_version_string();
        assert!(version.starts_with("Vault Client v"));
        assert!(version.contains(version_info::CLI_VERSION));
        assert!(version.contains("API 2016-06-01"));
    }
}
