use crate::config::ServiceConfig;
use crate::constants::api::{self, endpoints};
use crate::error::Result;
use crate::models::{ItemRef, VaultContext};
use std::fmt;
use url::Url;

/// 备份服务端点配置
///
/// 保管库根路径在构造时解析一次，各端点只替换剩余占位符。
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    base_url: String,
    api_version: String,
    vault: VaultContext,
    vault_root: String,
}

impl ApiEndpoints {
    pub fn from_config(service: &ServiceConfig) -> Self {
        let vault = service.vault_context();
        let vault_root = endpoints::VAULT_ROOT
            .replace("{subscription}", &vault.subscription_id)
            .replace("{resource_group}", &vault.resource_group)
            .replace("{vault}", &vault.vault_name);

        Self {
            base_url: service.base_url.trim_end_matches('/').to_string(),
            api_version: service.api_version.clone(),
            vault,
            vault_root,
        }
    }

    /// 当前保管库标识
    pub fn vault(&self) -> &VaultContext {
        &self.vault
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn build(&self, path: &str, api_version: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    /// 保管库下的端点完整URL
    pub fn vault_url(&self, endpoint: &str) -> Result<Url> {
        self.build(&format!("{}{}", self.vault_root, endpoint), &self.api_version)
    }

    fn item_endpoint(template: &str, item: &ItemRef) -> String {
        template
            .replace("{fabric}", api::DEFAULT_FABRIC)
            .replace("{container}", &item.container_name)
            .replace("{item}", &item.item_name)
    }

    fn recovery_point_endpoint(template: &str, item: &ItemRef, recovery_point: &str) -> String {
        Self::item_endpoint(template, item).replace("{recovery_point}", recovery_point)
    }

    pub fn policies_url(&self) -> Result<Url> {
        self.vault_url(endpoints::POLICIES)
    }

    pub fn policy_url(&self, name: &str) -> Result<Url> {
        self.vault_url(&endpoints::POLICY.replace("{policy}", name))
    }

    pub fn containers_url(&self) -> Result<Url> {
        self.vault_url(endpoints::CONTAINERS)
    }

    pub fn protected_item_url(&self, item: &ItemRef) -> Result<Url> {
        self.vault_url(&Self::item_endpoint(endpoints::PROTECTED_ITEM, item))
    }

    pub fn backup_url(&self, item: &ItemRef) -> Result<Url> {
        self.vault_url(&Self::item_endpoint(endpoints::BACKUP, item))
    }

    pub fn recovery_points_url(&self, item: &ItemRef) -> Result<Url> {
        self.vault_url(&Self::item_endpoint(endpoints::RECOVERY_POINTS, item))
    }

    pub fn recovery_point_url(&self, item: &ItemRef, recovery_point: &str) -> Result<Url> {
        self.vault_url(&Self::recovery_point_endpoint(
            endpoints::RECOVERY_POINT,
            item,
            recovery_point,
        ))
    }

    pub fn restore_url(&self, item: &ItemRef, recovery_point: &str) -> Result<Url> {
        self.vault_url(&Self::recovery_point_endpoint(
            endpoints::RESTORE,
            item,
            recovery_point,
        ))
    }

    pub fn provision_ilr_url(&self, item: &ItemRef, recovery_point: &str) -> Result<Url> {
        self.vault_url(&Self::recovery_point_endpoint(
            endpoints::PROVISION_ILR,
            item,
            recovery_point,
        ))
    }

    pub fn revoke_ilr_url(&self, item: &ItemRef, recovery_point: &str) -> Result<Url> {
        self.vault_url(&Self::recovery_point_endpoint(
            endpoints::REVOKE_ILR,
            item,
            recovery_point,
        ))
    }

    pub fn job_url(&self, job_id: &str) -> Result<Url> {
        self.vault_url(&endpoints::JOB.replace("{job}", job_id))
    }

    pub fn cancel_job_url(&self, job_id: &str) -> Result<Url> {
        self.vault_url(&endpoints::CANCEL_JOB.replace("{job}", job_id))
    }

    pub fn classic_storage_accounts_url(&self) -> Result<Url> {
        self.build(
            &endpoints::CLASSIC_STORAGE_ACCOUNTS.replace("{subscription}", &self.vault.subscription_id),
            api::CLASSIC_STORAGE_API_VERSION,
        )
    }

    pub fn storage_accounts_url(&self) -> Result<Url> {
        self.build(
            &endpoints::STORAGE_ACCOUNTS.replace("{subscription}", &self.vault.subscription_id),
            api::STORAGE_API_VERSION,
        )
    }

    /// 获取所有端点信息，用于CLI帮助显示
    pub fn get_endpoints_info(&self) -> Vec<(&str, String)> {
        let vault = |endpoint: &str| format!("{}{}{}", self.base_url, self.vault_root, endpoint);
        vec![
            ("服务器地址", self.base_url.clone()),
            ("API 版本", self.api_version.clone()),
            ("保管库", vault("")),
            ("保管库区域", self.vault.location.clone()),
            ("保护策略", vault(endpoints::POLICIES)),
            ("保护容器", vault(endpoints::CONTAINERS)),
            ("备份作业", vault(&endpoints::JOB.replace("{job}", "<job>"))),
        ]
    }
}

impl fmt::Display for ApiEndpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "当前API配置:")?;
        for (name, url) in self.get_endpoints_info() {
            writeln!(f, "  {name}: {url}")?;
        }
        Ok(())
    }
}
