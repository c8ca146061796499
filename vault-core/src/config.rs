use crate::constants::{api, config, policy_name, retention, tracking};
use crate::error::{Result, VaultError};
use crate::models::VaultContext;
use crate::policy::validator::{NameRules, RetentionLimits};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 应用配置结构
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// 备份服务连接配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub api_version: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub vault_name: String,
    #[serde(default)]
    pub location: String,
    /// 访问令牌，环境变量 VAULT_ACCESS_TOKEN 优先
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// 异步操作跟踪配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrackingConfig {
    pub poll_interval_secs: u64,
    /// 0 表示不设整体超时
    pub timeout_secs: u64,
}

/// 策略校验配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ValidationConfig {
    pub name_pattern: String,
    pub name_min_length: usize,
    pub name_max_length: usize,
    pub daily: [u32; 2],
    pub weekly: [u32; 2],
    pub monthly: [u32; 2],
    pub yearly: [u32; 2],
}

impl ServiceConfig {
    /// 保管库标识，随策略与请求一起传递
    pub fn vault_context(&self) -> VaultContext {
        VaultContext {
            subscription_id: self.subscription_id.clone(),
            resource_group: self.resource_group.clone(),
            vault_name: self.vault_name.clone(),
            location: self.location.clone(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: tracking::DEFAULT_POLL_INTERVAL_SECS,
            timeout_secs: tracking::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TrackingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_pattern: policy_name::PATTERN.to_string(),
            name_min_length: policy_name::MIN_LENGTH,
            name_max_length: policy_name::MAX_LENGTH,
            daily: [retention::DAILY_MIN, retention::DAILY_MAX],
            weekly: [retention::WEEKLY_MIN, retention::WEEKLY_MAX],
            monthly: [retention::MONTHLY_MIN, retention::MONTHLY_MAX],
            yearly: [retention::YEARLY_MIN, retention::YEARLY_MAX],
        }
    }
}

impl ValidationConfig {
    /// 转换为校验器使用的保留数量上下限
    pub fn retention_limits(&self) -> Result<RetentionLimits> {
        let check = |name: &str, [min, max]: [u32; 2]| -> Result<(u32, u32)> {
            if min == 0 || min > max {
                return Err(VaultError::InvalidConfig(format!(
                    "validation.{name} 范围无效: [{min}, {max}]"
                )));
            }
            Ok((min, max))
        };

        Ok(RetentionLimits {
            daily: check("daily", self.daily)?,
            weekly: check("weekly", self.weekly)?,
            monthly: check("monthly", self.monthly)?,
            yearly: check("yearly", self.yearly)?,
        })
    }

    /// 编译策略名称规则
    pub fn name_rules(&self) -> Result<NameRules> {
        if self.name_min_length > self.name_max_length {
            return Err(VaultError::InvalidConfig(format!(
                "策略名称长度范围无效: [{}, {}]",
                self.name_min_length, self.name_max_length
            )));
        }
        NameRules::new(&self.name_pattern, self.name_min_length, self.name_max_length)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                base_url: api::DEFAULT_BASE_URL.to_string(),
                api_version: api::DEFAULT_API_VERSION.to_string(),
                subscription_id: String::new(),
                resource_group: String::new(),
                vault_name: String::new(),
                location: String::new(),
                access_token: None,
            },
            tracking: TrackingConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl AppConfig {
    /// 智能查找并加载配置文件
    /// 按优先级查找：config.toml -> vault-client.toml -> .vault-client.toml
    pub fn find_and_load_config() -> Result<Self> {
        for config_file in &config::CONFIG_FILE_NAMES {
            if Path::new(config_file).exists() {
                tracing::info!("找到配置文件: {}", config_file);
                return Self::load_from_file(config_file);
            }
        }

        // 如果没找到配置文件，创建默认配置
        tracing::warn!(
            "未找到配置文件，创建默认配置: {}",
            config::DEFAULT_CONFIG_FILE
        );
        let default_config = Self::default();
        default_config.save_to_file(config::DEFAULT_CONFIG_FILE)?;
        Ok(default_config)
    }

    /// 从指定文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_with_comments();
        fs::write(&path, content)?;
        Ok(())
    }

    /// 生成带注释的TOML配置
    fn to_toml_with_comments(&self) -> String {
        const TEMPLATE: &str = include_str!("../templates/config.toml.template");

        let text = |value: &str| toml::Value::String(value.to_string()).to_string();
        let token_line = match &self.service.access_token {
            Some(token) => format!("access_token = {}", text(token)),
            None => "# access_token = \"\"".to_string(),
        };
        let pair = |[min, max]: [u32; 2]| format!("[{min}, {max}]");

        TEMPLATE
            .replace("{base_url}", &text(&self.service.base_url))
            .replace("{api_version}", &text(&self.service.api_version))
            .replace("{subscription_id}", &text(&self.service.subscription_id))
            .replace("{resource_group}", &text(&self.service.resource_group))
            .replace("{vault_name}", &text(&self.service.vault_name))
            .replace("{location}", &text(&self.service.location))
            .replace("{access_token_line}", &token_line)
            .replace(
                "{poll_interval_secs}",
                &self.tracking.poll_interval_secs.to_string(),
            )
            .replace("{timeout_secs}", &self.tracking.timeout_secs.to_string())
            .replace("{name_pattern}", &text(&self.validation.name_pattern))
            .replace(
                "{name_min_length}",
                &self.validation.name_min_length.to_string(),
            )
            .replace(
                "{name_max_length}",
                &self.validation.name_max_length.to_string(),
            )
            .replace("{daily_range}", &pair(self.validation.daily))
            .replace("{weekly_range}", &pair(self.validation.weekly))
            .replace("{monthly_range}", &pair(self.validation.monthly))
            .replace("{yearly_range}", &pair(self.validation.yearly))
    }

    /// 获取访问令牌，环境变量优先
    pub fn access_token(&self) -> Option<String> {
        std::env::var(api::ACCESS_TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty())
            .or_else(|| self.service.access_token.clone())
    }

    /// 检查保管库标识是否完整
    pub fn ensure_vault_identity(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("service.subscription_id", &self.service.subscription_id),
            ("service.resource_group", &self.service.resource_group),
            ("service.vault_name", &self.service.vault_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(VaultError::InvalidConfig(format!(
                "缺少配置项: {}",
                missing.join(", ")
            )))
        }
    }
}
