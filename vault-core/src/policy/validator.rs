use super::retention::{RetentionPolicy, RetentionRule, RetentionSelector};
use super::schedule::BackupSchedule;
use super::types::{RetentionType, ScheduleType};
use crate::config::ValidationConfig;
use crate::constants::retention::{LAST_DAY_OF_MONTH, MAX_EXPLICIT_DAY_OF_MONTH};
use crate::error::{Result, VaultError};
use crate::models::ProtectionPolicy;
use regex::Regex;
use std::collections::HashSet;

/// 各层保留数量的闭区间 (最小, 最大)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionLimits {
    pub daily: (u32, u32),
    pub weekly: (u32, u32),
    pub monthly: (u32, u32),
    pub yearly: (u32, u32),
}

impl RetentionLimits {
    pub fn for_type(&self, retention_type: RetentionType) -> (u32, u32) {
        match retention_type {
            RetentionType::Daily => self.daily,
            RetentionType::Weekly => self.weekly,
            RetentionType::Monthly => self.monthly,
            RetentionType::Yearly => self.yearly,
        }
    }
}

/// 策略名称规则
#[derive(Debug, Clone)]
pub struct NameRules {
    pattern: Regex,
    min_length: usize,
    max_length: usize,
}

impl NameRules {
    pub fn new(pattern: &str, min_length: usize, max_length: usize) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| VaultError::InvalidConfig(format!("策略名称正则无效: {e}")))?;
        Ok(Self {
            pattern,
            min_length,
            max_length,
        })
    }
}

/// 保护策略校验器
///
/// 所有规则在构造时注入，校验本身不做任何 I/O。
#[derive(Debug, Clone)]
pub struct PolicyValidator {
    limits: RetentionLimits,
    names: NameRules,
}

impl PolicyValidator {
    pub fn new(limits: RetentionLimits, names: NameRules) -> Self {
        Self { limits, names }
    }

    /// 从配置构建校验器
    pub fn from_config(config: &ValidationConfig) -> Result<Self> {
        Ok(Self::new(config.retention_limits()?, config.name_rules()?))
    }

    pub fn limits(&self) -> &RetentionLimits {
        &self.limits
    }

    /// 校验策略名称
    pub fn validate_policy_name(&self, name: &str) -> Result<()> {
        let length = name.chars().count();
        if length < self.names.min_length || length > self.names.max_length {
            return Err(VaultError::invalid_argument(
                "Name",
                format!(
                    "策略名称长度必须在 {} 到 {} 个字符之间，当前为 {}",
                    self.names.min_length, self.names.max_length, length
                ),
            ));
        }

        if !self.names.pattern.is_match(name) {
            return Err(VaultError::invalid_argument(
                "Name",
                format!(
                    "策略名称 {name} 不合法：必须以字母开头，以字母或数字结尾，中间只能包含字母、数字和连字符"
                ),
            ));
        }

        Ok(())
    }

    /// 校验保留策略列表，提供计划类型时同时检查两者是否匹配
    pub fn validate_retention_policies(
        &self,
        policies: &[RetentionPolicy],
        schedule_type: Option<ScheduleType>,
    ) -> Result<()> {
        if policies.is_empty() {
            return Err(VaultError::invalid_argument(
                "RetentionPolicies",
                "至少需要一个保留策略",
            ));
        }

        let mut seen = HashSet::new();
        for policy in policies {
            let retention_type = policy.retention_type();
            if !seen.insert(retention_type) {
                return Err(VaultError::invalid_argument(
                    "RetentionPolicies",
                    format!("{retention_type} 保留策略重复"),
                ));
            }
            self.validate_retention_policy(policy)?;
        }

        match schedule_type {
            Some(ScheduleType::Daily) if !seen.contains(&RetentionType::Daily) => {
                Err(VaultError::invalid_argument(
                    "RetentionPolicies",
                    "Daily 备份计划必须包含 Daily 保留策略",
                ))
            }
            Some(ScheduleType::Weekly) if !seen.contains(&RetentionType::Weekly) => {
                Err(VaultError::invalid_argument(
                    "RetentionPolicies",
                    "Weekly 备份计划必须包含 Weekly 保留策略",
                ))
            }
            Some(ScheduleType::Weekly) if seen.contains(&RetentionType::Daily) => {
                Err(VaultError::invalid_argument(
                    "RetentionPolicies",
                    "Weekly 备份计划不能包含 Daily 保留策略",
                ))
            }
            _ => Ok(()),
        }
    }

    /// 校验单个保留策略
    pub fn validate_retention_policy(&self, policy: &RetentionPolicy) -> Result<()> {
        let retention_type = policy.retention_type();
        let (min, max) = self.limits.for_type(retention_type);
        if policy.retention < min || policy.retention > max {
            return Err(VaultError::invalid_argument(
                "Retention",
                format!(
                    "{retention_type} 保留数量必须在 {min} 到 {max} 之间，当前为 {}",
                    policy.retention
                ),
            ));
        }

        match &policy.rule {
            RetentionRule::Daily => Ok(()),
            RetentionRule::Weekly { days_of_week } => {
                if days_of_week.is_empty() {
                    return Err(missing_field("DaysOfWeek", retention_type));
                }
                Ok(())
            }
            RetentionRule::Monthly { selector } => validate_selector(selector, retention_type),
            RetentionRule::Yearly {
                months_of_year,
                selector,
            } => {
                if months_of_year.is_empty() {
                    return Err(missing_field("MonthsOfYear", retention_type));
                }
                validate_selector(selector, retention_type)
            }
        }
    }

    /// 校验备份计划本身
    pub fn validate_schedule(&self, schedule: &BackupSchedule) -> Result<()> {
        if schedule.schedule_type == ScheduleType::Weekly && schedule.run_days.is_empty() {
            return Err(VaultError::invalid_argument(
                "ScheduleRunDays",
                "Weekly 备份计划必须指定运行日",
            ));
        }
        if schedule.schedule_type == ScheduleType::Daily && !schedule.run_days.is_empty() {
            return Err(VaultError::invalid_argument(
                "ScheduleRunDays",
                "Daily 备份计划不能指定运行日",
            ));
        }
        Ok(())
    }

    /// 提交前对完整策略做一次校验
    pub fn validate_policy(&self, policy: &ProtectionPolicy) -> Result<()> {
        self.validate_policy_name(&policy.name)?;
        self.validate_schedule(&policy.schedule)?;
        self.validate_retention_policies(
            &policy.retention_policies,
            Some(policy.schedule.schedule_type),
        )
    }
}

fn missing_field(field: &str, retention_type: RetentionType) -> VaultError {
    VaultError::invalid_argument(field, format!("{retention_type} 保留策略必须指定 {field}"))
}

fn validate_selector(selector: &RetentionSelector, retention_type: RetentionType) -> Result<()> {
    match selector {
        RetentionSelector::Daily { days_of_month } => {
            if days_of_month.is_empty() {
                return Err(missing_field("DaysOfMonth", retention_type));
            }
            if let Some(day) = days_of_month
                .iter()
                .find(|day| **day == 0 || (**day > MAX_EXPLICIT_DAY_OF_MONTH && **day != LAST_DAY_OF_MONTH))
            {
                return Err(VaultError::invalid_argument(
                    "DaysOfMonth",
                    format!(
                        "{retention_type} 保留策略的日期 {day} 无效，只能为 1-{MAX_EXPLICIT_DAY_OF_MONTH} 或 {LAST_DAY_OF_MONTH}（当月最后一天）"
                    ),
                ));
            }
            Ok(())
        }
        RetentionSelector::Weekly {
            week_numbers,
            days_of_week,
        } => {
            if days_of_week.is_empty() {
                return Err(missing_field("DaysOfWeek", retention_type));
            }
            if week_numbers.is_empty() {
                return Err(missing_field("WeekNumber", retention_type));
            }
            Ok(())
        }
    }
}
