//! 服务端策略格式
//!
//! 计划与保留部分使用 PascalCase，资源外层使用 camelCase。

use super::types::{DayOfWeek, DurationType, Month, RetentionFormat, ScheduleType, WeekNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireBackupSchedule {
    pub backup_type: String,
    pub schedule_run: ScheduleType,
    #[serde(default)]
    pub schedule_run_days: Vec<DayOfWeek>,
    pub schedule_run_times: Vec<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LongTermRetentionPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_schedule: Option<DailyRetentionSchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_schedule: Option<WeeklyRetentionSchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_schedule: Option<MonthlyRetentionSchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yearly_schedule: Option<YearlyRetentionSchedule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetentionDuration {
    pub count: u32,
    pub duration_type: DurationType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DailyRetentionSchedule {
    pub retention_times: Vec<DateTime<Utc>>,
    pub retention_duration: RetentionDuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WeeklyRetentionSchedule {
    pub days_of_the_week: Vec<DayOfWeek>,
    pub retention_times: Vec<DateTime<Utc>>,
    pub retention_duration: RetentionDuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonthlyRetentionSchedule {
    pub retention_schedule_type: RetentionFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_schedule_daily: Option<DailyRetentionFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_schedule_weekly: Option<WeeklyRetentionFormat>,
    pub retention_times: Vec<DateTime<Utc>>,
    pub retention_duration: RetentionDuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct YearlyRetentionSchedule {
    pub retention_schedule_type: RetentionFormat,
    pub months_of_year: Vec<Month>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_schedule_daily: Option<DailyRetentionFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_schedule_weekly: Option<WeeklyRetentionFormat>,
    pub retention_times: Vec<DateTime<Utc>>,
    pub retention_duration: RetentionDuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DailyRetentionFormat {
    pub days_of_the_month: Vec<Day>,
}

/// 月内日期；`is_last` 为真时表示当月最后一天，`date` 忽略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Day {
    pub date: u8,
    pub is_last: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WeeklyRetentionFormat {
    pub days_of_the_week: Vec<DayOfWeek>,
    pub weeks_of_the_month: Vec<WeekNumber>,
}

/// 策略资源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionPolicyResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub properties: ProtectionPolicyProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionPolicyProperties {
    pub backup_management_type: String,
    pub schedule_policy: WireBackupSchedule,
    pub retention_policy: LongTermRetentionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected_items_count: Option<u32>,
}
