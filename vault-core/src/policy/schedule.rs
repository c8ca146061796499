use super::types::{DayOfWeek, ScheduleType};
use crate::constants::schedule::{DEFAULT_RUN_HOUR, DEFAULT_RUN_MINUTE, SLOT_MINUTES};
use crate::error::{Result, VaultError};
use chrono::{DateTime, TimeDelta, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 备份计划
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BackupSchedule {
    #[serde(rename = "ScheduleRunFrequency")]
    pub schedule_type: ScheduleType,
    #[serde(rename = "ScheduleRunDays", default)]
    pub run_days: Vec<DayOfWeek>,
    /// UTC 运行时间，分钟已对齐到 30 分钟
    #[serde(rename = "ScheduleRunTime")]
    pub run_time: DateTime<Utc>,
}

impl BackupSchedule {
    pub fn run_times(&self) -> Vec<DateTime<Utc>> {
        vec![self.run_time]
    }
}

/// 构建备份计划
///
/// 声明为 Daily 但提供了运行日时，实际类型升级为 Weekly。
pub fn build_schedule<Tz: TimeZone>(
    schedule_type: ScheduleType,
    start_time: &DateTime<Tz>,
    run_days: &[String],
) -> Result<BackupSchedule> {
    let effective_type = if schedule_type == ScheduleType::Daily && !run_days.is_empty() {
        warn!(
            "Daily 备份计划指定了运行日 {:?}，已按 Weekly 计划处理",
            run_days
        );
        ScheduleType::Weekly
    } else {
        schedule_type
    };

    let run_days = match effective_type {
        ScheduleType::Weekly => {
            if run_days.is_empty() {
                return Err(VaultError::invalid_argument(
                    "ScheduleRunDays",
                    "Weekly 备份计划必须指定运行日",
                ));
            }
            parse_run_days(run_days)?
        }
        ScheduleType::Daily => Vec::new(),
    };

    Ok(BackupSchedule {
        schedule_type: effective_type,
        run_days,
        run_time: snap_to_slot(start_time),
    })
}

/// 解析星期名称，忽略大小写，按首次出现顺序去重
pub fn parse_run_days(names: &[String]) -> Result<Vec<DayOfWeek>> {
    let mut days = Vec::with_capacity(names.len());
    for name in names {
        let day: DayOfWeek = name.parse()?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    Ok(days)
}

/// 转为 UTC 并向下对齐到 30 分钟，秒和纳秒清零
pub fn snap_to_slot<Tz: TimeZone>(time: &DateTime<Tz>) -> DateTime<Utc> {
    let utc = time.with_timezone(&Utc);
    let extra_minutes = utc.minute() % SLOT_MINUTES;
    utc - TimeDelta::minutes(i64::from(extra_minutes))
        - TimeDelta::seconds(i64::from(utc.second()))
        - TimeDelta::nanoseconds(i64::from(utc.nanosecond()))
}

/// 根据命令的参数集确定计划类型
///
/// daily 参数集下不允许传入运行日；weekly 参数集下必须传入运行日。
pub fn resolve_schedule_type(
    run_days: &[String],
    parameter_set: &str,
    daily_set: &str,
    weekly_set: &str,
) -> Result<ScheduleType> {
    if !run_days.is_empty() {
        if parameter_set == daily_set {
            return Err(VaultError::invalid_argument(
                "ScheduleRunDays",
                "Daily 备份计划不能指定运行日",
            ));
        }
        return Ok(ScheduleType::Weekly);
    }

    if parameter_set == weekly_set {
        return Err(VaultError::invalid_argument(
            "ScheduleRunDays",
            "Weekly 备份计划必须指定运行日",
        ));
    }
    Ok(ScheduleType::Daily)
}

/// 默认备份计划：每天 UTC 22:30
pub fn default_schedule(now: DateTime<Utc>) -> BackupSchedule {
    let at_midnight = now
        - TimeDelta::hours(i64::from(now.hour()))
        - TimeDelta::minutes(i64::from(now.minute()));
    let run_time = at_midnight
        + TimeDelta::hours(i64::from(DEFAULT_RUN_HOUR))
        + TimeDelta::minutes(i64::from(DEFAULT_RUN_MINUTE));

    BackupSchedule {
        schedule_type: ScheduleType::Daily,
        run_days: Vec::new(),
        run_time: snap_to_slot(&run_time),
    }
}
