use super::retention::{RetentionPolicy, RetentionRule, RetentionSelector};
use super::schedule::BackupSchedule;
use super::types::{RetentionFormat, RetentionType};
use super::wire::{
    DailyRetentionFormat, DailyRetentionSchedule, Day, LongTermRetentionPolicy,
    MonthlyRetentionSchedule, ProtectionPolicyProperties, ProtectionPolicyResource,
    RetentionDuration, WeeklyRetentionFormat, WeeklyRetentionSchedule, WireBackupSchedule,
    YearlyRetentionSchedule,
};
use crate::constants::retention::LAST_DAY_OF_MONTH;
use crate::constants::schedule::BACKUP_TYPE_FULL;
use crate::error::{Result, VaultError};
use crate::models::{BackupManagementType, ProtectionPolicy, WorkloadType};
use chrono::{DateTime, Utc};
use tracing::warn;

/// 服务端格式转为领域模型
pub fn to_domain(
    schedule: &WireBackupSchedule,
    retention: &LongTermRetentionPolicy,
) -> Result<(BackupSchedule, Vec<RetentionPolicy>)> {
    Ok((to_domain_schedule(schedule)?, to_domain_retention(retention)?))
}

pub fn to_domain_schedule(schedule: &WireBackupSchedule) -> Result<BackupSchedule> {
    let run_time = schedule
        .schedule_run_times
        .first()
        .copied()
        .ok_or_else(|| VaultError::invalid_response("备份计划缺少 ScheduleRunTimes"))?;
    if schedule.schedule_run_times.len() > 1 {
        warn!(
            "备份计划包含 {} 个运行时间，只使用第一个",
            schedule.schedule_run_times.len()
        );
    }

    Ok(BackupSchedule {
        schedule_type: schedule.schedule_run,
        run_days: schedule.schedule_run_days.clone(),
        run_time,
    })
}

/// 按 Daily/Weekly/Monthly/Yearly 顺序输出存在的层级
pub fn to_domain_retention(retention: &LongTermRetentionPolicy) -> Result<Vec<RetentionPolicy>> {
    let mut policies = Vec::new();

    if let Some(daily) = &retention.daily_schedule {
        policies.push(
            RetentionPolicy::daily(daily.retention_duration.count)
                .with_times(daily.retention_times.clone()),
        );
    }

    if let Some(weekly) = &retention.weekly_schedule {
        policies.push(
            RetentionPolicy::weekly(
                weekly.retention_duration.count,
                weekly.days_of_the_week.clone(),
            )
            .with_times(weekly.retention_times.clone()),
        );
    }

    if let Some(monthly) = &retention.monthly_schedule {
        let selector = selector_to_domain(
            RetentionType::Monthly,
            monthly.retention_schedule_type,
            monthly.retention_schedule_daily.as_ref(),
            monthly.retention_schedule_weekly.as_ref(),
        )?;
        policies.push(
            RetentionPolicy::monthly(monthly.retention_duration.count, selector)
                .with_times(monthly.retention_times.clone()),
        );
    }

    if let Some(yearly) = &retention.yearly_schedule {
        let selector = selector_to_domain(
            RetentionType::Yearly,
            yearly.retention_schedule_type,
            yearly.retention_schedule_daily.as_ref(),
            yearly.retention_schedule_weekly.as_ref(),
        )?;
        policies.push(
            RetentionPolicy::yearly(
                yearly.retention_duration.count,
                yearly.months_of_year.clone(),
                selector,
            )
            .with_times(yearly.retention_times.clone()),
        );
    }

    Ok(policies)
}

fn selector_to_domain(
    retention_type: RetentionType,
    format: RetentionFormat,
    daily: Option<&DailyRetentionFormat>,
    weekly: Option<&WeeklyRetentionFormat>,
) -> Result<RetentionSelector> {
    match format {
        RetentionFormat::Daily => {
            let daily = daily.ok_or_else(|| {
                VaultError::invalid_response(format!(
                    "{retention_type} 保留策略缺少 RetentionScheduleDaily"
                ))
            })?;
            Ok(RetentionSelector::Daily {
                days_of_month: daily.days_of_the_month.iter().map(day_to_domain).collect(),
            })
        }
        RetentionFormat::Weekly => {
            let weekly = weekly.ok_or_else(|| {
                VaultError::invalid_response(format!(
                    "{retention_type} 保留策略缺少 RetentionScheduleWeekly"
                ))
            })?;
            Ok(RetentionSelector::Weekly {
                week_numbers: weekly.weeks_of_the_month.clone(),
                days_of_week: weekly.days_of_the_week.clone(),
            })
        }
    }
}

/// 当月最后一天统一表示为 29
fn day_to_domain(day: &Day) -> u8 {
    if day.is_last {
        LAST_DAY_OF_MONTH
    } else {
        day.date
    }
}

fn day_to_wire(day: u8) -> Day {
    if day == LAST_DAY_OF_MONTH {
        Day {
            date: 0,
            is_last: true,
        }
    } else {
        Day {
            date: day,
            is_last: false,
        }
    }
}

pub fn to_wire_schedule(schedule: &BackupSchedule) -> WireBackupSchedule {
    WireBackupSchedule {
        backup_type: BACKUP_TYPE_FULL.to_string(),
        schedule_run: schedule.schedule_type,
        schedule_run_days: schedule.run_days.clone(),
        schedule_run_times: schedule.run_times(),
    }
}

/// 领域模型转为服务端保留格式，每一层的保留时间都取自备份计划
pub fn to_wire_retention(
    policies: &[RetentionPolicy],
    schedule: &BackupSchedule,
) -> LongTermRetentionPolicy {
    let times = schedule.run_times();
    let mut wire = LongTermRetentionPolicy::default();

    for policy in policies {
        let retention_duration = RetentionDuration {
            count: policy.retention,
            duration_type: policy.retention_type().duration_type(),
        };

        match &policy.rule {
            RetentionRule::Daily => {
                wire.daily_schedule = Some(DailyRetentionSchedule {
                    retention_times: times.clone(),
                    retention_duration,
                });
            }
            RetentionRule::Weekly { days_of_week } => {
                wire.weekly_schedule = Some(WeeklyRetentionSchedule {
                    days_of_the_week: days_of_week.clone(),
                    retention_times: times.clone(),
                    retention_duration,
                });
            }
            RetentionRule::Monthly { selector } => {
                let (daily, weekly) = selector_to_wire(selector);
                wire.monthly_schedule = Some(MonthlyRetentionSchedule {
                    retention_schedule_type: selector.format(),
                    retention_schedule_daily: daily,
                    retention_schedule_weekly: weekly,
                    retention_times: times.clone(),
                    retention_duration,
                });
            }
            RetentionRule::Yearly {
                months_of_year,
                selector,
            } => {
                let (daily, weekly) = selector_to_wire(selector);
                wire.yearly_schedule = Some(YearlyRetentionSchedule {
                    retention_schedule_type: selector.format(),
                    months_of_year: months_of_year.clone(),
                    retention_schedule_daily: daily,
                    retention_schedule_weekly: weekly,
                    retention_times: times.clone(),
                    retention_duration,
                });
            }
        }
    }

    wire
}

fn selector_to_wire(
    selector: &RetentionSelector,
) -> (Option<DailyRetentionFormat>, Option<WeeklyRetentionFormat>) {
    match selector {
        RetentionSelector::Daily { days_of_month } => (
            Some(DailyRetentionFormat {
                days_of_the_month: days_of_month.iter().copied().map(day_to_wire).collect(),
            }),
            None,
        ),
        RetentionSelector::Weekly {
            week_numbers,
            days_of_week,
        } => (
            None,
            Some(WeeklyRetentionFormat {
                days_of_the_week: days_of_week.clone(),
                weeks_of_the_month: week_numbers.clone(),
            }),
        ),
    }
}

/// 保留策略的运行时间与备份计划对齐
pub fn align_retention_times(policies: &mut [RetentionPolicy], times: &[DateTime<Utc>]) {
    for policy in policies {
        policy.retention_times = times.to_vec();
    }
}

/// 服务端策略资源转为领域模型
pub fn policy_from_resource(resource: &ProtectionPolicyResource) -> Result<ProtectionPolicy> {
    let management_type: BackupManagementType =
        resource.properties.backup_management_type.parse()?;
    let (schedule, retention_policies) = to_domain(
        &resource.properties.schedule_policy,
        &resource.properties.retention_policy,
    )?;

    Ok(ProtectionPolicy {
        policy_id: resource.id.clone(),
        name: resource.name.clone(),
        workload_type: WorkloadType::from_management_type(management_type),
        backup_management_type: management_type,
        schedule,
        retention_policies,
    })
}

/// 领域模型转为服务端策略资源
pub fn policy_to_resource(policy: &ProtectionPolicy) -> ProtectionPolicyResource {
    ProtectionPolicyResource {
        id: policy.policy_id.clone(),
        name: policy.name.clone(),
        properties: ProtectionPolicyProperties {
            backup_management_type: policy.backup_management_type.as_str().to_string(),
            schedule_policy: to_wire_schedule(&policy.schedule),
            retention_policy: to_wire_retention(&policy.retention_policies, &policy.schedule),
            protected_items_count: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::types::{DayOfWeek, DurationType, Month, ScheduleType, WeekNumber};
    use chrono::TimeZone;

    fn run_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap()
    }

    fn weekly_wire_schedule() -> WireBackupSchedule {
        WireBackupSchedule {
            backup_type: "Full".to_string(),
            schedule_run: ScheduleType::Weekly,
            schedule_run_days: vec![DayOfWeek::Sunday, DayOfWeek::Wednesday],
            schedule_run_times: vec![run_time()],
        }
    }

    fn duration(count: u32, duration_type: DurationType) -> RetentionDuration {
        RetentionDuration {
            count,
            duration_type,
        }
    }

    fn full_wire_retention() -> LongTermRetentionPolicy {
        LongTermRetentionPolicy {
            daily_schedule: Some(DailyRetentionSchedule {
                retention_times: vec![run_time()],
                retention_duration: duration(30, DurationType::Days),
            }),
            weekly_schedule: Some(WeeklyRetentionSchedule {
                days_of_the_week: vec![DayOfWeek::Sunday],
                retention_times: vec![run_time()],
                retention_duration: duration(12, DurationType::Weeks),
            }),
            monthly_schedule: Some(MonthlyRetentionSchedule {
                retention_schedule_type: RetentionFormat::Daily,
                retention_schedule_daily: Some(DailyRetentionFormat {
                    days_of_the_month: vec![
                        Day {
                            date: 1,
                            is_last: false,
                        },
                        Day {
                            date: 0,
                            is_last: true,
                        },
                    ],
                }),
                retention_schedule_weekly: None,
                retention_times: vec![run_time()],
                retention_duration: duration(24, DurationType::Months),
            }),
            yearly_schedule: Some(YearlyRetentionSchedule {
                retention_schedule_type: RetentionFormat::Weekly,
                months_of_year: vec![Month::January, Month::July],
                retention_schedule_daily: None,
                retention_schedule_weekly: Some(WeeklyRetentionFormat {
                    days_of_the_week: vec![DayOfWeek::Sunday],
                    weeks_of_the_month: vec![WeekNumber::First, WeekNumber::Last],
                }),
                retention_times: vec![run_time()],
                retention_duration: duration(10, DurationType::Years),
            }),
        }
    }

    #[test]
    fn test_round_trip_all_tiers() {
        let schedule_wire = weekly_wire_schedule();
        let retention_wire = full_wire_retention();

        let (schedule, policies) = to_domain(&schedule_wire, &retention_wire).unwrap();
        assert_eq!(policies.len(), 4);

        assert_eq!(to_wire_schedule(&schedule), schedule_wire);
        assert_eq!(to_wire_retention(&policies, &schedule), retention_wire);
    }

    #[test]
    fn test_last_day_marker_becomes_29() {
        let (_, policies) = to_domain(&weekly_wire_schedule(), &full_wire_retention()).unwrap();
        let monthly = policies
            .iter()
            .find(|p| p.retention_type() == RetentionType::Monthly)
            .unwrap();

        assert_eq!(
            monthly.rule,
            RetentionRule::Monthly {
                selector: RetentionSelector::Daily {
                    days_of_month: vec![1, 29]
                }
            }
        );
    }

    #[test]
    fn test_monthly_weekly_and_yearly_daily_shapes() {
        let schedule = BackupSchedule {
            schedule_type: ScheduleType::Daily,
            run_days: vec![],
            run_time: run_time(),
        };
        let policies = vec![
            RetentionPolicy::daily(10).with_times(schedule.run_times()),
            RetentionPolicy::monthly(
                6,
                RetentionSelector::Weekly {
                    week_numbers: vec![WeekNumber::Second],
                    days_of_week: vec![DayOfWeek::Tuesday],
                },
            )
            .with_times(schedule.run_times()),
            RetentionPolicy::yearly(
                3,
                vec![Month::December],
                RetentionSelector::Daily {
                    days_of_month: vec![15, 29],
                },
            )
            .with_times(schedule.run_times()),
        ];

        let wire = to_wire_retention(&policies, &schedule);
        assert!(wire.weekly_schedule.is_none());
        let yearly = wire.yearly_schedule.as_ref().unwrap();
        assert_eq!(yearly.retention_duration.duration_type, DurationType::Years);
        assert_eq!(
            yearly
                .retention_schedule_daily
                .as_ref()
                .unwrap()
                .days_of_the_month[1],
            Day {
                date: 0,
                is_last: true
            }
        );

        let back = to_domain_retention(&wire).unwrap();
        assert_eq!(back, policies);
    }

    #[test]
    fn test_run_time_propagates_to_every_tier() {
        let schedule = BackupSchedule {
            schedule_type: ScheduleType::Weekly,
            run_days: vec![DayOfWeek::Monday],
            run_time: run_time(),
        };
        let policies = vec![
            RetentionPolicy::weekly(4, vec![DayOfWeek::Monday]),
            RetentionPolicy::monthly(
                2,
                RetentionSelector::Daily {
                    days_of_month: vec![5],
                },
            ),
        ];

        let wire = to_wire_retention(&policies, &schedule);
        assert_eq!(
            wire.weekly_schedule.unwrap().retention_times,
            vec![run_time()]
        );
        assert_eq!(
            wire.monthly_schedule.unwrap().retention_times,
            vec![run_time()]
        );
    }

    #[test]
    fn test_missing_sub_format_is_invalid_response() {
        let mut retention = full_wire_retention();
        if let Some(monthly) = retention.monthly_schedule.as_mut() {
            monthly.retention_schedule_daily = None;
        }
        let err = to_domain_retention(&retention).unwrap_err();
        assert!(matches!(err, VaultError::InvalidResponse(_)));
    }

    #[test]
    fn test_empty_run_times_rejected() {
        let mut schedule = weekly_wire_schedule();
        schedule.schedule_run_times.clear();
        assert!(matches!(
            to_domain_schedule(&schedule),
            Err(VaultError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_policy_resource_round_trip() {
        let json = serde_json::json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.RecoveryServices/vaults/v/backupPolicies/DefaultPolicy",
            "name": "DefaultPolicy",
            "properties": {
                "backupManagementType": "AzureIaasVM",
                "schedulePolicy": {
                    "BackupType": "Full",
                    "ScheduleRun": "Daily",
                    "ScheduleRunDays": [],
                    "ScheduleRunTimes": ["2024-01-01T10:30:00Z"]
                },
                "retentionPolicy": {
                    "DailySchedule": {
                        "RetentionTimes": ["2024-01-01T10:30:00Z"],
                        "RetentionDuration": { "Count": 30, "DurationType": "Days" }
                    }
                }
            }
        });
        let resource: ProtectionPolicyResource = serde_json::from_value(json).unwrap();
        let policy = policy_from_resource(&resource).unwrap();

        assert_eq!(policy.workload_type, WorkloadType::AzureVm);
        assert_eq!(policy.schedule.schedule_type, ScheduleType::Daily);
        assert_eq!(policy.retention_policies, vec![
            RetentionPolicy::daily(30).with_times(vec![run_time()])
        ]);
        assert_eq!(policy_to_resource(&policy), resource);
    }
}
