use crate::app::CliApp;
use crate::cli::{PolicyCommand, ScheduleArgs};
use crate::utils::print_json;
use chrono::Utc;
use std::path::Path;
use tracing::info;
use vault_core::models::{BackupManagementType, ProtectionPolicy, WorkloadType};
use vault_core::policy::{
    BackupSchedule, RetentionPolicy, RetentionRule, RetentionType, ScheduleType, build_schedule,
    resolve_schedule_type,
};
use vault_core::protection::{PolicyChanges, PolicyQuery, default_management_type};

const DAILY_SET: &str = "daily";
const WEEKLY_SET: &str = "weekly";

/// 处理保护策略相关命令
pub async fn handle_policy_command(app: &CliApp, command: PolicyCommand) -> anyhow::Result<()> {
    match command {
        PolicyCommand::List {
            name,
            workload,
            management_type,
        } => {
            let query = match (name, workload, management_type) {
                (Some(name), _, _) => PolicyQuery::Name(name),
                (None, Some(workload), Some(management_type)) => {
                    PolicyQuery::WorkloadAndManagement(workload, management_type)
                }
                (None, Some(workload), None) => PolicyQuery::Workload(workload),
                (None, None, _) => PolicyQuery::All,
            };
            let policies = app.manager.list_policies(query).await?;
            info!("📋 共 {} 个保护策略", policies.len());
            print_json(&policies)
        }
        PolicyCommand::Get {
            name,
            workload,
            management_type,
        } => {
            let policy = app.manager.get_policy(workload, management_type, &name).await?;
            print_json(&policy)
        }
        PolicyCommand::New {
            name,
            workload,
            management_type,
            schedule,
        } => run_policy_new(app, name, workload, management_type, &schedule).await,
        PolicyCommand::Set { name, schedule } => run_policy_set(app, &name, &schedule).await,
        PolicyCommand::Remove { name } => {
            info!("🗑️  删除保护策略: {}", name);
            let job = app.manager.remove_policy(&name).await?;
            info!("✅ 保护策略 {} 已删除", name);
            print_json(&job)
        }
        PolicyCommand::Defaults {
            workload,
            management_type,
        } => {
            let schedule = app.manager.default_schedule(workload, management_type)?;
            let retention = app.manager.default_retention(workload, management_type)?;
            print_json(&serde_json::json!({
                "SchedulePolicy": schedule,
                "RetentionPolicies": retention,
            }))
        }
    }
}

async fn run_policy_new(
    app: &CliApp,
    name: String,
    workload: WorkloadType,
    management_type: Option<BackupManagementType>,
    args: &ScheduleArgs,
) -> anyhow::Result<()> {
    let backup_management_type = match management_type {
        Some(management_type) => management_type,
        None => default_management_type(workload)?,
    };

    let schedule = match schedule_from_args(args)? {
        Some(schedule) => schedule,
        None => app.manager.default_schedule(workload, management_type)?,
    };
    let retention_policies = match &args.retention_file {
        Some(path) => load_retention_file(path).await?,
        None => fit_retention_to_schedule(
            app.manager.default_retention(workload, management_type)?,
            &schedule,
        ),
    };

    info!(
        "🆕 创建保护策略: {} ({} 计划)",
        name, schedule.schedule_type
    );
    let policy = app
        .manager
        .create_policy(ProtectionPolicy {
            policy_id: None,
            name,
            workload_type: workload,
            backup_management_type,
            schedule,
            retention_policies,
        })
        .await?;
    info!("✅ 保护策略 {} 创建完成", policy.name);
    print_json(&policy)
}

async fn run_policy_set(app: &CliApp, name: &str, args: &ScheduleArgs) -> anyhow::Result<()> {
    if !args.has_schedule() && args.retention_file.is_none() {
        anyhow::bail!("请至少指定备份计划参数或 --retention-file");
    }

    let existing = app
        .manager
        .list_policies(PolicyQuery::Name(name.to_string()))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("未找到保护策略: {name}"))?;

    let schedule = merge_schedule_args(args, &existing.schedule)?;
    let retention_policies = match (&args.retention_file, &schedule) {
        (Some(path), _) => Some(load_retention_file(path).await?),
        (None, Some(schedule)) if schedule.schedule_type != existing.schedule.schedule_type => Some(
            retention_for_new_recurrence(existing.retention_policies.clone(), schedule)?,
        ),
        (None, _) => None,
    };
    let changes = PolicyChanges {
        schedule,
        retention_policies,
    };

    info!("✏️  修改保护策略: {}", name);
    let policy = app.manager.modify_policy(name, changes).await?;
    info!("✅ 保护策略 {} 修改完成", policy.name);
    print_json(&policy)
}

/// 由命令行参数构建备份计划，未提供任何计划参数时返回 `None`
pub fn schedule_from_args(args: &ScheduleArgs) -> anyhow::Result<Option<BackupSchedule>> {
    if !args.has_schedule() {
        return Ok(None);
    }

    let parameter_set = match args.schedule.as_deref() {
        Some(set) => set,
        None if args.run_days.is_empty() => DAILY_SET,
        None => WEEKLY_SET,
    };
    let schedule_type = resolve_schedule_type(&args.run_days, parameter_set, DAILY_SET, WEEKLY_SET)?;
    let start_time = args.run_time.unwrap_or_else(|| Utc::now().fixed_offset());
    Ok(Some(build_schedule(schedule_type, &start_time, &args.run_days)?))
}

/// 修改策略时由命令行参数构建新计划，未给出的部分沿用现有计划
///
/// 只给 `--run-time` 时保持原有的计划类型与运行日；显式 `--schedule daily` 会清空运行日。
pub fn merge_schedule_args(
    args: &ScheduleArgs,
    existing: &BackupSchedule,
) -> anyhow::Result<Option<BackupSchedule>> {
    if !args.has_schedule() {
        return Ok(None);
    }

    let run_days: Vec<String> = match args.schedule.as_deref() {
        _ if !args.run_days.is_empty() => args.run_days.clone(),
        Some(set) if set.eq_ignore_ascii_case(DAILY_SET) => Vec::new(),
        _ => existing
            .run_days
            .iter()
            .map(|day| day.as_str().to_string())
            .collect(),
    };
    let parameter_set = match args.schedule.as_deref() {
        Some(set) => set,
        None if run_days.is_empty() => DAILY_SET,
        None => WEEKLY_SET,
    };
    let schedule_type = resolve_schedule_type(&run_days, parameter_set, DAILY_SET, WEEKLY_SET)?;
    let start_time = args
        .run_time
        .unwrap_or_else(|| existing.run_time.fixed_offset());
    Ok(Some(build_schedule(schedule_type, &start_time, &run_days)?))
}

/// 计划类型改变且未提供保留策略文件时，由现有保留策略推导
///
/// Daily 改为 Weekly 时去掉 Daily 层级；其余情况无法推导，需要 `--retention-file`。
pub fn retention_for_new_recurrence(
    policies: Vec<RetentionPolicy>,
    schedule: &BackupSchedule,
) -> anyhow::Result<Vec<RetentionPolicy>> {
    let has_weekly = policies
        .iter()
        .any(|policy| policy.retention_type() == RetentionType::Weekly);
    if schedule.schedule_type == ScheduleType::Weekly && has_weekly {
        return Ok(fit_retention_to_schedule(policies, schedule));
    }
    anyhow::bail!(
        "计划类型改为 {}，现有保留策略无法沿用，请通过 --retention-file 提供新的保留策略",
        schedule.schedule_type
    )
}

/// 默认保留策略按 Daily 计划给出，Weekly 计划去掉 Daily 层级并使用计划的运行日
pub fn fit_retention_to_schedule(
    mut policies: Vec<RetentionPolicy>,
    schedule: &BackupSchedule,
) -> Vec<RetentionPolicy> {
    if schedule.schedule_type != ScheduleType::Weekly {
        return policies;
    }

    policies.retain(|policy| policy.retention_type() != RetentionType::Daily);
    for policy in &mut policies {
        if let RetentionRule::Weekly { days_of_week } = &mut policy.rule {
            *days_of_week = schedule.run_days.clone();
        }
    }
    policies
}

async fn load_retention_file(path: &Path) -> anyhow::Result<Vec<RetentionPolicy>> {
    let content = tokio::fs::read_to_string(path).await?;
    let policies: Vec<RetentionPolicy> = serde_json::from_str(&content)?;
    Ok(policies)
}
