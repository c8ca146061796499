use super::ProviderKind;
use super::params::{ParamKey, ProviderData};
use crate::client::{BackupServiceClient, Submission};
use crate::constants::schedule::{
    DEFAULT_DAILY_RETENTION, DEFAULT_MONTHLY_RETENTION, DEFAULT_WEEKLY_RETENTION,
    DEFAULT_YEARLY_RETENTION,
};
use crate::error::{Result, VaultError};
use crate::models::{
    BackupManagementType, ContainerQuery, OperationHandle, ProtectedItem, ProtectionContainer,
    ProtectionPolicy, RecoveryPoint,
};
use crate::policy::schedule::default_schedule;
use chrono::Utc;
use crate::policy::wire::ProtectionPolicyResource;
use crate::policy::{
    BackupSchedule, DayOfWeek, Month, RetentionPolicy, RetentionSelector, WeekNumber,
    policy_from_resource, policy_to_resource,
};
use tracing::{debug, info};

/// 策略的管理类型必须与 Provider 一致
fn ensure_policy_matches(
    policy: &ProtectionPolicy,
    management_types: &[BackupManagementType],
) -> Result<()> {
    if management_types.contains(&policy.backup_management_type) {
        Ok(())
    } else {
        Err(VaultError::invalid_argument(
            "Policy",
            format!(
                "策略 {} 的管理类型 {} 与当前操作不匹配",
                policy.name, policy.backup_management_type
            ),
        ))
    }
}

pub(super) async fn get_protected_item(
    data: &ProviderData,
    client: &dyn BackupServiceClient,
) -> Result<ProtectedItem> {
    let item_ref = data.item_ref()?;
    client.get_protected_item(&item_ref).await
}

pub(super) async fn disable_protection(
    data: &ProviderData,
    client: &dyn BackupServiceClient,
) -> Result<OperationHandle> {
    let item = data.item()?;
    info!("停止保护: {}", item.friendly_name);
    client.remove_protection(&item.item_ref()).await
}

pub(super) async fn list_recovery_points(
    data: &ProviderData,
    client: &dyn BackupServiceClient,
) -> Result<Vec<RecoveryPoint>> {
    let item_ref = data.item_ref()?;
    let filter = data.filter();
    if let (Some(start), Some(end)) = (filter.start, filter.end) {
        if start > end {
            return Err(VaultError::invalid_argument(
                "StartDate",
                format!("开始时间 {start} 晚于结束时间 {end}"),
            ));
        }
    }
    client.list_recovery_points(&item_ref, &filter).await
}

pub(super) async fn get_recovery_point(
    data: &ProviderData,
    client: &dyn BackupServiceClient,
) -> Result<RecoveryPoint> {
    let item_ref = data.item_ref()?;
    let recovery_point = data.recovery_point_id()?;
    client.get_recovery_point(&item_ref, recovery_point).await
}

/// 列出容器；资源组条件在客户端按资源 ID 过滤
pub(super) async fn list_containers(
    data: &ProviderData,
    client: &dyn BackupServiceClient,
) -> Result<Vec<ProtectionContainer>> {
    let query: &ContainerQuery = data.container_query()?;
    let containers = client.list_containers(query).await?;
    debug!("服务端返回 {} 个容器", containers.len());

    let filtered = match &query.resource_group {
        Some(resource_group) => containers
            .into_iter()
            .filter(|container| {
                container
                    .resource_group()
                    .is_some_and(|rg| rg.eq_ignore_ascii_case(resource_group))
            })
            .collect(),
        None => containers,
    };
    Ok(filtered)
}

pub(super) async fn create_policy(
    data: &ProviderData,
    client: &dyn BackupServiceClient,
    management_types: &[BackupManagementType],
) -> Result<Submission<ProtectionPolicyResource>> {
    let policy = data.policy()?;
    ensure_policy_matches(policy, management_types)?;
    info!("创建保护策略: {}", policy.name);
    client.create_or_update_policy(&policy_to_resource(policy)).await
}

pub(super) async fn modify_policy(
    data: &ProviderData,
    client: &dyn BackupServiceClient,
    management_types: &[BackupManagementType],
) -> Result<Submission<ProtectionPolicyResource>> {
    let policy = data.policy()?;
    ensure_policy_matches(policy, management_types)?;
    if policy.policy_id.is_none() {
        return Err(VaultError::invalid_argument(
            "Policy",
            format!("策略 {} 尚未创建，无法修改", policy.name),
        ));
    }
    info!("修改保护策略: {}", policy.name);
    client.create_or_update_policy(&policy_to_resource(policy)).await
}

pub(super) async fn get_policy(
    data: &ProviderData,
    client: &dyn BackupServiceClient,
) -> Result<ProtectionPolicy> {
    let name = data.text(ParamKey::PolicyName)?;
    let resource = client.get_policy(name).await?;
    policy_from_resource(&resource)
}

pub(super) async fn delete_policy(
    data: &ProviderData,
    client: &dyn BackupServiceClient,
) -> Result<Submission<()>> {
    let name = match data.policy_opt() {
        Some(policy) => policy.name.as_str(),
        None => data.text(ParamKey::PolicyName)?,
    };
    info!("删除保护策略: {}", name);
    client.delete_policy(name).await
}

pub(super) fn default_schedule_object() -> BackupSchedule {
    default_schedule(Utc::now())
}

/// 默认保留策略：四个层级全部启用，运行时间与默认计划一致
pub(super) fn default_retention_object(kind: ProviderKind) -> Vec<RetentionPolicy> {
    let times = default_schedule_object().run_times();
    let mut policies = vec![
        RetentionPolicy::daily(DEFAULT_DAILY_RETENTION),
        RetentionPolicy::weekly(DEFAULT_WEEKLY_RETENTION, vec![DayOfWeek::Sunday]),
        RetentionPolicy::monthly(
            DEFAULT_MONTHLY_RETENTION,
            RetentionSelector::Weekly {
                week_numbers: vec![WeekNumber::First],
                days_of_week: vec![DayOfWeek::Sunday],
            },
        ),
        RetentionPolicy::yearly(
            DEFAULT_YEARLY_RETENTION,
            vec![Month::January],
            RetentionSelector::Weekly {
                week_numbers: vec![WeekNumber::First],
                days_of_week: vec![DayOfWeek::Sunday],
            },
        ),
    ];
    debug!("{} Provider 默认保留策略包含 {} 个层级", kind, policies.len());
    for policy in &mut policies {
        policy.retention_times = times.clone();
    }
    policies
}
