//! 保护操作编排
//!
//! 每个用例按同一流程执行：构建参数 → 选择 Provider → 提交一次 →
//! 跟踪异步操作 → 有作业 ID 时读取作业对象。

use crate::client::{BackupServiceClient, Submission};
use crate::config::AppConfig;
use crate::error::{Result, VaultError};
use crate::models::{
    BackupManagementType, ContainerQuery, IlrAction, ItemRef, Job, OperationHandle,
    ProtectedItem, ProtectionContainer, ProtectionPolicy, RecoveryPoint, RecoveryPointFilter,
    StorageAccount, VmIdentity, WorkloadType,
};
use crate::policy::converter::align_retention_times;
use crate::policy::wire::ProtectionPolicyResource;
use crate::policy::{BackupSchedule, PolicyValidator, RetentionPolicy, policy_from_resource};
use crate::provider::{
    ParamKey, ParamValue, ProviderData, ProviderHandle, ProviderKind, ProviderOperation,
    get_provider, get_provider_for_container, provider_kind,
};
use crate::tracker::OperationTracker;
use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// 开启保护的目标
#[derive(Debug, Clone)]
pub enum ProtectionTarget {
    /// 尚未保护的虚拟机
    Vm(VmIdentity),
    /// 已有受保护项，开启保护即切换策略
    Item(ProtectedItem),
}

/// 策略查询方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyQuery {
    Name(String),
    Workload(WorkloadType),
    WorkloadAndManagement(WorkloadType, BackupManagementType),
    All,
}

/// 修改策略时要替换的部分
#[derive(Debug, Clone, Default)]
pub struct PolicyChanges {
    pub schedule: Option<BackupSchedule>,
    pub retention_policies: Option<Vec<RetentionPolicy>>,
}

/// 文件级恢复访问的结果
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryPointAccess {
    pub job: Option<Job>,
    /// 已写入本地的挂载脚本
    pub script_path: Option<PathBuf>,
    pub password: Option<String>,
}

/// 保护操作管理器
pub struct ProtectionManager<C: BackupServiceClient> {
    client: C,
    validator: PolicyValidator,
    tracker: OperationTracker,
    cancel: CancellationToken,
}

impl<C: BackupServiceClient> ProtectionManager<C> {
    pub fn new(client: C, validator: PolicyValidator, tracker: OperationTracker) -> Self {
        Self {
            client,
            validator,
            tracker,
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(client: C, config: &AppConfig) -> Result<Self> {
        let validator = PolicyValidator::from_config(&config.validation)?;
        let tracker = OperationTracker::from_config(&config.tracking);
        Ok(Self::new(client, validator, tracker))
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn validator(&self) -> &PolicyValidator {
        &self.validator
    }

    /// 取消后，正在进行的操作跟踪立即以 `Cancelled` 结束
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 已取消的管理器不再向服务端发起任何调用
    fn ensure_not_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(VaultError::Cancelled("操作已取消，不再提交新的请求".to_string()));
        }
        Ok(())
    }

    fn provider(
        &self,
        workload: WorkloadType,
        management_type: Option<BackupManagementType>,
        data: ProviderData,
    ) -> Result<ProviderHandle<'_>> {
        self.ensure_not_cancelled()?;
        get_provider(workload, management_type, data, &self.client)
    }

    fn item_provider(&self, item: &ProtectedItem, data: ProviderData) -> Result<ProviderHandle<'_>> {
        self.provider(
            item.workload_type,
            Some(item.backup_management_type),
            data.with(ParamKey::Item, ParamValue::Item(item.clone())),
        )
    }

    /// 跟踪到终态，失败转为 `RemoteOperationFailed`，有作业 ID 时读取作业
    async fn complete(&self, handle: &OperationHandle) -> Result<Option<Job>> {
        let tracked = self
            .tracker
            .track_operation(&self.client, handle, &self.cancel)
            .await?;

        match tracked.outcome.into_job_id(&handle.operation)? {
            Some(job_id) => {
                let job = self.client.get_job(&job_id).await?;
                info!("✅ {} 完成，作业 {} 状态: {}", handle.operation, job.name, job.status);
                Ok(Some(job))
            }
            None => {
                info!("✅ {} 完成", handle.operation);
                Ok(None)
            }
        }
    }

    async fn finish_policy_submission(
        &self,
        name: &str,
        submission: Submission<ProtectionPolicyResource>,
    ) -> Result<ProtectionPolicy> {
        let resource = match submission {
            Submission::Done(resource) => resource,
            Submission::Accepted(handle) => {
                self.complete(&handle).await?;
                self.client.get_policy(name).await?
            }
        };
        policy_from_resource(&resource)
    }

    // ========== 保护 ==========

    #[instrument(skip_all, fields(policy = %policy.name))]
    pub async fn enable_protection(
        &self,
        target: ProtectionTarget,
        policy: &ProtectionPolicy,
    ) -> Result<Option<Job>> {
        let data = ProviderData::new().with(ParamKey::Policy, ParamValue::Policy(policy.clone()));
        let data = match target {
            ProtectionTarget::Vm(vm) => data.with(ParamKey::Vm, ParamValue::Vm(vm)),
            ProtectionTarget::Item(item) => data.with(ParamKey::Item, ParamValue::Item(item)),
        };

        let provider = self.provider(
            policy.workload_type,
            Some(policy.backup_management_type),
            data,
        )?;
        let handle = provider.enable_protection().await?;
        self.complete(&handle).await
    }

    #[instrument(skip_all, fields(item = %item.friendly_name))]
    pub async fn disable_protection(&self, item: &ProtectedItem) -> Result<Option<Job>> {
        let provider = self.item_provider(item, ProviderData::new())?;
        let handle = provider.disable_protection().await?;
        self.complete(&handle).await
    }

    #[instrument(skip_all, fields(item = %item.friendly_name))]
    pub async fn trigger_backup(&self, item: &ProtectedItem) -> Result<Option<Job>> {
        let provider = self.item_provider(item, ProviderData::new())?;
        let handle = provider.trigger_backup().await?;
        self.complete(&handle).await
    }

    /// 经典存储账户优先；仅在未找到时再查 Compute 存储账户
    async fn resolve_storage_account(&self, name: &str) -> Result<StorageAccount> {
        let account = match self.client.get_classic_storage_account(name).await {
            Ok(account) => account,
            Err(e) if e.is_not_found() => {
                debug!("未找到经典存储账户 {}，改查 Compute 存储账户", name);
                self.client.get_storage_account(name).await?
            }
            Err(e) => return Err(e),
        };

        if account.is_blob_storage() {
            return Err(VaultError::invalid_argument(
                "StorageAccountName",
                format!("存储账户 {name} 为 BlobStorage 类型，不能用于恢复"),
            ));
        }
        Ok(account)
    }

    #[instrument(skip_all, fields(recovery_point = %recovery_point.name))]
    pub async fn restore_item(
        &self,
        recovery_point: &RecoveryPoint,
        item: &ProtectedItem,
        storage_account_name: &str,
    ) -> Result<Option<Job>> {
        // 查询存储账户前先确认 Provider 支持恢复
        self.item_provider(item, ProviderData::new())?
            .ensure_supports(ProviderOperation::TriggerRestore)?;

        let account = self.resolve_storage_account(storage_account_name).await?;
        let data = ProviderData::new()
            .with(
                ParamKey::RecoveryPoint,
                ParamValue::RecoveryPoint(recovery_point.clone()),
            )
            .with(ParamKey::StorageAccount, ParamValue::StorageAccount(account));
        let provider = self.item_provider(item, data)?;
        let handle = provider.trigger_restore().await?;
        self.complete(&handle).await
    }

    // ========== 文件级恢复 ==========

    fn recovery_point_data(recovery_point: &RecoveryPoint) -> ProviderData {
        ProviderData::new().with(
            ParamKey::RecoveryPoint,
            ParamValue::RecoveryPoint(recovery_point.clone()),
        )
    }

    /// 读取挂载脚本并写入目标目录
    async fn save_script(
        &self,
        handle: &OperationHandle,
        item: &ProtectedItem,
        recovery_point: &RecoveryPoint,
        target_dir: &Path,
    ) -> Result<(PathBuf, Option<String>)> {
        let script = self.client.get_ilr_script(handle).await?;
        let extension = script.script_extension.trim_start_matches('.');
        let file_name = format!(
            "{}_{}.{}",
            sanitize_file_name(&item.friendly_name),
            sanitize_file_name(&recovery_point.name),
            extension
        );

        tokio::fs::create_dir_all(target_dir).await?;
        let path = target_dir.join(file_name);
        tokio::fs::write(&path, script.script_content.as_bytes()).await?;
        info!("📄 挂载脚本已保存: {}", path.display());
        Ok((path, script.password))
    }

    #[instrument(skip_all, fields(recovery_point = %recovery_point.name))]
    pub async fn grant_recovery_point_access(
        &self,
        item: &ProtectedItem,
        recovery_point: &RecoveryPoint,
        target_dir: &Path,
    ) -> Result<RecoveryPointAccess> {
        let provider = self.item_provider(item, Self::recovery_point_data(recovery_point))?;
        let handle = provider.provision_item_level_recovery_access().await?;
        let job = self.complete(&handle).await?;
        let (script_path, password) = self
            .save_script(&handle, item, recovery_point, target_dir)
            .await?;

        Ok(RecoveryPointAccess {
            job,
            script_path: Some(script_path),
            password,
        })
    }

    #[instrument(skip_all, fields(recovery_point = %recovery_point.name))]
    pub async fn revoke_recovery_point_access(
        &self,
        item: &ProtectedItem,
        recovery_point: &RecoveryPoint,
    ) -> Result<Option<Job>> {
        let provider = self.item_provider(item, Self::recovery_point_data(recovery_point))?;
        let handle = provider.revoke_item_level_recovery_access().await?;
        self.complete(&handle).await
    }

    /// Connect / Extend 申请访问并保存脚本，Terminate 撤销访问
    #[instrument(skip_all, fields(recovery_point = %recovery_point.name, action = ?action))]
    pub async fn explore_recovery_point(
        &self,
        item: &ProtectedItem,
        recovery_point: &RecoveryPoint,
        action: IlrAction,
        target_dir: &Path,
    ) -> Result<RecoveryPointAccess> {
        let data = Self::recovery_point_data(recovery_point)
            .with(ParamKey::IlrAction, ParamValue::IlrAction(action));
        let provider = self.item_provider(item, data)?;
        let handle = provider.explore_recovery_point().await?;
        let job = self.complete(&handle).await?;

        match action {
            IlrAction::Connect | IlrAction::Extend => {
                let (script_path, password) = self
                    .save_script(&handle, item, recovery_point, target_dir)
                    .await?;
                Ok(RecoveryPointAccess {
                    job,
                    script_path: Some(script_path),
                    password,
                })
            }
            IlrAction::Terminate => Ok(RecoveryPointAccess {
                job,
                script_path: None,
                password: None,
            }),
        }
    }

    // ========== 查询 ==========

    pub async fn list_containers(&self, query: ContainerQuery) -> Result<Vec<ProtectionContainer>> {
        let provider = get_provider_for_container(
            query.container_type,
            Some(query.backup_management_type),
            ProviderData::new().with(ParamKey::ContainerQuery, ParamValue::ContainerQuery(query.clone())),
            &self.client,
        )?;
        provider.list_protection_containers().await
    }

    pub async fn get_protected_item(
        &self,
        workload: WorkloadType,
        management_type: Option<BackupManagementType>,
        item: ItemRef,
    ) -> Result<ProtectedItem> {
        let data = ProviderData::new().with(ParamKey::ItemRef, ParamValue::ItemRef(item));
        let provider = self.provider(workload, management_type, data)?;
        provider.get_protected_item().await
    }

    pub async fn list_recovery_points(
        &self,
        item: &ProtectedItem,
        filter: RecoveryPointFilter,
    ) -> Result<Vec<RecoveryPoint>> {
        let data = ProviderData::new().with(
            ParamKey::RecoveryPointFilter,
            ParamValue::RecoveryPointFilter(filter),
        );
        let provider = self.item_provider(item, data)?;
        provider.list_recovery_points().await
    }

    pub async fn get_recovery_point(
        &self,
        item: &ProtectedItem,
        recovery_point_id: &str,
    ) -> Result<RecoveryPoint> {
        let data = ProviderData::new().with(
            ParamKey::RecoveryPointId,
            ParamValue::Text(recovery_point_id.to_string()),
        );
        let provider = self.item_provider(item, data)?;
        provider.get_recovery_point_details().await
    }

    pub fn default_schedule(
        &self,
        workload: WorkloadType,
        management_type: Option<BackupManagementType>,
    ) -> Result<BackupSchedule> {
        self.provider(workload, management_type, ProviderData::new())?
            .get_default_schedule_policy_object()
    }

    pub fn default_retention(
        &self,
        workload: WorkloadType,
        management_type: Option<BackupManagementType>,
    ) -> Result<Vec<RetentionPolicy>> {
        self.provider(workload, management_type, ProviderData::new())?
            .get_default_retention_policy_object()
    }

    // ========== 策略 ==========

    /// 按名称、工作负载或管理类型列出策略
    pub async fn list_policies(&self, query: PolicyQuery) -> Result<Vec<ProtectionPolicy>> {
        let management_type = match query {
            PolicyQuery::Name(name) => {
                self.validator.validate_policy_name(&name)?;
                let resource = self.client.get_policy(&name).await.map_err(|e| {
                    if e.is_not_found() {
                        VaultError::not_found(format!("保护策略 {name}"))
                    } else {
                        e
                    }
                })?;
                return Ok(vec![policy_from_resource(&resource)?]);
            }
            PolicyQuery::Workload(workload) => Some(default_management_type(workload)?),
            PolicyQuery::WorkloadAndManagement(WorkloadType::AzureVm, BackupManagementType::AzureVm) => {
                Some(BackupManagementType::AzureVm)
            }
            PolicyQuery::WorkloadAndManagement(workload, management_type) => {
                return Err(VaultError::not_supported(format!(
                    "不支持按 {workload} / {management_type} 查询策略"
                )));
            }
            PolicyQuery::All => None,
        };

        let resources = self.client.list_policies(management_type).await?;
        let mut policies = Vec::with_capacity(resources.len());
        for resource in &resources {
            match policy_from_resource(resource) {
                Ok(policy) => policies.push(policy),
                Err(e) => warn!("跳过无法解析的策略 {}: {}", resource.name, e),
            }
        }
        Ok(policies)
    }

    pub async fn get_policy(
        &self,
        workload: WorkloadType,
        management_type: Option<BackupManagementType>,
        name: &str,
    ) -> Result<ProtectionPolicy> {
        self.validator.validate_policy_name(name)?;
        let data = ProviderData::new().with(ParamKey::PolicyName, ParamValue::Text(name.to_string()));
        let provider = self.provider(workload, management_type, data)?;
        provider.get_policy().await
    }

    /// 校验、查重、对齐保留时间后提交
    #[instrument(skip_all, fields(policy = %policy.name))]
    pub async fn create_policy(&self, mut policy: ProtectionPolicy) -> Result<ProtectionPolicy> {
        self.validator.validate_policy(&policy)?;
        let run_times = policy.schedule.run_times();
        align_retention_times(&mut policy.retention_policies, &run_times);

        let name = policy.name.clone();
        let provider = self.provider(
            policy.workload_type,
            Some(policy.backup_management_type),
            ProviderData::new().with(ParamKey::Policy, ParamValue::Policy(policy)),
        )?;
        provider.ensure_supports(ProviderOperation::CreatePolicy)?;

        match self.client.get_policy(&name).await {
            Ok(_) => {
                return Err(VaultError::invalid_argument(
                    "Name",
                    format!("保护策略 {name} 已存在"),
                ));
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let submission = provider.create_policy().await?;
        self.finish_policy_submission(&name, submission).await
    }

    /// 在现有策略上替换计划或保留策略后重新提交
    #[instrument(skip(self, changes))]
    pub async fn modify_policy(&self, name: &str, changes: PolicyChanges) -> Result<ProtectionPolicy> {
        self.validator.validate_policy_name(name)?;
        let mut policy = policy_from_resource(&self.client.get_policy(name).await?)?;

        if let Some(schedule) = changes.schedule {
            policy.schedule = schedule;
        }
        if let Some(retention_policies) = changes.retention_policies {
            policy.retention_policies = retention_policies;
        }
        let run_times = policy.schedule.run_times();
        align_retention_times(&mut policy.retention_policies, &run_times);
        self.validator.validate_policy(&policy)?;

        let provider = self.provider(
            policy.workload_type,
            Some(policy.backup_management_type),
            ProviderData::new().with(ParamKey::Policy, ParamValue::Policy(policy)),
        )?;
        let submission = provider.modify_policy().await?;
        self.finish_policy_submission(name, submission).await
    }

    #[instrument(skip(self))]
    pub async fn remove_policy(&self, name: &str) -> Result<Option<Job>> {
        self.validator.validate_policy_name(name)?;
        let policy = policy_from_resource(&self.client.get_policy(name).await?)?;
        let provider = self.provider(
            policy.workload_type,
            Some(policy.backup_management_type),
            ProviderData::new().with(ParamKey::Policy, ParamValue::Policy(policy)),
        )?;

        match provider.delete_policy().await? {
            Submission::Done(()) => Ok(None),
            Submission::Accepted(handle) => self.complete(&handle).await,
        }
    }

    // ========== 作业 ==========

    #[instrument(skip(self))]
    pub async fn stop_job(&self, job_id: &str) -> Result<Job> {
        self.ensure_not_cancelled()?;
        self.client.cancel_job(job_id).await?;
        info!("已请求取消作业: {}", job_id);
        self.client.get_job(job_id).await
    }

    /// 并发读取多个作业，失败项合并为一个错误
    pub async fn get_jobs(&self, job_ids: &[String]) -> Result<Vec<Job>> {
        let results = join_all(job_ids.iter().map(|id| self.client.get_job(id))).await;

        let mut jobs = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(job) => jobs.push(job),
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(jobs)
        } else {
            Err(VaultError::aggregate(errors))
        }
    }
}

/// 工作负载在查询策略时对应的管理类型
pub fn default_management_type(workload: WorkloadType) -> Result<BackupManagementType> {
    match provider_kind(workload, None)? {
        ProviderKind::IaasVm => Ok(BackupManagementType::AzureVm),
        ProviderKind::AzureSql => Ok(BackupManagementType::AzureSql),
        kind => Err(VaultError::not_supported(format!("{kind} Provider 不管理保护策略"))),
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::models::{IlrScript, OperationStatusResponse, VmLocation};
    use crate::policy::{ScheduleType, policy_to_resource};
    use crate::testing::MockClient;
    use crate::testing::fixtures::{job, recovery_point, storage_account, vm_item};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn manager(client: MockClient) -> ProtectionManager<MockClient> {
        ProtectionManager::from_config(client, &AppConfig::default()).unwrap()
    }

    fn daily_policy(name: &str) -> ProtectionPolicy {
        let schedule = BackupSchedule {
            schedule_type: ScheduleType::Daily,
            run_days: Vec::new(),
            run_time: Utc.with_ymd_and_hms(2024, 1, 1, 22, 30, 0).unwrap(),
        };
        ProtectionPolicy {
            policy_id: None,
            name: name.to_string(),
            workload_type: WorkloadType::AzureVm,
            backup_management_type: BackupManagementType::AzureVm,
            retention_policies: vec![RetentionPolicy::daily(30)],
            schedule,
        }
    }

    fn stored_policy(name: &str) -> ProtectionPolicy {
        let mut policy = daily_policy(name);
        policy.policy_id = Some(format!("/policies/{name}"));
        let times = policy.schedule.run_times();
        align_retention_times(&mut policy.retention_policies, &times);
        policy
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_protection_submits_once_and_fetches_job() {
        let client = MockClient::new()
            .with_statuses(vec![
                OperationStatusResponse::in_progress(),
                OperationStatusResponse::completed(Some("job-1")),
            ])
            .with_job(job("job-1", "Completed"));
        let manager = manager(client);
        let vm = VmIdentity {
            name: "web01".to_string(),
            location: VmLocation::Compute {
                resource_group: "rg1".to_string(),
            },
        };

        let job = manager
            .enable_protection(ProtectionTarget::Vm(vm), &stored_policy("DailyPolicy"))
            .await
            .unwrap();

        assert_eq!(job.unwrap().name, "job-1");
        assert_eq!(manager.client().submissions(), 1);
        assert_eq!(
            manager.client().calls(),
            vec![
                "configure_protection",
                "get_operation_status",
                "get_operation_status",
                "get_job"
            ]
        );
    }

    #[tokio::test]
    async fn test_enable_protection_sends_classic_item_type() {
        let manager = manager(MockClient::new());
        let policy = stored_policy("DailyPolicy");
        let classic = VmIdentity {
            name: "legacy01".to_string(),
            location: VmLocation::Classic {
                service_name: "legacysvc".to_string(),
            },
        };
        manager
            .enable_protection(ProtectionTarget::Vm(classic), &policy)
            .await
            .unwrap();

        let mut classic_item = vm_item("legacy02");
        classic_item.container_name = "iaasvmcontainer;iaasvmcontainer;legacysvc;legacy02".to_string();
        manager
            .enable_protection(ProtectionTarget::Item(classic_item), &policy)
            .await
            .unwrap();
        manager
            .enable_protection(ProtectionTarget::Item(vm_item("web01")), &policy)
            .await
            .unwrap();

        let types: Vec<_> = manager
            .client()
            .protection_requests()
            .into_iter()
            .map(|request| request.protected_item_type)
            .collect();
        assert_eq!(
            types,
            vec![
                "Microsoft.ClassicCompute/virtualMachines",
                "Microsoft.ClassicCompute/virtualMachines",
                "Microsoft.Compute/virtualMachines",
            ]
        );
    }

    #[tokio::test]
    async fn test_enable_protection_requires_policy_id() {
        let manager = manager(MockClient::new());
        let err = manager
            .enable_protection(ProtectionTarget::Item(vm_item("web01")), &daily_policy("DailyPolicy"))
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
        assert!(manager.client().calls().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_becomes_typed_error() {
        let client = MockClient::new()
            .with_statuses(vec![OperationStatusResponse::failed("E1", "boom")]);
        let manager = manager(client);

        let err = manager.trigger_backup(&vm_item("web01")).await.unwrap_err();
        match err {
            VaultError::RemoteOperationFailed { code, message, .. } => {
                assert_eq!(code, "E1");
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsupported_operation_makes_no_calls() {
        let manager = manager(MockClient::new());
        let mut item = vm_item("fileserver");
        item.workload_type = WorkloadType::FileFolder;
        item.backup_management_type = BackupManagementType::Dpm;

        let err = manager.trigger_backup(&item).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotSupported);

        let err = manager
            .restore_item(&recovery_point("rp1", 1), &item, "staging")
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotSupported);
        assert!(manager.client().calls().is_empty());
    }

    #[tokio::test]
    async fn test_restore_falls_back_to_compute_storage_account() {
        let client = MockClient::new().with_compute_account(storage_account("staging", Some("StorageV2")));
        let manager = manager(client);

        manager
            .restore_item(&recovery_point("rp1", 1), &vm_item("web01"), "staging")
            .await
            .unwrap();

        let calls = manager.client().calls();
        assert_eq!(calls[0], "get_classic_storage_account");
        assert_eq!(calls[1], "get_storage_account");
        let requests = manager.client().restore_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].storage_account_id, "/storageAccounts/staging");
        assert_eq!(requests[0].recovery_point_id, "rp1");
        assert_eq!(requests[0].region, "eastus");
    }

    #[tokio::test]
    async fn test_restore_rejects_blob_storage() {
        let client = MockClient::new()
            .with_classic_account(storage_account("staging", Some("BlobStorage")));
        let manager = manager(client);

        let err = manager
            .restore_item(&recovery_point("rp1", 1), &vm_item("web01"), "staging")
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
        assert_eq!(manager.client().submissions(), 0);
    }

    #[tokio::test]
    async fn test_restore_missing_everywhere_is_not_found() {
        let manager = manager(MockClient::new());
        let err = manager
            .restore_item(&recovery_point("rp1", 1), &vm_item("web01"), "staging")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_policies_by_name() {
        let client = MockClient::new().with_policy(policy_to_resource(&stored_policy("DailyPolicy")));
        let manager = manager(client);

        let policies = manager
            .list_policies(PolicyQuery::Name("DailyPolicy".to_string()))
            .await
            .unwrap();
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].name, "DailyPolicy");

        let err = manager
            .list_policies(PolicyQuery::Name("Missing".to_string()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = manager
            .list_policies(PolicyQuery::Name("1abc".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
    }

    #[tokio::test]
    async fn test_list_policies_filters() {
        let mut sql = stored_policy("SqlPolicy");
        sql.workload_type = WorkloadType::AzureSqlDatabase;
        sql.backup_management_type = BackupManagementType::AzureSql;
        let client = MockClient::new()
            .with_policy(policy_to_resource(&stored_policy("DailyPolicy")))
            .with_policy(policy_to_resource(&sql));
        let manager = manager(client);

        let vm_policies = manager
            .list_policies(PolicyQuery::Workload(WorkloadType::AzureVm))
            .await
            .unwrap();
        assert_eq!(vm_policies.len(), 1);
        assert_eq!(vm_policies[0].name, "DailyPolicy");

        let all = manager.list_policies(PolicyQuery::All).await.unwrap();
        assert_eq!(all.len(), 2);

        let err = manager
            .list_policies(PolicyQuery::WorkloadAndManagement(
                WorkloadType::AzureSqlDatabase,
                BackupManagementType::AzureSql,
            ))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotSupported);
    }

    #[tokio::test]
    async fn test_create_policy_done() {
        let manager = manager(MockClient::new());
        let created = manager.create_policy(daily_policy("DailyPolicy")).await.unwrap();

        assert_eq!(created.policy_id.as_deref(), Some("/policies/DailyPolicy"));
        assert_eq!(
            created.retention_policies[0].retention_times,
            created.schedule.run_times()
        );
        assert_eq!(manager.client().submissions(), 1);
    }

    #[tokio::test]
    async fn test_create_policy_accepted_reads_back() {
        let manager = manager(MockClient::new().accepting_policy_writes());
        let created = manager.create_policy(daily_policy("DailyPolicy")).await.unwrap();

        assert_eq!(created.name, "DailyPolicy");
        assert_eq!(manager.client().calls().last().map(String::as_str), Some("get_policy"));
    }

    #[tokio::test]
    async fn test_create_policy_rejects_existing_and_invalid() {
        let client = MockClient::new().with_policy(policy_to_resource(&stored_policy("DailyPolicy")));
        let manager = manager(client);

        let err = manager.create_policy(daily_policy("DailyPolicy")).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);

        let mut invalid = daily_policy("Other");
        invalid.retention_policies = vec![RetentionPolicy::daily(3)];
        let err = manager.create_policy(invalid).await.unwrap_err();
        match err {
            VaultError::InvalidArgument { field, .. } => assert_eq!(field, "Retention"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(manager.client().submissions(), 0);
    }

    #[tokio::test]
    async fn test_modify_policy_replaces_retention() {
        let client = MockClient::new().with_policy(policy_to_resource(&stored_policy("DailyPolicy")));
        let manager = manager(client);

        let changes = PolicyChanges {
            schedule: None,
            retention_policies: Some(vec![RetentionPolicy::daily(60)]),
        };
        let modified = manager.modify_policy("DailyPolicy", changes).await.unwrap();

        assert_eq!(modified.retention_policies[0].retention, 60);
        let stored = manager.client().stored_policy("DailyPolicy").unwrap();
        let daily = stored.properties.retention_policy.daily_schedule.unwrap();
        assert_eq!(daily.retention_duration.count, 60);
    }

    #[tokio::test]
    async fn test_remove_policy_tracks_deletion() {
        let client = MockClient::new().with_policy(policy_to_resource(&stored_policy("DailyPolicy")));
        let manager = manager(client);

        let job = manager.remove_policy("DailyPolicy").await.unwrap();
        assert!(job.is_none());
        assert!(manager.client().stored_policy("DailyPolicy").is_none());
        assert_eq!(manager.client().submissions(), 1);
    }

    #[tokio::test]
    async fn test_stop_job_rereads_job() {
        let manager = manager(MockClient::new().with_job(job("job-9", "InProgress")));
        let job = manager.stop_job("job-9").await.unwrap();
        assert_eq!(job.status, "Cancelling");
    }

    #[tokio::test]
    async fn test_get_jobs_aggregates_failures() {
        let manager = manager(MockClient::new().with_job(job("job-1", "Completed")));
        let ids = vec![
            "job-1".to_string(),
            "missing-1".to_string(),
            "missing-2".to_string(),
        ];

        let err = manager.get_jobs(&ids).await.unwrap_err();
        let causes = err.causes();
        assert_eq!(causes.len(), 2);
        assert!(causes.iter().all(|cause| cause.is_not_found()));

        let jobs = manager.get_jobs(&ids[..1]).await.unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_explore_connect_writes_script() {
        let client = MockClient::new().with_ilr_script(IlrScript {
            script_content: "#!/usr/bin/env python3\n".to_string(),
            script_extension: ".py".to_string(),
            os_type: Some("Linux".to_string()),
            password: Some("secret".to_string()),
        });
        let manager = manager(client);
        let dir = TempDir::new().unwrap();

        let access = manager
            .explore_recovery_point(
                &vm_item("web01"),
                &recovery_point("rp1", 1),
                IlrAction::Connect,
                dir.path(),
            )
            .await
            .unwrap();

        let path = access.script_path.unwrap();
        assert_eq!(path, dir.path().join("web01_rp1.py"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "#!/usr/bin/env python3\n");
        assert_eq!(access.password.as_deref(), Some("secret"));
        assert_eq!(manager.client().calls()[0], "provision_ilr_access");
    }

    #[tokio::test]
    async fn test_explore_terminate_revokes() {
        let manager = manager(MockClient::new());
        let dir = TempDir::new().unwrap();

        let access = manager
            .explore_recovery_point(
                &vm_item("web01"),
                &recovery_point("rp1", 1),
                IlrAction::Terminate,
                dir.path(),
            )
            .await
            .unwrap();

        assert!(access.script_path.is_none());
        assert_eq!(manager.client().calls()[0], "revoke_ilr_access");
    }

    #[tokio::test]
    async fn test_cancelled_manager_submits_nothing() {
        let client = MockClient::new().with_statuses(vec![OperationStatusResponse::in_progress()]);
        let manager = manager(client);
        manager.cancellation_token().cancel();

        for _ in 0..2 {
            let err = manager.trigger_backup(&vm_item("web01")).await.unwrap_err();
            assert!(matches!(err, VaultError::Cancelled(_)));
        }
        let err = manager.stop_job("job-1").await.unwrap_err();
        assert!(matches!(err, VaultError::Cancelled(_)));

        assert_eq!(manager.client().submissions(), 0);
        assert!(manager.client().calls().is_empty());
    }

    #[test]
    fn test_default_objects_for_sql() {
        let manager = manager(MockClient::new());
        let schedule = manager.default_schedule(WorkloadType::AzureSqlDatabase, None).unwrap();
        assert_eq!(schedule.schedule_type, ScheduleType::Daily);

        let retention = manager.default_retention(WorkloadType::AzureSqlDatabase, None).unwrap();
        assert_eq!(retention.len(), 4);
        assert!(retention.iter().all(|r| r.retention_times == schedule.run_times()));

        let err = manager
            .default_schedule(WorkloadType::FileFolder, Some(BackupManagementType::Mab))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotSupported);
    }
}
