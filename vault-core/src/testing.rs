//! 单元测试使用的内存备份服务

use crate::client::{BackupServiceClient, ProtectionRequest, Submission};
use crate::error::{Result, VaultError};
use crate::models::{
    BackupManagementType, ContainerQuery, IlrScript, ItemRef, Job, OperationHandle,
    OperationStatusResponse, ProtectedItem, ProtectionContainer, RecoveryPoint,
    RecoveryPointFilter, RestoreRequest, StorageAccount,
};
use crate::policy::wire::ProtectionPolicyResource;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

const MUTATING_CALLS: &[&str] = &[
    "configure_protection",
    "remove_protection",
    "trigger_backup",
    "trigger_restore",
    "create_or_update_policy",
    "delete_policy",
    "provision_ilr_access",
    "revoke_ilr_access",
    "cancel_job",
];

#[derive(Default)]
struct Inner {
    statuses: VecDeque<OperationStatusResponse>,
    calls: Vec<String>,
    jobs: HashMap<String, Job>,
    policies: HashMap<String, ProtectionPolicyResource>,
    accept_policy_writes: bool,
    classic_accounts: HashMap<String, StorageAccount>,
    compute_accounts: HashMap<String, StorageAccount>,
    containers: Vec<ProtectionContainer>,
    items: HashMap<String, ProtectedItem>,
    recovery_points: Vec<RecoveryPoint>,
    ilr_script: Option<IlrScript>,
    restore_requests: Vec<RestoreRequest>,
    protection_requests: Vec<ProtectionRequest>,
}

#[derive(Default)]
pub(crate) struct MockClient {
    inner: Mutex<Inner>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 依次返回的操作状态；用完后一律返回 Completed
    pub fn with_statuses(self, statuses: Vec<OperationStatusResponse>) -> Self {
        self.inner.lock().unwrap().statuses = statuses.into();
        self
    }

    pub fn with_job(self, job: Job) -> Self {
        self.inner.lock().unwrap().jobs.insert(job.name.clone(), job);
        self
    }

    pub fn with_policy(self, policy: ProtectionPolicyResource) -> Self {
        self.inner
            .lock()
            .unwrap()
            .policies
            .insert(policy.name.clone(), policy);
        self
    }

    /// 策略写入返回异步句柄而不是同步结果
    pub fn accepting_policy_writes(self) -> Self {
        self.inner.lock().unwrap().accept_policy_writes = true;
        self
    }

    pub fn with_classic_account(self, account: StorageAccount) -> Self {
        self.inner
            .lock()
            .unwrap()
            .classic_accounts
            .insert(account.name.clone(), account);
        self
    }

    pub fn with_compute_account(self, account: StorageAccount) -> Self {
        self.inner
            .lock()
            .unwrap()
            .compute_accounts
            .insert(account.name.clone(), account);
        self
    }

    pub fn with_container(self, container: ProtectionContainer) -> Self {
        self.inner.lock().unwrap().containers.push(container);
        self
    }

    pub fn with_item(self, item: ProtectedItem) -> Self {
        self.inner
            .lock()
            .unwrap()
            .items
            .insert(item.name.clone(), item);
        self
    }

    pub fn with_recovery_point(self, point: RecoveryPoint) -> Self {
        self.inner.lock().unwrap().recovery_points.push(point);
        self
    }

    pub fn with_ilr_script(self, script: IlrScript) -> Self {
        self.inner.lock().unwrap().ilr_script = Some(script);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// 写操作的调用次数
    pub fn submissions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| MUTATING_CALLS.contains(&call.as_str()))
            .count()
    }

    pub fn restore_requests(&self) -> Vec<RestoreRequest> {
        self.inner.lock().unwrap().restore_requests.clone()
    }

    pub fn protection_requests(&self) -> Vec<ProtectionRequest> {
        self.inner.lock().unwrap().protection_requests.clone()
    }

    pub fn stored_policy(&self, name: &str) -> Option<ProtectionPolicyResource> {
        self.inner.lock().unwrap().policies.get(name).cloned()
    }

    fn record(&self, call: &str) {
        self.inner.lock().unwrap().calls.push(call.to_string());
    }

    fn handle(&self, operation: &str) -> OperationHandle {
        let count = self.calls().len();
        self.record(operation);
        OperationHandle::new(
            operation,
            format!("https://mock/operations/{operation}-{count}"),
        )
    }
}

#[async_trait]
impl BackupServiceClient for MockClient {
    async fn configure_protection(
        &self,
        _item: &ItemRef,
        request: &ProtectionRequest,
    ) -> Result<OperationHandle> {
        self.inner
            .lock()
            .unwrap()
            .protection_requests
            .push(request.clone());
        Ok(self.handle("configure_protection"))
    }

    async fn remove_protection(&self, _item: &ItemRef) -> Result<OperationHandle> {
        Ok(self.handle("remove_protection"))
    }

    async fn trigger_backup(&self, _item: &ItemRef) -> Result<OperationHandle> {
        Ok(self.handle("trigger_backup"))
    }

    async fn trigger_restore(
        &self,
        _item: &ItemRef,
        request: &RestoreRequest,
    ) -> Result<OperationHandle> {
        self.inner
            .lock()
            .unwrap()
            .restore_requests
            .push(request.clone());
        Ok(self.handle("trigger_restore"))
    }

    async fn get_protected_item(&self, item: &ItemRef) -> Result<ProtectedItem> {
        self.record("get_protected_item");
        self.inner
            .lock()
            .unwrap()
            .items
            .get(&item.item_name)
            .cloned()
            .ok_or_else(|| VaultError::not_found(item.item_name.clone()))
    }

    async fn list_recovery_points(
        &self,
        _item: &ItemRef,
        filter: &RecoveryPointFilter,
    ) -> Result<Vec<RecoveryPoint>> {
        self.record("list_recovery_points");
        let points = self.inner.lock().unwrap().recovery_points.clone();
        Ok(points
            .into_iter()
            .filter(|p| filter.start.is_none_or(|start| p.recovery_point_time >= start))
            .filter(|p| filter.end.is_none_or(|end| p.recovery_point_time <= end))
            .collect())
    }

    async fn get_recovery_point(
        &self,
        _item: &ItemRef,
        recovery_point: &str,
    ) -> Result<RecoveryPoint> {
        self.record("get_recovery_point");
        self.inner
            .lock()
            .unwrap()
            .recovery_points
            .iter()
            .find(|p| p.name == recovery_point)
            .cloned()
            .ok_or_else(|| VaultError::not_found(recovery_point.to_string()))
    }

    async fn get_policy(&self, name: &str) -> Result<ProtectionPolicyResource> {
        self.record("get_policy");
        self.stored_policy(name)
            .ok_or_else(|| VaultError::not_found(name.to_string()))
    }

    async fn list_policies(
        &self,
        management_type: Option<BackupManagementType>,
    ) -> Result<Vec<ProtectionPolicyResource>> {
        self.record("list_policies");
        let mut policies: Vec<_> = self
            .inner
            .lock()
            .unwrap()
            .policies
            .values()
            .filter(|p| {
                management_type.is_none_or(|mgmt| {
                    p.properties.backup_management_type.eq_ignore_ascii_case(mgmt.as_str())
                })
            })
            .cloned()
            .collect();
        policies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(policies)
    }

    async fn create_or_update_policy(
        &self,
        policy: &ProtectionPolicyResource,
    ) -> Result<Submission<ProtectionPolicyResource>> {
        let mut stored = policy.clone();
        stored.id.get_or_insert_with(|| format!("/policies/{}", policy.name));
        let accept = {
            let mut inner = self.inner.lock().unwrap();
            inner.policies.insert(stored.name.clone(), stored.clone());
            inner.accept_policy_writes
        };
        if accept {
            Ok(Submission::Accepted(self.handle("create_or_update_policy")))
        } else {
            self.record("create_or_update_policy");
            Ok(Submission::Done(stored))
        }
    }

    async fn delete_policy(&self, name: &str) -> Result<Submission<()>> {
        let removed = self.inner.lock().unwrap().policies.remove(name);
        if removed.is_none() {
            return Err(VaultError::not_found(name.to_string()));
        }
        Ok(Submission::Accepted(self.handle("delete_policy")))
    }

    async fn list_containers(&self, query: &ContainerQuery) -> Result<Vec<ProtectionContainer>> {
        self.record("list_containers");
        let containers = self.inner.lock().unwrap().containers.clone();
        Ok(containers
            .into_iter()
            .filter(|c| c.container_type == query.container_type)
            .filter(|c| c.backup_management_type == query.backup_management_type)
            .filter(|c| {
                query
                    .name
                    .as_ref()
                    .is_none_or(|name| c.friendly_name.eq_ignore_ascii_case(name))
            })
            .collect())
    }

    async fn provision_ilr_access(
        &self,
        _item: &ItemRef,
        _recovery_point: &str,
    ) -> Result<OperationHandle> {
        Ok(self.handle("provision_ilr_access"))
    }

    async fn revoke_ilr_access(
        &self,
        _item: &ItemRef,
        _recovery_point: &str,
    ) -> Result<OperationHandle> {
        Ok(self.handle("revoke_ilr_access"))
    }

    async fn get_ilr_script(&self, handle: &OperationHandle) -> Result<IlrScript> {
        self.record("get_ilr_script");
        self.inner
            .lock()
            .unwrap()
            .ilr_script
            .clone()
            .ok_or_else(|| VaultError::not_found(handle.operation_id().to_string()))
    }

    async fn get_operation_status(&self, _status_link: &str) -> Result<OperationStatusResponse> {
        self.record("get_operation_status");
        let next = self.inner.lock().unwrap().statuses.pop_front();
        Ok(next.unwrap_or_else(|| OperationStatusResponse::completed(None)))
    }

    async fn get_job(&self, job_id: &str) -> Result<Job> {
        self.record("get_job");
        self.inner
            .lock()
            .unwrap()
            .jobs
            .get(job_id)
            .cloned()
            .ok_or_else(|| VaultError::not_found(format!("作业 {job_id}")))
    }

    async fn cancel_job(&self, job_id: &str) -> Result<()> {
        self.record("cancel_job");
        let mut inner = self.inner.lock().unwrap();
        match inner.jobs.get_mut(job_id) {
            Some(job) => {
                job.status = "Cancelling".to_string();
                Ok(())
            }
            None => Err(VaultError::not_found(format!("作业 {job_id}"))),
        }
    }

    async fn get_classic_storage_account(&self, name: &str) -> Result<StorageAccount> {
        self.record("get_classic_storage_account");
        self.inner
            .lock()
            .unwrap()
            .classic_accounts
            .get(name)
            .cloned()
            .ok_or_else(|| VaultError::not_found(name.to_string()))
    }

    async fn get_storage_account(&self, name: &str) -> Result<StorageAccount> {
        self.record("get_storage_account");
        self.inner
            .lock()
            .unwrap()
            .compute_accounts
            .get(name)
            .cloned()
            .ok_or_else(|| VaultError::not_found(name.to_string()))
    }
}

/// 测试数据
pub(crate) mod fixtures {
    use crate::models::{
        BackupManagementType, Job, ProtectedItem, RecoveryPoint, StorageAccount, WorkloadType,
    };
    use chrono::{TimeZone, Utc};

    pub fn vm_item(name: &str) -> ProtectedItem {
        ProtectedItem {
            id: format!("/items/{name}"),
            name: format!("vm;iaasvmcontainerv2;rg1;{name}"),
            container_name: format!("iaasvmcontainer;iaasvmcontainerv2;rg1;{name}"),
            friendly_name: name.to_string(),
            workload_type: WorkloadType::AzureVm,
            backup_management_type: BackupManagementType::AzureVm,
            source_resource_id: Some(format!("/vms/{name}")),
            policy_id: None,
            protection_state: Some("Protected".to_string()),
            last_backup_time: None,
        }
    }

    pub fn recovery_point(name: &str, day: u32) -> RecoveryPoint {
        RecoveryPoint {
            id: format!("/recoveryPoints/{name}"),
            name: name.to_string(),
            recovery_point_type: "AppConsistent".to_string(),
            recovery_point_time: Utc.with_ymd_and_hms(2024, 3, day, 22, 30, 0).unwrap(),
            item_id: None,
        }
    }

    pub fn job(name: &str, status: &str) -> Job {
        Job {
            id: format!("/jobs/{name}"),
            name: name.to_string(),
            operation: "Backup".to_string(),
            status: status.to_string(),
            entity_friendly_name: None,
            backup_management_type: Some(BackupManagementType::AzureVm),
            start_time: None,
            end_time: None,
        }
    }

    pub fn storage_account(name: &str, kind: Option<&str>) -> StorageAccount {
        StorageAccount {
            id: format!("/storageAccounts/{name}"),
            name: name.to_string(),
            location: "eastus".to_string(),
            account_type: Some("Standard_LRS".to_string()),
            kind: kind.map(str::to_string),
        }
    }
}
