use crate::error::Result;
use crate::models::{
    BackupManagementType, ContainerQuery, IlrScript, ItemRef, Job, OperationHandle,
    OperationStatusResponse, ProtectedItem, ProtectionContainer, RecoveryPoint,
    RecoveryPointFilter, RestoreRequest, StorageAccount,
};
use crate::policy::wire::ProtectionPolicyResource;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 提交结果：服务端可能同步返回结果，也可能返回异步操作句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<T> {
    Done(T),
    Accepted(OperationHandle),
}

/// 开启保护的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionRequest {
    /// 经典虚拟机为 Microsoft.ClassicCompute/virtualMachines
    pub protected_item_type: String,
    pub policy_id: String,
    #[serde(default)]
    pub source_resource_id: Option<String>,
}

/// 备份服务传输层
///
/// 所有方法在网络失败时返回 `Transport`，资源不存在时返回 `NotFound`。
#[async_trait]
pub trait BackupServiceClient: Send + Sync {
    async fn configure_protection(
        &self,
        item: &ItemRef,
        request: &ProtectionRequest,
    ) -> Result<OperationHandle>;

    async fn remove_protection(&self, item: &ItemRef) -> Result<OperationHandle>;

    async fn trigger_backup(&self, item: &ItemRef) -> Result<OperationHandle>;

    async fn trigger_restore(
        &self,
        item: &ItemRef,
        request: &RestoreRequest,
    ) -> Result<OperationHandle>;

    async fn get_protected_item(&self, item: &ItemRef) -> Result<ProtectedItem>;

    async fn list_recovery_points(
        &self,
        item: &ItemRef,
        filter: &RecoveryPointFilter,
    ) -> Result<Vec<RecoveryPoint>>;

    async fn get_recovery_point(&self, item: &ItemRef, recovery_point: &str)
    -> Result<RecoveryPoint>;

    async fn get_policy(&self, name: &str) -> Result<ProtectionPolicyResource>;

    async fn list_policies(
        &self,
        management_type: Option<BackupManagementType>,
    ) -> Result<Vec<ProtectionPolicyResource>>;

    async fn create_or_update_policy(
        &self,
        policy: &ProtectionPolicyResource,
    ) -> Result<Submission<ProtectionPolicyResource>>;

    async fn delete_policy(&self, name: &str) -> Result<Submission<()>>;

    async fn list_containers(&self, query: &ContainerQuery) -> Result<Vec<ProtectionContainer>>;

    async fn provision_ilr_access(
        &self,
        item: &ItemRef,
        recovery_point: &str,
    ) -> Result<OperationHandle>;

    async fn revoke_ilr_access(&self, item: &ItemRef, recovery_point: &str)
    -> Result<OperationHandle>;

    /// 读取已完成的文件级恢复操作生成的脚本
    async fn get_ilr_script(&self, handle: &OperationHandle) -> Result<IlrScript>;

    async fn get_operation_status(&self, status_link: &str) -> Result<OperationStatusResponse>;

    async fn get_job(&self, job_id: &str) -> Result<Job>;

    async fn cancel_job(&self, job_id: &str) -> Result<()>;

    async fn get_classic_storage_account(&self, name: &str) -> Result<StorageAccount>;

    async fn get_storage_account(&self, name: &str) -> Result<StorageAccount>;
}
