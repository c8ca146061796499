use super::common;
use super::params::ProviderData;
use super::{BackupProvider, ProviderKind};
use crate::client::{BackupServiceClient, ProtectionRequest, Submission};
use crate::error::{Result, VaultError};
use crate::models::{
    BackupManagementType, IlrAction, OperationHandle, ProtectedItem, ProtectionContainer,
    ProtectionPolicy, RecoveryPoint, RestoreRequest,
};
use crate::policy::wire::ProtectionPolicyResource;
use crate::policy::{BackupSchedule, RetentionPolicy};
use async_trait::async_trait;
use tracing::info;

const MANAGEMENT_TYPES: &[BackupManagementType] = &[BackupManagementType::AzureVm];

/// Azure 虚拟机 Provider，支持全部操作
pub struct IaasVmProvider<'a> {
    data: ProviderData,
    client: &'a dyn BackupServiceClient,
}

impl<'a> IaasVmProvider<'a> {
    pub fn new(data: ProviderData, client: &'a dyn BackupServiceClient) -> Self {
        Self { data, client }
    }

    fn policy_for_protection(&self) -> Result<(&ProtectionPolicy, String)> {
        let policy = self.data.policy()?;
        let policy_id = policy.policy_id.clone().ok_or_else(|| {
            VaultError::invalid_argument("Policy", format!("策略 {} 缺少 ID", policy.name))
        })?;
        if !MANAGEMENT_TYPES.contains(&policy.backup_management_type) {
            return Err(VaultError::invalid_argument(
                "Policy",
                format!(
                    "策略 {} 的管理类型为 {}，不能用于虚拟机",
                    policy.name, policy.backup_management_type
                ),
            ));
        }
        Ok((policy, policy_id))
    }
}

#[async_trait]
impl<'a> BackupProvider for IaasVmProvider<'a> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::IaasVm
    }

    /// 已有受保护项时修改其策略，否则按虚拟机名称开启保护
    async fn enable_protection(&self) -> Result<OperationHandle> {
        let (policy, policy_id) = self.policy_for_protection()?;

        let (item_ref, source_resource_id, item_type) = match self.data.item_opt() {
            Some(item) => {
                let item_ref = item.item_ref();
                let item_type = item_ref.vm_item_type();
                (item_ref, item.source_resource_id.clone(), item_type)
            }
            None => {
                let vm = self.data.vm()?;
                (vm.item_ref(), None, vm.location.protected_item_type())
            }
        };

        info!(
            "为 {} 开启保护，使用策略 {}",
            item_ref.item_name, policy.name
        );
        let request = ProtectionRequest {
            protected_item_type: item_type.to_string(),
            policy_id,
            source_resource_id,
        };
        self.client.configure_protection(&item_ref, &request).await
    }

    async fn disable_protection(&self) -> Result<OperationHandle> {
        common::disable_protection(&self.data, self.client).await
    }

    async fn trigger_backup(&self) -> Result<OperationHandle> {
        let item = self.data.item()?;
        info!("触发备份: {}", item.friendly_name);
        self.client.trigger_backup(&item.item_ref()).await
    }

    async fn trigger_restore(&self) -> Result<OperationHandle> {
        let item = self.data.item()?;
        let recovery_point = self.data.recovery_point()?;
        let storage_account = self.data.storage_account()?;

        let request = RestoreRequest {
            recovery_point_id: recovery_point.name.clone(),
            source_resource_id: item.source_resource_id.clone(),
            storage_account_id: storage_account.id.clone(),
            region: storage_account.location.clone(),
        };
        info!(
            "从恢复点 {} 恢复 {}，暂存存储账户 {}",
            recovery_point.name, item.friendly_name, storage_account.name
        );
        self.client.trigger_restore(&item.item_ref(), &request).await
    }

    async fn get_protected_item(&self) -> Result<ProtectedItem> {
        common::get_protected_item(&self.data, self.client).await
    }

    async fn get_recovery_point_details(&self) -> Result<RecoveryPoint> {
        common::get_recovery_point(&self.data, self.client).await
    }

    async fn list_recovery_points(&self) -> Result<Vec<RecoveryPoint>> {
        common::list_recovery_points(&self.data, self.client).await
    }

    async fn create_policy(&self) -> Result<Submission<ProtectionPolicyResource>> {
        common::create_policy(&self.data, self.client, MANAGEMENT_TYPES).await
    }

    async fn modify_policy(&self) -> Result<Submission<ProtectionPolicyResource>> {
        common::modify_policy(&self.data, self.client, MANAGEMENT_TYPES).await
    }

    async fn get_policy(&self) -> Result<ProtectionPolicy> {
        common::get_policy(&self.data, self.client).await
    }

    async fn delete_policy(&self) -> Result<Submission<()>> {
        common::delete_policy(&self.data, self.client).await
    }

    async fn list_protection_containers(&self) -> Result<Vec<ProtectionContainer>> {
        common::list_containers(&self.data, self.client).await
    }

    fn get_default_schedule_policy_object(&self) -> Result<BackupSchedule> {
        Ok(common::default_schedule_object())
    }

    fn get_default_retention_policy_object(&self) -> Result<Vec<RetentionPolicy>> {
        Ok(common::default_retention_object(self.kind()))
    }

    async fn provision_item_level_recovery_access(&self) -> Result<OperationHandle> {
        let item_ref = self.data.item_ref()?;
        let recovery_point = self.data.recovery_point_id()?;
        info!("申请恢复点 {} 的文件级恢复访问", recovery_point);
        self.client
            .provision_ilr_access(&item_ref, recovery_point)
            .await
    }

    async fn revoke_item_level_recovery_access(&self) -> Result<OperationHandle> {
        let item_ref = self.data.item_ref()?;
        let recovery_point = self.data.recovery_point_id()?;
        info!("撤销恢复点 {} 的文件级恢复访问", recovery_point);
        self.client.revoke_ilr_access(&item_ref, recovery_point).await
    }

    async fn explore_recovery_point(&self) -> Result<OperationHandle> {
        match self.data.ilr_action()? {
            IlrAction::Connect | IlrAction::Extend => {
                self.provision_item_level_recovery_access().await
            }
            IlrAction::Terminate => self.revoke_item_level_recovery_access().await,
        }
    }
}
