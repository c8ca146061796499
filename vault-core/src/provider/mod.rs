//! 备份 Provider
//!
//! 每种 (工作负载, 管理类型) 组合对应一个 Provider，
//! 所有 Provider 暴露同一组操作，不支持的操作直接返回 `NotSupported`。

mod common;
mod dpm;
mod iaasvm;
mod mab;
pub mod params;
pub mod registry;
mod sql;

pub use dpm::DpmProvider;
pub use iaasvm::IaasVmProvider;
pub use mab::MabProvider;
pub use params::{ParamKey, ParamValue, ProviderData};
pub use registry::{get_provider, get_provider_for_container, provider_kind};
pub use sql::SqlProvider;

use crate::client::Submission;
use crate::error::{Result, VaultError};
use crate::models::{OperationHandle, ProtectedItem, ProtectionContainer, ProtectionPolicy, RecoveryPoint};
use crate::policy::wire::ProtectionPolicyResource;
use crate::policy::{BackupSchedule, RetentionPolicy};
use async_trait::async_trait;
use std::fmt;
use std::ops::Deref;

/// Provider 操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderOperation {
    EnableProtection,
    DisableProtection,
    TriggerBackup,
    TriggerRestore,
    GetProtectedItem,
    GetRecoveryPointDetails,
    ListRecoveryPoints,
    CreatePolicy,
    ModifyPolicy,
    GetPolicy,
    DeletePolicy,
    ListProtectionContainers,
    GetDefaultSchedulePolicyObject,
    GetDefaultRetentionPolicyObject,
    ProvisionItemLevelRecoveryAccess,
    RevokeItemLevelRecoveryAccess,
    ExploreRecoveryPoint,
}

impl ProviderOperation {
    pub const ALL: [ProviderOperation; 17] = [
        ProviderOperation::EnableProtection,
        ProviderOperation::DisableProtection,
        ProviderOperation::TriggerBackup,
        ProviderOperation::TriggerRestore,
        ProviderOperation::GetProtectedItem,
        ProviderOperation::GetRecoveryPointDetails,
        ProviderOperation::ListRecoveryPoints,
        ProviderOperation::CreatePolicy,
        ProviderOperation::ModifyPolicy,
        ProviderOperation::GetPolicy,
        ProviderOperation::DeletePolicy,
        ProviderOperation::ListProtectionContainers,
        ProviderOperation::GetDefaultSchedulePolicyObject,
        ProviderOperation::GetDefaultRetentionPolicyObject,
        ProviderOperation::ProvisionItemLevelRecoveryAccess,
        ProviderOperation::RevokeItemLevelRecoveryAccess,
        ProviderOperation::ExploreRecoveryPoint,
    ];
}

impl fmt::Display for ProviderOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 已注册的 Provider 种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    IaasVm,
    AzureSql,
    Dpm,
    Mab,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::IaasVm,
        ProviderKind::AzureSql,
        ProviderKind::Dpm,
        ProviderKind::Mab,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::IaasVm => "IaasVm",
            ProviderKind::AzureSql => "AzureSql",
            ProviderKind::Dpm => "Dpm",
            ProviderKind::Mab => "Mab",
        }
    }

    /// 该 Provider 是否实现了指定操作
    pub fn supports(&self, operation: ProviderOperation) -> bool {
        use ProviderOperation::*;
        match self {
            ProviderKind::IaasVm => true,
            ProviderKind::AzureSql => matches!(
                operation,
                DisableProtection
                    | GetProtectedItem
                    | GetRecoveryPointDetails
                    | ListRecoveryPoints
                    | CreatePolicy
                    | ModifyPolicy
                    | GetPolicy
                    | DeletePolicy
                    | ListProtectionContainers
                    | GetDefaultSchedulePolicyObject
                    | GetDefaultRetentionPolicyObject
            ),
            ProviderKind::Dpm => matches!(
                operation,
                GetProtectedItem
                    | GetRecoveryPointDetails
                    | ListRecoveryPoints
                    | ListProtectionContainers
            ),
            ProviderKind::Mab => matches!(
                operation,
                DisableProtection
                    | GetProtectedItem
                    | GetRecoveryPointDetails
                    | ListRecoveryPoints
                    | ListProtectionContainers
            ),
        }
    }

    pub fn operations(&self) -> Vec<ProviderOperation> {
        ProviderOperation::ALL
            .into_iter()
            .filter(|op| self.supports(*op))
            .collect()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn unsupported(kind: ProviderKind, operation: ProviderOperation) -> VaultError {
    VaultError::not_supported(format!("{kind} Provider 不支持 {operation} 操作"))
}

/// Provider 统一操作集
///
/// 默认实现全部返回 `NotSupported`，各 Provider 只覆盖自己支持的操作。
#[async_trait]
pub trait BackupProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn enable_protection(&self) -> Result<OperationHandle> {
        Err(unsupported(self.kind(), ProviderOperation::EnableProtection))
    }

    async fn disable_protection(&self) -> Result<OperationHandle> {
        Err(unsupported(self.kind(), ProviderOperation::DisableProtection))
    }

    async fn trigger_backup(&self) -> Result<OperationHandle> {
        Err(unsupported(self.kind(), ProviderOperation::TriggerBackup))
    }

    async fn trigger_restore(&self) -> Result<OperationHandle> {
        Err(unsupported(self.kind(), ProviderOperation::TriggerRestore))
    }

    async fn get_protected_item(&self) -> Result<ProtectedItem> {
        Err(unsupported(self.kind(), ProviderOperation::GetProtectedItem))
    }

    async fn get_recovery_point_details(&self) -> Result<RecoveryPoint> {
        Err(unsupported(self.kind(), ProviderOperation::GetRecoveryPointDetails))
    }

    async fn list_recovery_points(&self) -> Result<Vec<RecoveryPoint>> {
        Err(unsupported(self.kind(), ProviderOperation::ListRecoveryPoints))
    }

    async fn create_policy(&self) -> Result<Submission<ProtectionPolicyResource>> {
        Err(unsupported(self.kind(), ProviderOperation::CreatePolicy))
    }

    async fn modify_policy(&self) -> Result<Submission<ProtectionPolicyResource>> {
        Err(unsupported(self.kind(), ProviderOperation::ModifyPolicy))
    }

    async fn get_policy(&self) -> Result<ProtectionPolicy> {
        Err(unsupported(self.kind(), ProviderOperation::GetPolicy))
    }

    async fn delete_policy(&self) -> Result<Submission<()>> {
        Err(unsupported(self.kind(), ProviderOperation::DeletePolicy))
    }

    async fn list_protection_containers(&self) -> Result<Vec<ProtectionContainer>> {
        Err(unsupported(self.kind(), ProviderOperation::ListProtectionContainers))
    }

    fn get_default_schedule_policy_object(&self) -> Result<BackupSchedule> {
        Err(unsupported(self.kind(), ProviderOperation::GetDefaultSchedulePolicyObject))
    }

    fn get_default_retention_policy_object(&self) -> Result<Vec<RetentionPolicy>> {
        Err(unsupported(self.kind(), ProviderOperation::GetDefaultRetentionPolicyObject))
    }

    async fn provision_item_level_recovery_access(&self) -> Result<OperationHandle> {
        Err(unsupported(self.kind(), ProviderOperation::ProvisionItemLevelRecoveryAccess))
    }

    async fn revoke_item_level_recovery_access(&self) -> Result<OperationHandle> {
        Err(unsupported(self.kind(), ProviderOperation::RevokeItemLevelRecoveryAccess))
    }

    async fn explore_recovery_point(&self) -> Result<OperationHandle> {
        Err(unsupported(self.kind(), ProviderOperation::ExploreRecoveryPoint))
    }
}

/// 注册表返回的 Provider，封闭的变体集合
pub enum ProviderHandle<'a> {
    IaasVm(IaasVmProvider<'a>),
    AzureSql(SqlProvider<'a>),
    Dpm(DpmProvider<'a>),
    Mab(MabProvider<'a>),
}

impl<'a> ProviderHandle<'a> {
    pub fn kind(&self) -> ProviderKind {
        self.deref().kind()
    }

    pub fn supports(&self, operation: ProviderOperation) -> bool {
        self.kind().supports(operation)
    }

    /// 在发起任何服务端调用前检查操作是否受支持
    pub fn ensure_supports(&self, operation: ProviderOperation) -> Result<()> {
        if self.supports(operation) {
            Ok(())
        } else {
            Err(unsupported(self.kind(), operation))
        }
    }
}

impl<'a> Deref for ProviderHandle<'a> {
    type Target = dyn BackupProvider + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            ProviderHandle::IaasVm(provider) => provider,
            ProviderHandle::AzureSql(provider) => provider,
            ProviderHandle::Dpm(provider) => provider,
            ProviderHandle::Mab(provider) => provider,
        }
    }
}

impl fmt::Debug for ProviderHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProviderHandle").field(&self.kind()).finish()
    }
}
