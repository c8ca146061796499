use super::common;
use super::params::ProviderData;
use super::{BackupProvider, ProviderKind};
use crate::client::{BackupServiceClient, Submission};
use crate::error::Result;
use crate::models::{
    BackupManagementType, OperationHandle, ProtectedItem, ProtectionContainer, ProtectionPolicy,
    RecoveryPoint,
};
use crate::policy::wire::ProtectionPolicyResource;
use crate::policy::{BackupSchedule, RetentionPolicy};
use async_trait::async_trait;

const MANAGEMENT_TYPES: &[BackupManagementType] = &[BackupManagementType::AzureSql];

/// Azure SQL 数据库 Provider
///
/// 数据库备份由服务端发起，不支持按需备份、恢复和文件级恢复。
pub struct SqlProvider<'a> {
    data: ProviderData,
    client: &'a dyn BackupServiceClient,
}

impl<'a> SqlProvider<'a> {
    pub fn new(data: ProviderData, client: &'a dyn BackupServiceClient) -> Self {
        Self { data, client }
    }
}

#[async_trait]
impl<'a> BackupProvider for SqlProvider<'a> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::AzureSql
    }

    async fn disable_protection(&self) -> Result<OperationHandle> {
        common::disable_protection(&self.data, self.client).await
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
}
