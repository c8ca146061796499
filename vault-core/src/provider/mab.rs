use super::common;
use super::params::ProviderData;
use super::{BackupProvider, ProviderKind};
use crate::client::BackupServiceClient;
use crate::error::Result;
use crate::models::{OperationHandle, ProtectedItem, ProtectionContainer, RecoveryPoint};
use async_trait::async_trait;

/// MARS 代理 Provider
pub struct MabProvider<'a> {
    data: ProviderData,
    client: &'a dyn BackupServiceClient,
}

impl<'a> MabProvider<'a> {
    pub fn new(data: ProviderData, client: &'a dyn BackupServiceClient) -> Self {
        Self { data, client }
    }
}

#[async_trait]
impl<'a> BackupProvider for MabProvider<'a> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mab
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

    async fn list_protection_containers(&self) -> Result<Vec<ProtectionContainer>> {
        common::list_containers(&self.data, self.client).await
    }
}
