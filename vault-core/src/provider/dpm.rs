use super::common;
use super::params::ProviderData;
use super::{BackupProvider, ProviderKind};
use crate::client::BackupServiceClient;
use crate::error::Result;
use crate::models::{ProtectedItem, ProtectionContainer, RecoveryPoint};
use async_trait::async_trait;

/// DPM / Azure Backup Server Provider，只读
pub struct DpmProvider<'a> {
    data: ProviderData,
    client: &'a dyn BackupServiceClient,
}

impl<'a> DpmProvider<'a> {
    pub fn new(data: ProviderData, client: &'a dyn BackupServiceClient) -> Self {
        Self { data, client }
    }
}

#[async_trait]
impl<'a> BackupProvider for DpmProvider<'a> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Dpm
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
