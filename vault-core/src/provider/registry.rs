use super::params::ProviderData;
use super::{DpmProvider, IaasVmProvider, MabProvider, ProviderHandle, ProviderKind, SqlProvider};
use crate::client::BackupServiceClient;
use crate::error::{Result, VaultError};
use crate::models::{BackupManagementType, ContainerType, WorkloadType};
use tracing::debug;

/// 按 (工作负载, 管理类型) 选择 Provider 种类
///
/// FileFolder 必须显式给出管理类型，否则无法在 MARS 与 DPM 之间选择。
pub fn provider_kind(
    workload: WorkloadType,
    management_type: Option<BackupManagementType>,
) -> Result<ProviderKind> {
    use BackupManagementType as Mgmt;

    match (workload, management_type) {
        (WorkloadType::AzureVm, None | Some(Mgmt::AzureVm)) => Ok(ProviderKind::IaasVm),
        (WorkloadType::AzureSqlDatabase, None | Some(Mgmt::AzureSql)) => {
            Ok(ProviderKind::AzureSql)
        }
        (WorkloadType::FileFolder, Some(Mgmt::Mab)) => Ok(ProviderKind::Mab),
        (WorkloadType::FileFolder, Some(Mgmt::Dpm | Mgmt::AzureBackupServer)) => {
            Ok(ProviderKind::Dpm)
        }
        (WorkloadType::FileFolder, None) => Err(VaultError::not_supported(
            "FileFolder 工作负载需要指定管理类型 (MAB / DPM / AzureBackupServer)",
        )),
        (workload, Some(mgmt)) => Err(VaultError::not_supported(format!(
            "工作负载 {workload} 不支持管理类型 {mgmt}"
        ))),
    }
}

/// 构造 Provider
pub fn get_provider<'a>(
    workload: WorkloadType,
    management_type: Option<BackupManagementType>,
    data: ProviderData,
    client: &'a dyn BackupServiceClient,
) -> Result<ProviderHandle<'a>> {
    let kind = provider_kind(workload, management_type)?;
    debug!("选择 {} Provider (工作负载: {})", kind, workload);

    let handle = match kind {
        ProviderKind::IaasVm => ProviderHandle::IaasVm(IaasVmProvider::new(data, client)),
        ProviderKind::AzureSql => ProviderHandle::AzureSql(SqlProvider::new(data, client)),
        ProviderKind::Dpm => ProviderHandle::Dpm(DpmProvider::new(data, client)),
        ProviderKind::Mab => ProviderHandle::Mab(MabProvider::new(data, client)),
    };
    Ok(handle)
}

/// 按容器类型构造 Provider
pub fn get_provider_for_container<'a>(
    container_type: ContainerType,
    management_type: Option<BackupManagementType>,
    data: ProviderData,
    client: &'a dyn BackupServiceClient,
) -> Result<ProviderHandle<'a>> {
    let workload = match container_type {
        ContainerType::AzureVm => WorkloadType::AzureVm,
        ContainerType::AzureSql => WorkloadType::AzureSqlDatabase,
        ContainerType::Windows => WorkloadType::FileFolder,
    };
    get_provider(workload, management_type, data, client)
}
