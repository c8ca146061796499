use crate::constants::vm;
use crate::error::{Result, VaultError};
use crate::policy::{BackupSchedule, RetentionPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 保管库上下文，随策略一起传递但不归策略所有
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultContext {
    pub subscription_id: String,
    pub resource_group: String,
    pub vault_name: String,
    pub location: String,
}

/// 工作负载类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkloadType {
    #[serde(rename = "AzureVM")]
    AzureVm,
    #[serde(rename = "AzureSQLDatabase")]
    AzureSqlDatabase,
    FileFolder,
}

/// 备份管理类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackupManagementType {
    #[serde(rename = "AzureIaasVM", alias = "AzureVM")]
    AzureVm,
    AzureSql,
    #[serde(rename = "MAB", alias = "MARS")]
    Mab,
    #[serde(rename = "DPM")]
    Dpm,
    AzureBackupServer,
}

/// 容器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerType {
    #[serde(rename = "AzureVM", alias = "IaasVMContainer")]
    AzureVm,
    #[serde(rename = "AzureSQL", alias = "AzureSqlContainer")]
    AzureSql,
    Windows,
}

/// 容器注册状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerRegistrationStatus {
    Registered,
    NotRegistered,
    Registering,
}

impl WorkloadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadType::AzureVm => "AzureVM",
            WorkloadType::AzureSqlDatabase => "AzureSQLDatabase",
            WorkloadType::FileFolder => "FileFolder",
        }
    }

    /// 按管理类型推断工作负载
    pub fn from_management_type(management_type: BackupManagementType) -> Self {
        match management_type {
            BackupManagementType::AzureVm => WorkloadType::AzureVm,
            BackupManagementType::AzureSql => WorkloadType::AzureSqlDatabase,
            BackupManagementType::Mab
            | BackupManagementType::Dpm
            | BackupManagementType::AzureBackupServer => WorkloadType::FileFolder,
        }
    }
}

impl BackupManagementType {
    /// 服务端使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupManagementType::AzureVm => "AzureIaasVM",
            BackupManagementType::AzureSql => "AzureSql",
            BackupManagementType::Mab => "MAB",
            BackupManagementType::Dpm => "DPM",
            BackupManagementType::AzureBackupServer => "AzureBackupServer",
        }
    }
}

impl ContainerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerType::AzureVm => "AzureVM",
            ContainerType::AzureSql => "AzureSQL",
            ContainerType::Windows => "Windows",
        }
    }

    /// 服务端查询时使用的容器类型名称
    pub fn service_name(&self) -> &'static str {
        match self {
            ContainerType::AzureVm => "IaasVMContainer",
            ContainerType::AzureSql => "AzureSqlContainer",
            ContainerType::Windows => "Windows",
        }
    }
}

impl ContainerRegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerRegistrationStatus::Registered => "Registered",
            ContainerRegistrationStatus::NotRegistered => "NotRegistered",
            ContainerRegistrationStatus::Registering => "Registering",
        }
    }
}

macro_rules! display_from_str {
    ($ty:ident, $field:literal, [$($variant:ident => [$($alias:literal),+]),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = VaultError;

            fn from_str(s: &str) -> Result<Self> {
                let s = s.trim();
                $(
                    if [$($alias),+].iter().any(|alias| alias.eq_ignore_ascii_case(s)) {
                        return Ok($ty::$variant);
                    }
                )+
                Err(VaultError::invalid_argument($field, format!("无法识别的取值: {s}")))
            }
        }
    };
}

display_from_str!(WorkloadType, "WorkloadType", [
    AzureVm => ["AzureVM"],
    AzureSqlDatabase => ["AzureSQLDatabase", "AzureSQL"],
    FileFolder => ["FileFolder"],
]);

display_from_str!(BackupManagementType, "BackupManagementType", [
    AzureVm => ["AzureVM", "AzureIaasVM"],
    AzureSql => ["AzureSql", "AzureSQL"],
    Mab => ["MAB", "MARS"],
    Dpm => ["DPM"],
    AzureBackupServer => ["AzureBackupServer"],
]);

display_from_str!(ContainerType, "ContainerType", [
    AzureVm => ["AzureVM", "IaasVMContainer"],
    AzureSql => ["AzureSQL", "AzureSqlContainer"],
    Windows => ["Windows"],
]);

display_from_str!(ContainerRegistrationStatus, "Status", [
    Registered => ["Registered"],
    NotRegistered => ["NotRegistered"],
    Registering => ["Registering"],
]);

/// 保护策略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProtectionPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    pub name: String,
    pub workload_type: WorkloadType,
    pub backup_management_type: BackupManagementType,
    pub schedule: BackupSchedule,
    pub retention_policies: Vec<RetentionPolicy>,
}

/// 保护容器
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionContainer {
    pub id: String,
    pub name: String,
    pub friendly_name: String,
    pub container_type: ContainerType,
    pub backup_management_type: BackupManagementType,
    #[serde(default)]
    pub registration_status: Option<ContainerRegistrationStatus>,
    #[serde(default)]
    pub health_status: Option<String>,
}

impl ProtectionContainer {
    /// 从资源 ID 中解析资源组：/subscriptions/{s}/resourceGroups/{rg}/...
    pub fn resource_group(&self) -> Option<String> {
        resource_group_from_id(&self.id)
    }
}

/// 从 ARM 资源 ID 中提取资源组名称
pub fn resource_group_from_id(id: &str) -> Option<String> {
    let mut segments = id.split('/').filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        if segment.eq_ignore_ascii_case("resourceGroups") {
            return segments.next().map(str::to_string);
        }
    }
    None
}

/// 受保护项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedItem {
    pub id: String,
    pub name: String,
    pub container_name: String,
    pub friendly_name: String,
    pub workload_type: WorkloadType,
    pub backup_management_type: BackupManagementType,
    #[serde(default)]
    pub source_resource_id: Option<String>,
    #[serde(default)]
    pub policy_id: Option<String>,
    #[serde(default)]
    pub protection_state: Option<String>,
    #[serde(default)]
    pub last_backup_time: Option<DateTime<Utc>>,
}

impl ProtectedItem {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::new(&self.container_name, &self.name)
    }
}

/// 受保护项在服务端的定位信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub container_name: String,
    pub item_name: String,
}

impl ItemRef {
    pub fn new(container_name: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            container_name: container_name.into(),
            item_name: item_name.into(),
        }
    }

    /// 按容器名称区分经典与 Compute 虚拟机的资源类型
    pub fn vm_item_type(&self) -> &'static str {
        if self
            .container_name
            .to_ascii_lowercase()
            .starts_with(vm::CLASSIC_CONTAINER_PREFIX)
        {
            vm::CLASSIC_ITEM_TYPE
        } else {
            vm::COMPUTE_ITEM_TYPE
        }
    }
}

/// 恢复点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryPoint {
    pub id: String,
    pub name: String,
    pub recovery_point_type: String,
    pub recovery_point_time: DateTime<Utc>,
    #[serde(default)]
    pub item_id: Option<String>,
}

/// 备份作业
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub name: String,
    pub operation: String,
    pub status: String,
    #[serde(default)]
    pub entity_friendly_name: Option<String>,
    #[serde(default)]
    pub backup_management_type: Option<BackupManagementType>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// 异步操作句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    /// 操作名称，用于错误信息
    pub operation: String,
    pub status_link: String,
}

impl OperationHandle {
    pub fn new(operation: impl Into<String>, status_link: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status_link: status_link.into(),
        }
    }

    /// 状态链接最后一段即操作 ID
    pub fn operation_id(&self) -> &str {
        let path = self.status_link.split('?').next().unwrap_or_default();
        path.rsplit('/').next().unwrap_or_default()
    }
}

/// 操作状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    InProgress,
    #[serde(alias = "Succeeded")]
    Completed,
    #[serde(alias = "Canceled", alias = "Cancelled")]
    Failed,
}

/// 异步操作错误信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    pub code: String,
    pub message: String,
}

/// 状态链接的查询结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatusResponse {
    pub status: OperationStatus,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

impl OperationStatusResponse {
    pub fn in_progress() -> Self {
        Self {
            status: OperationStatus::InProgress,
            job_id: None,
            error: None,
        }
    }

    pub fn completed(job_id: Option<&str>) -> Self {
        Self {
            status: OperationStatus::Completed,
            job_id: job_id.map(str::to_string),
            error: None,
        }
    }

    pub fn failed(code: &str, message: &str) -> Self {
        Self {
            status: OperationStatus::Failed,
            job_id: None,
            error: Some(OperationError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// 存储账户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccount {
    pub id: String,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

impl StorageAccount {
    pub fn is_blob_storage(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|kind| kind.eq_ignore_ascii_case("BlobStorage"))
    }
}

/// 文件级恢复脚本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IlrScript {
    pub script_content: String,
    pub script_extension: String,
    #[serde(default)]
    pub os_type: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// 浏览恢复点的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IlrAction {
    Connect,
    Extend,
    Terminate,
}

impl FromStr for IlrAction {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "connect" => Ok(IlrAction::Connect),
            "extend" => Ok(IlrAction::Extend),
            "terminate" => Ok(IlrAction::Terminate),
            other => Err(VaultError::invalid_argument(
                "Action",
                format!("无法识别的动作: {other}"),
            )),
        }
    }
}

/// 恢复请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub recovery_point_id: String,
    pub source_resource_id: Option<String>,
    pub storage_account_id: String,
    pub region: String,
}

/// 恢复点时间范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryPointFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// 容器查询条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerQuery {
    pub container_type: ContainerType,
    pub backup_management_type: BackupManagementType,
    pub status: Option<ContainerRegistrationStatus>,
    pub name: Option<String>,
    pub resource_group: Option<String>,
}

/// 要保护的虚拟机
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmIdentity {
    pub name: String,
    pub location: VmLocation,
}

/// 经典虚拟机位于云服务中，Compute 虚拟机位于资源组中
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmLocation {
    Classic { service_name: String },
    Compute { resource_group: String },
}

impl VmLocation {
    /// 开启保护时提交的受保护项资源类型
    pub fn protected_item_type(&self) -> &'static str {
        match self {
            VmLocation::Classic { .. } => vm::CLASSIC_ITEM_TYPE,
            VmLocation::Compute { .. } => vm::COMPUTE_ITEM_TYPE,
        }
    }
}

impl VmIdentity {
    /// 服务端使用的容器名称
    pub fn container_name(&self) -> String {
        match &self.location {
            VmLocation::Classic { service_name } => {
                format!("iaasvmcontainer;iaasvmcontainer;{};{}", service_name, self.name)
            }
            VmLocation::Compute { resource_group } => {
                format!("iaasvmcontainer;iaasvmcontainerv2;{};{}", resource_group, self.name)
            }
        }
    }

    pub fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.container_name(), self.item_name())
    }

    /// 服务端使用的受保护项名称
    pub fn item_name(&self) -> String {
        match &self.location {
            VmLocation::Classic { service_name } => {
                format!("vm;iaasvmcontainer;{};{}", service_name, self.name)
            }
            VmLocation::Compute { resource_group } => {
                format!("vm;iaasvmcontainerv2;{};{}", resource_group, self.name)
            }
        }
    }
}
