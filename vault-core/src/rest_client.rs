use crate::client::{BackupServiceClient, ProtectionRequest, Submission};
use crate::config::AppConfig;
use crate::constants::api::http;
use crate::endpoints::ApiEndpoints;
use crate::error::{Result, VaultError};
use crate::models::{
    BackupManagementType, ContainerQuery, IlrScript, ItemRef, Job, OperationHandle,
    OperationStatusResponse, ProtectedItem, ProtectionContainer, RecoveryPoint,
    RecoveryPointFilter, RestoreRequest, StorageAccount,
};
use crate::policy::wire::ProtectionPolicyResource;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// 列表响应
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    value: Vec<Value>,
    #[serde(rename = "nextLink", default)]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CloudError {
    error: Option<CloudErrorBody>,
}

#[derive(Debug, Deserialize)]
struct CloudErrorBody {
    code: String,
    message: String,
}

/// 基于 reqwest 的备份服务客户端
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    endpoints: ApiEndpoints,
    access_token: Option<String>,
}

impl RestClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.ensure_vault_identity()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(http::DEFAULT_TIMEOUT))
            .user_agent(http::USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoints: ApiEndpoints::from_config(&config.service),
            access_token: config.access_token(),
        })
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// 构建请求，附带追踪 ID 和访问令牌
    fn build_request(&self, method: Method, url: Url) -> RequestBuilder {
        let request_id = format!("{}{}", uuid::Uuid::new_v4(), http::CLIENT_REQUEST_ID_SUFFIX);
        debug!("{} {} ({})", method, url, request_id);

        let mut request = self
            .client
            .request(method, url)
            .header(http::CLIENT_REQUEST_ID_HEADER, request_id);
        if let Some(ref token) = self.access_token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// 发送请求，非 2xx 转为错误
    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            debug!("{}: 资源不存在 - {}", action, text);
            return Err(VaultError::not_found(action.to_string()));
        }

        error!("{}失败: {} - {}", action, status, text);
        let (code, message) = match serde_json::from_str::<CloudError>(&text) {
            Ok(CloudError {
                error: Some(body),
            }) => (body.code, body.message),
            _ => (status.as_str().to_string(), text),
        };
        Err(VaultError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn get_value(&self, url: Url, action: &str) -> Result<Value> {
        let response = self.send(self.build_request(Method::GET, url), action).await?;
        Ok(response.json().await?)
    }

    async fn get_resource<T: DeserializeOwned>(&self, url: Url, action: &str) -> Result<T> {
        let value = self.get_value(url, action).await?;
        Ok(serde_json::from_value(flatten_resource(value))?)
    }

    /// 按 nextLink 读取所有分页
    async fn list_values(&self, url: Url, action: &str) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            let page: ListResponse = serde_json::from_value(self.get_value(url, action).await?)?;
            values.extend(page.value);
            if let Some(link) = page.next_link {
                next = Some(Url::parse(&link)?);
            }
        }
        debug!("{}: 共 {} 条", action, values.len());
        Ok(values)
    }

    async fn list_resources<T: DeserializeOwned>(&self, url: Url, action: &str) -> Result<Vec<T>> {
        self.list_values(url, action)
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(flatten_resource(value)).map_err(VaultError::from))
            .collect()
    }

    /// 提交异步操作，从响应头读取状态链接
    async fn submit(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        operation: &str,
    ) -> Result<OperationHandle> {
        let mut request = self.build_request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = self.send(request, operation).await?;
        let handle = async_handle(response.headers(), operation)?;
        info!("已提交 {}，操作 ID: {}", operation, handle.operation_id());
        Ok(handle)
    }

    async fn find_storage_account(&self, url: Url, name: &str, action: &str) -> Result<StorageAccount> {
        let accounts = self.list_values(url, action).await?;
        accounts
            .iter()
            .find(|account| {
                account
                    .get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .map(storage_account_from_value)
            .transpose()?
            .ok_or_else(|| VaultError::not_found(format!("存储账户 {name}")))
    }
}

/// 把 ARM 资源的 properties 合并到顶层，顶层字段优先
pub fn flatten_resource(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            if let Some(Value::Object(properties)) = map.remove("properties") {
                for (key, field) in properties {
                    map.entry(key).or_insert(field);
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// 资源 ID 中某一段之后的名称
fn segment_after<'a>(id: &'a str, segment: &str) -> Option<&'a str> {
    let mut parts = id.split('/');
    parts.find(|part| part.eq_ignore_ascii_case(segment))?;
    parts.next()
}

/// 异步操作状态链接只取 Azure-AsyncOperation
///
/// Location 头指向的结果端点在完成前返回 202 空响应，不能当作状态链接轮询。
pub fn async_handle(headers: &HeaderMap, operation: &str) -> Result<OperationHandle> {
    headers
        .get(http::ASYNC_OPERATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|link| OperationHandle::new(operation, link))
        .ok_or_else(|| VaultError::invalid_response(format!("{operation} 响应缺少状态链接")))
}

/// 构建 OData 过滤条件：a eq 'b' and c eq 'd'
pub fn odata_filter(conditions: &[(&str, String)]) -> Option<String> {
    if conditions.is_empty() {
        return None;
    }
    Some(
        conditions
            .iter()
            .map(|(key, value)| format!("{key} eq '{}'", value.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(" and "),
    )
}

fn with_filter(mut url: Url, conditions: &[(&str, String)]) -> Url {
    if let Some(filter) = odata_filter(conditions) {
        url.query_pairs_mut().append_pair("$filter", &filter);
    }
    url
}

fn storage_account_from_value(value: &Value) -> Result<StorageAccount> {
    let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    let id = field("id").ok_or_else(|| VaultError::invalid_response("存储账户缺少 id"))?;
    let name = field("name").ok_or_else(|| VaultError::invalid_response("存储账户缺少 name"))?;
    let account_type = value
        .pointer("/properties/accountType")
        .or_else(|| value.pointer("/sku/name"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(StorageAccount {
        id,
        name,
        location: field("location").unwrap_or_default(),
        account_type,
        kind: field("kind"),
    })
}

/// 受保护项的容器名称从资源 ID 中解析
fn with_container_name(mut value: Value) -> Value {
    let container = value
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| segment_after(id, "protectionContainers"))
        .map(str::to_string);
    if let (Some(container), Value::Object(map)) = (container, &mut value) {
        map.insert("containerName".to_string(), Value::String(container));
    }
    value
}

fn time_filter(filter: &RecoveryPointFilter) -> Vec<(&'static str, String)> {
    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
    let mut conditions = Vec::new();
    if let Some(start) = filter.start {
        conditions.push(("startDate", start.format(FORMAT).to_string()));
    }
    if let Some(end) = filter.end {
        conditions.push(("endDate", end.format(FORMAT).to_string()));
    }
    conditions
}

#[async_trait]
impl BackupServiceClient for RestClient {
    async fn configure_protection(
        &self,
        item: &ItemRef,
        request: &ProtectionRequest,
    ) -> Result<OperationHandle> {
        let body = json!({
            "properties": {
                "protectedItemType": request.protected_item_type,
                "policyId": request.policy_id,
                "sourceResourceId": request.source_resource_id,
            }
        });
        self.submit(
            Method::PUT,
            self.endpoints.protected_item_url(item)?,
            Some(body),
            "ConfigureProtection",
        )
        .await
    }

    async fn remove_protection(&self, item: &ItemRef) -> Result<OperationHandle> {
        self.submit(
            Method::DELETE,
            self.endpoints.protected_item_url(item)?,
            None,
            "DisableProtection",
        )
        .await
    }

    async fn trigger_backup(&self, item: &ItemRef) -> Result<OperationHandle> {
        let body = json!({ "properties": { "objectType": "IaasVMBackupRequest" } });
        self.submit(
            Method::POST,
            self.endpoints.backup_url(item)?,
            Some(body),
            "TriggerBackup",
        )
        .await
    }

    async fn trigger_restore(
        &self,
        item: &ItemRef,
        request: &RestoreRequest,
    ) -> Result<OperationHandle> {
        let body = json!({
            "properties": {
                "objectType": "IaasVMRestoreRequest",
                "recoveryPointId": request.recovery_point_id,
                "recoveryType": "RestoreDisks",
                "sourceResourceId": request.source_resource_id,
                "storageAccountId": request.storage_account_id,
                "region": request.region,
            }
        });
        self.submit(
            Method::POST,
            self.endpoints.restore_url(item, &request.recovery_point_id)?,
            Some(body),
            "TriggerRestore",
        )
        .await
    }

    async fn get_protected_item(&self, item: &ItemRef) -> Result<ProtectedItem> {
        let value = self
            .get_value(self.endpoints.protected_item_url(item)?, "获取受保护项")
            .await?;
        Ok(serde_json::from_value(with_container_name(flatten_resource(value)))?)
    }

    async fn list_recovery_points(
        &self,
        item: &ItemRef,
        filter: &RecoveryPointFilter,
    ) -> Result<Vec<RecoveryPoint>> {
        let url = with_filter(self.endpoints.recovery_points_url(item)?, &time_filter(filter));
        self.list_resources(url, "列出恢复点").await
    }

    async fn get_recovery_point(
        &self,
        item: &ItemRef,
        recovery_point: &str,
    ) -> Result<RecoveryPoint> {
        self.get_resource(
            self.endpoints.recovery_point_url(item, recovery_point)?,
            "获取恢复点",
        )
        .await
    }

    async fn get_policy(&self, name: &str) -> Result<ProtectionPolicyResource> {
        let value = self
            .get_value(self.endpoints.policy_url(name)?, "获取保护策略")
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn list_policies(
        &self,
        management_type: Option<BackupManagementType>,
    ) -> Result<Vec<ProtectionPolicyResource>> {
        let conditions: Vec<(&str, String)> = management_type
            .map(|mgmt| ("backupManagementType", mgmt.as_str().to_string()))
            .into_iter()
            .collect();
        let url = with_filter(self.endpoints.policies_url()?, &conditions);
        self.list_values(url, "列出保护策略")
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(VaultError::from))
            .collect()
    }

    async fn create_or_update_policy(
        &self,
        policy: &ProtectionPolicyResource,
    ) -> Result<Submission<ProtectionPolicyResource>> {
        let request = self
            .build_request(Method::PUT, self.endpoints.policy_url(&policy.name)?)
            .json(policy);
        let response = self.send(request, "提交保护策略").await?;

        if response.status() == StatusCode::ACCEPTED {
            return Ok(Submission::Accepted(async_handle(
                response.headers(),
                "CreateOrUpdatePolicy",
            )?));
        }
        Ok(Submission::Done(response.json().await?))
    }

    async fn delete_policy(&self, name: &str) -> Result<Submission<()>> {
        let request = self.build_request(Method::DELETE, self.endpoints.policy_url(name)?);
        let response = self.send(request, "删除保护策略").await?;

        if response.status() == StatusCode::ACCEPTED {
            return Ok(Submission::Accepted(async_handle(
                response.headers(),
                "DeletePolicy",
            )?));
        }
        Ok(Submission::Done(()))
    }

    async fn list_containers(&self, query: &ContainerQuery) -> Result<Vec<ProtectionContainer>> {
        let mut conditions = vec![(
            "backupManagementType",
            query.backup_management_type.as_str().to_string(),
        )];
        if let Some(status) = query.status {
            conditions.push(("status", status.as_str().to_string()));
        }
        if let Some(ref name) = query.name {
            conditions.push(("friendlyName", name.clone()));
        }

        let url = with_filter(self.endpoints.containers_url()?, &conditions);
        let containers: Vec<ProtectionContainer> = self.list_resources(url, "列出保护容器").await?;
        Ok(containers
            .into_iter()
            .filter(|container| container.container_type == query.container_type)
            .collect())
    }

    async fn provision_ilr_access(
        &self,
        item: &ItemRef,
        recovery_point: &str,
    ) -> Result<OperationHandle> {
        let body = json!({
            "properties": {
                "objectType": "IaasVMILRRegistrationRequest",
                "recoveryPointId": recovery_point,
                "renewExistingRegistration": false,
            }
        });
        self.submit(
            Method::POST,
            self.endpoints.provision_ilr_url(item, recovery_point)?,
            Some(body),
            "ProvisionItemLevelRecoveryAccess",
        )
        .await
    }

    async fn revoke_ilr_access(
        &self,
        item: &ItemRef,
        recovery_point: &str,
    ) -> Result<OperationHandle> {
        self.submit(
            Method::POST,
            self.endpoints.revoke_ilr_url(item, recovery_point)?,
            None,
            "RevokeItemLevelRecoveryAccess",
        )
        .await
    }

    async fn get_ilr_script(&self, handle: &OperationHandle) -> Result<IlrScript> {
        let value = flatten_resource(
            self.get_value(Url::parse(&handle.status_link)?, "获取挂载脚本")
                .await?,
        );
        let script = value
            .pointer("/clientScripts/0")
            .cloned()
            .unwrap_or(value);
        Ok(serde_json::from_value(script)?)
    }

    async fn get_operation_status(&self, status_link: &str) -> Result<OperationStatusResponse> {
        let value = self
            .get_value(Url::parse(status_link)?, "查询操作状态")
            .await?;
        Ok(serde_json::from_value(flatten_resource(value))?)
    }

    async fn get_job(&self, job_id: &str) -> Result<Job> {
        self.get_resource(self.endpoints.job_url(job_id)?, "获取作业")
            .await
    }

    async fn cancel_job(&self, job_id: &str) -> Result<()> {
        let request = self.build_request(Method::POST, self.endpoints.cancel_job_url(job_id)?);
        self.send(request, "取消作业").await?;
        Ok(())
    }

    async fn get_classic_storage_account(&self, name: &str) -> Result<StorageAccount> {
        self.find_storage_account(
            self.endpoints.classic_storage_accounts_url()?,
            name,
            "查询经典存储账户",
        )
        .await
    }

    async fn get_storage_account(&self, name: &str) -> Result<StorageAccount> {
        self.find_storage_account(self.endpoints.storage_accounts_url()?, name, "查询存储账户")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OperationStatus;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_odata_filter() {
        assert_eq!(odata_filter(&[]), None);
        assert_eq!(
            odata_filter(&[
                ("backupManagementType", "AzureIaasVM".to_string()),
                ("friendlyName", "o'neil".to_string()),
            ])
            .unwrap(),
            "backupManagementType eq 'AzureIaasVM' and friendlyName eq 'o''neil'"
        );
    }

    #[test]
    fn test_flatten_resource_keeps_top_level() {
        let value = json!({
            "id": "/jobs/j1",
            "name": "j1",
            "properties": { "name": "ignored", "operation": "Backup", "status": "Completed" }
        });
        let job: Job = serde_json::from_value(flatten_resource(value)).unwrap();
        assert_eq!(job.name, "j1");
        assert_eq!(job.operation, "Backup");
    }

    #[test]
    fn test_operation_status_from_arm_response() {
        let value = json!({
            "id": "op1",
            "status": "Succeeded",
            "properties": { "jobId": "job-7" }
        });
        let status: OperationStatusResponse = serde_json::from_value(flatten_resource(value)).unwrap();
        assert_eq!(status.status, OperationStatus::Completed);
        assert_eq!(status.job_id.as_deref(), Some("job-7"));
    }

    #[test]
    fn test_async_handle_ignores_location_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Location",
            HeaderValue::from_static("https://status/location/op-2"),
        );
        let err = async_handle(&headers, "TriggerBackup").unwrap_err();
        assert!(matches!(err, VaultError::InvalidResponse(_)));

        headers.insert(
            http::ASYNC_OPERATION_HEADER,
            HeaderValue::from_static("https://status/async/op-1?api-version=2016-06-01"),
        );
        let handle = async_handle(&headers, "TriggerBackup").unwrap();
        assert_eq!(handle.operation_id(), "op-1");
        assert_eq!(
            handle.status_link,
            "https://status/async/op-1?api-version=2016-06-01"
        );
    }

    #[test]
    fn test_container_name_from_item_id() {
        let value = json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.RecoveryServices/vaults/v/backupFabrics/Azure/protectionContainers/iaasvmcontainer;iaasvmcontainerv2;rg;web01/protectedItems/vm;iaasvmcontainerv2;rg;web01",
            "name": "vm;iaasvmcontainerv2;rg;web01",
            "properties": {
                "friendlyName": "web01",
                "workloadType": "AzureVM",
                "backupManagementType": "AzureIaasVM"
            }
        });
        let item: ProtectedItem =
            serde_json::from_value(with_container_name(flatten_resource(value))).unwrap();
        assert_eq!(item.container_name, "iaasvmcontainer;iaasvmcontainerv2;rg;web01");
        assert_eq!(item.friendly_name, "web01");
    }

    #[test]
    fn test_storage_account_from_value() {
        let value = json!({
            "id": "/storageAccounts/staging",
            "name": "staging",
            "location": "eastus",
            "kind": "BlobStorage",
            "sku": { "name": "Standard_LRS" }
        });
        let account = storage_account_from_value(&value).unwrap();
        assert!(account.is_blob_storage());
        assert_eq!(account.account_type.as_deref(), Some("Standard_LRS"));
    }

    #[test]
    fn test_new_requires_vault_identity() {
        let err = RestClient::new(&AppConfig::default()).unwrap_err();
        assert!(matches!(err, VaultError::InvalidConfig(_)));
    }
}
