use crate::client::BackupServiceClient;
use crate::config::TrackingConfig;
use crate::constants::tracking::DEFAULT_POLL_INTERVAL_SECS;
use crate::error::{Result, VaultError};
use crate::models::{OperationHandle, OperationStatus, OperationStatusResponse};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 异步操作的终态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Completed { job_id: Option<String> },
    Failed { code: String, message: String },
}

impl OperationOutcome {
    /// 失败时转换为 `RemoteOperationFailed`
    pub fn into_job_id(self, operation: &str) -> Result<Option<String>> {
        match self {
            OperationOutcome::Completed { job_id } => Ok(job_id),
            OperationOutcome::Failed { code, message } => {
                Err(VaultError::remote_failed(operation, code, message))
            }
        }
    }
}

/// 跟踪结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedOperation {
    pub outcome: OperationOutcome,
    /// 实际查询状态的次数
    pub polls: u32,
}

impl TrackedOperation {
    /// 轮询之间的等待次数
    pub fn waits(&self) -> u32 {
        self.polls.saturating_sub(1)
    }
}

/// 异步操作跟踪器
///
/// 首次查询不等待；状态为 InProgress 时按固定间隔继续查询，
/// 直到进入终态、超时或被取消。
#[derive(Debug, Clone)]
pub struct OperationTracker {
    interval: Duration,
    timeout: Option<Duration>,
}

impl Default for OperationTracker {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS), None)
    }
}

impl OperationTracker {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        Self::new(config.poll_interval(), config.timeout())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 轮询 `status_link` 直到终态
    pub async fn track<F, Fut>(
        &self,
        status_link: &str,
        cancel: &CancellationToken,
        mut poll: F,
    ) -> Result<TrackedOperation>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<OperationStatusResponse>>,
    {
        let interval = self.interval;
        let poll_loop = async {
            let mut polls = 0u32;
            loop {
                let response = poll(status_link.to_string()).await?;
                polls += 1;

                match response.status {
                    OperationStatus::InProgress => {
                        debug!("操作进行中 (第 {} 次查询): {}", polls, status_link);
                    }
                    OperationStatus::Completed => {
                        return Ok(TrackedOperation {
                            outcome: OperationOutcome::Completed {
                                job_id: response.job_id,
                            },
                            polls,
                        });
                    }
                    OperationStatus::Failed => {
                        let (code, message) = match response.error {
                            Some(error) => (error.code, error.message),
                            None => ("Unknown".to_string(), "服务端未返回错误信息".to_string()),
                        };
                        return Ok(TrackedOperation {
                            outcome: OperationOutcome::Failed { code, message },
                            polls,
                        });
                    }
                }

                tokio::time::sleep(interval).await;
            }
        };

        let bounded = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, poll_loop).await.map_err(|_| {
                    warn!("操作跟踪超时: {}", status_link);
                    VaultError::Timeout(format!("{} 秒内未完成: {}", limit.as_secs(), status_link))
                })?,
                None => poll_loop.await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("操作跟踪已取消: {}", status_link);
                Err(VaultError::Cancelled(status_link.to_string()))
            }
            result = bounded => result,
        }
    }

    /// 使用服务客户端查询状态链接
    pub async fn track_operation(
        &self,
        client: &dyn BackupServiceClient,
        handle: &OperationHandle,
        cancel: &CancellationToken,
    ) -> Result<TrackedOperation> {
        info!("⏳ 等待操作完成: {} ({})", handle.operation, handle.operation_id());
        let tracked = self
            .track(&handle.status_link, cancel, move |link| async move {
                client.get_operation_status(&link).await
            })
            .await?;
        debug!(
            "操作 {} 结束，共查询 {} 次: {:?}",
            handle.operation, tracked.polls, tracked.outcome
        );
        Ok(tracked)
    }
}
