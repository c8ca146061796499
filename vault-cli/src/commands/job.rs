use crate::app::CliApp;
use crate::cli::JobCommand;
use crate::utils::print_json;
use tracing::info;

/// 处理备份作业相关命令
pub async fn handle_job_command(app: &CliApp, command: JobCommand) -> anyhow::Result<()> {
    match command {
        JobCommand::Get { ids } => {
            let jobs = app.manager.get_jobs(&ids).await?;
            print_json(&jobs)
        }
        JobCommand::Stop { id } => {
            info!("⏹️  取消作业: {}", id);
            let job = app.manager.stop_job(&id).await?;
            info!("作业 {} 当前状态: {}", job.name, job.status);
            print_json(&job)
        }
    }
}
