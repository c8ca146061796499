use clap::Parser;
use tracing::error;
use vault_cli::{Cli, CliApp, Commands, run_init, run_providers, setup_logging};
use vault_core::VaultError;

fn report_error(context: &str, e: &anyhow::Error) {
    error!("❌ {}: {}", context, e);
    if let Some(vault_error) = e.downcast_ref::<VaultError>() {
        if matches!(vault_error, VaultError::Aggregate(_)) {
            for cause in vault_error.causes() {
                error!("   - {}", cause);
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // 解析命令行参数
    let cli = Cli::parse();

    // 设置日志记录
    setup_logging(cli.verbose);

    // `init` 和 `providers` 命令不需要预先加载配置
    match cli.command {
        Commands::Init { force } => {
            if let Err(e) = run_init(&cli.config, force) {
                report_error("初始化失败", &e);
                std::process::exit(1);
            }
            return;
        }
        Commands::Providers => {
            run_providers();
            return;
        }
        _ => {}
    }

    let app = match CliApp::new_with_config(&cli.config) {
        Ok(app) => app,
        Err(e) => {
            report_error("应用初始化失败", &e);
            if matches!(e.downcast_ref::<VaultError>(), Some(VaultError::InvalidConfig(_))) {
                error!("👉 请检查配置文件，或运行 'vault-cli init' 重新生成");
            }
            std::process::exit(1);
        }
    };
    app.cancel_on_ctrl_c();

    // 运行命令
    if let Err(e) = app.run_command(cli.command).await {
        report_error("操作失败", &e);
        std::process::exit(1);
    }
}
