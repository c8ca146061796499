use serde::Serialize;

/// 日志输出到文件时使用的环境变量
pub const LOG_FILE_ENV: &str = "VAULT_LOG_FILE";

/// # Vault CLI 日志系统使用说明
///
/// 库代码只使用 `tracing` 宏，日志配置在 `main.rs` 中通过 `setup_logging()` 完成。
/// 命令结果（策略、作业、恢复点等）以 JSON 输出到标准输出，与日志分离。
///
/// ## 日志配置选项
/// - `-v, --verbose`：启用详细日志模式（DEBUG 级别）
/// - `RUST_LOG`：标准的 Rust 日志级别控制
/// - `VAULT_LOG_FILE`：日志文件路径，设置后日志输出到文件而非终端
///
/// ```bash
/// vault-cli -v policy list
/// VAULT_LOG_FILE=vault.log vault-cli job get <job-id>
/// RUST_LOG=vault_core::tracker=debug vault-cli backup --vm web01 --resource-group rg1
/// ```
pub fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let log_file = std::env::var(LOG_FILE_ENV).ok().and_then(|path| {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("无法打开日志文件 {path}: {e}，改为输出到终端");
                None
            }
        }
    });

    if let Some(file) = log_file {
        // 输出到文件，使用详细格式便于调试
        fmt()
            .with_env_filter(env_filter)
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_names(true)
            .with_line_number(true)
            .init();
    } else {
        // 输出到终端，使用简洁格式
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .without_time()
            .compact()
            .init();
    }
}

/// 将命令结果以格式化 JSON 输出到标准输出
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
