use anyhow::Result;

use tda::app::{Outcome, run_app};
use tda::cli::{Config, Mode};
use tda::logging::{init_logging, log_error, log_warn, setup_file_logging};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    // File logging is best effort, the tools work without it
    let log_file = match setup_file_logging() {
        Ok(path) => Some(path),
        Err(e) => {
            eprintln!("Warning: Failed to set up file logging: {:#}", e);
            None
        }
    };

    let config = Config::from_args();
    let is_agent_run = matches!(config.mode, Mode::Agent { .. });

    let result = run_app(config).await;

    if is_agent_run && let Some(path) = &log_file {
        eprintln!("Logs: {}", path.display());
    }

    match result {
        Ok(Outcome::Success) => Ok(()),
        Ok(Outcome::ToolError) => {
            log_warn("Tool invocation returned an error");
            std::process::exit(1);
        }
        Err(e) => {
            log_error(&format!("{:#}", e));
            Err(e)
        }
    }
}
