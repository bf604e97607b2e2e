use std::path::PathBuf;
use std::time::Duration;

/// Default model constants
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Get default model from environment variable or default
pub fn get_default_model() -> String {
    std::env::var("TDA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string())
}

/// Program used to run `dotnet format`
pub const DEFAULT_DOTNET: &str = "dotnet";

pub fn get_dotnet_program() -> String {
    std::env::var("TDA_DOTNET").unwrap_or_else(|_| DEFAULT_DOTNET.to_string())
}

/// Upper bound for one analyzer run; large solutions need a full build
pub const DEFAULT_RUNNER_TIMEOUT_SECS: u64 = 300;

pub fn get_runner_timeout() -> Duration {
    let secs = std::env::var("TDA_RUNNER_TIMEOUT")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .unwrap_or(DEFAULT_RUNNER_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Model round trips allowed before the agent gives up
pub const DEFAULT_MAX_TURNS: usize = 16;

pub fn get_max_turns() -> usize {
    std::env::var("TDA_MAX_TURNS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_MAX_TURNS)
}

/// File log settings
pub const LOG_FILE_NAME: &str = "tda.log";
pub const LOG_FILE_MAX_BYTES: u64 = 5 * 1024 * 1024;
pub const LOG_FILE_BACKUPS: usize = 3;

/// Log file path: TDA_LOG_FILE, or tda.log in the system temp directory
pub fn get_log_file_path() -> PathBuf {
    match std::env::var("TDA_LOG_FILE") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => std::env::temp_dir().join(LOG_FILE_NAME),
    }
}
