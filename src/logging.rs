use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::constants::{LOG_FILE_BACKUPS, LOG_FILE_MAX_BYTES, get_log_file_path};

static LOG_FILE: Mutex<Option<RotatingLog>> = Mutex::new(None);

/// Size-rotated log file: `tda.log`, then `tda.log.1` .. `tda.log.<backups>`.
#[derive(Debug)]
pub struct RotatingLog {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    backups: usize,
}

impl RotatingLog {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            file,
            written,
            max_bytes,
            backups,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        let len = line.len() as u64 + 1;
        if self.written > 0 && self.written + len > self.max_bytes {
            self.rotate()?;
        }
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        self.written += len;
        Ok(())
    }

    fn rotate(&mut self) -> std::io::Result<()> {
        if self.backups == 0 {
            self.file = File::create(&self.path)?;
            self.written = 0;
            return Ok(());
        }

        let _ = fs::remove_file(self.backup_path(self.backups));
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))?;

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }
}

/// Initialize logging system
/// - Console logging (stderr) is ONLY enabled when TDA_LOG_LEVEL or RUST_LOG is set
/// - The file log always receives every record from the log_* helpers
pub fn init_logging() {
    let console_filter = env::var("TDA_LOG_LEVEL")
        .ok()
        .map(|level| EnvFilter::new(level.to_lowercase()))
        .or_else(|| EnvFilter::try_from_default_env().ok());

    match console_filter {
        Some(filter) => {
            let console_layer = fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(EnvFilter::new("off"))
                .init();
        }
    }
}

/// Open the file log and return its path
pub fn setup_file_logging() -> anyhow::Result<PathBuf> {
    let path = get_log_file_path();
    let log = RotatingLog::open(&path, LOG_FILE_MAX_BYTES, LOG_FILE_BACKUPS)
        .map_err(|e| anyhow::anyhow!("Cannot open log file {}: {}", path.display(), e))?;

    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(log);
    }

    log_info(&format!("File logging enabled: {}", path.display()));
    Ok(path)
}

fn write_to_file(level: &str, target: &str, msg: &str) {
    if let Ok(mut guard) = LOG_FILE.lock()
        && let Some(ref mut log) = *guard
    {
        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = log.write_line(&format!("[{}] [{}] [{}] {}", timestamp, level, target, msg));
    }
}

pub fn log_error(msg: &str) {
    error!("{msg}");
    write_to_file("ERROR", "tda", msg);
}

pub fn log_warn(msg: &str) {
    warn!("{msg}");
    write_to_file("WARN", "tda", msg);
}

pub fn log_info(msg: &str) {
    info!("{msg}");
    write_to_file("INFO", "tda", msg);
}

pub fn log_debug(msg: &str) {
    debug!("{msg}");
    write_to_file("DEBUG", "tda", msg);
}

pub fn log_trace(msg: &str) {
    trace!("{msg}");
    write_to_file("TRACE", "tda", msg);
}
