//! Session logger: the `log` sink that writes to a single file in the OS
//! data directory.
//!
//! Each launch truncates the file, so it holds the latest session only.
//!
//! Log location:
//!   Windows:  `%APPDATA%\ParaFX\parafx.log`
//!   Linux:    `~/.local/share/ParaFX/parafx.log`
//!   macOS:    `~/Library/Application Support/ParaFX/parafx.log`
//!
//! Library code only uses the `log` macros; nothing is recorded until a
//! binary calls [`init`].

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{LevelFilter, Log, Metadata, Record};

static LOGGER: OnceLock<SessionLogger> = OnceLock::new();

struct SessionLogger {
    file: Option<Mutex<File>>,
    path: PathBuf,
    level: LevelFilter,
    echo_stderr: bool,
}

impl SessionLogger {
    fn write_line(&self, line: &str) {
        if let Some(mutex) = &self.file
            && let Ok(mut file) = mutex.lock()
        {
            let _ = writeln!(file, "{line}");
        }
    }
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] [{}] {}", timestamp(), record.level(), record.args());
        if self.echo_stderr {
            eprintln!("{}", line);
        }
        self.write_line(&line);
    }

    fn flush(&self) {
        if let Some(mutex) = &self.file
            && let Ok(mut file) = mutex.lock()
        {
            let _ = file.flush();
        }
    }
}

/// Where this session is logging, once [`init`] has run.
pub fn log_path() -> Option<&'static Path> {
    LOGGER.get().map(|l| l.path.as_path())
}

/// Initialise the session logger at the default location. Only the first
/// call has any effect.
///
/// Truncates the log file, registers the global `log` sink at `level` and
/// chains a panic hook that records the panic before the default handler runs.
pub fn init(level: LevelFilter, echo_stderr: bool) {
    init_at(log_file_path(), level, echo_stderr);
}

/// Same as [`init`] with an explicit file path.
pub fn init_at(path: PathBuf, level: LevelFilter, echo_stderr: bool) {
    if LOGGER.get().is_some() {
        return;
    }

    let opened = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| File::create(&path));
    let file = match opened {
        Ok(f) => Some(Mutex::new(f)),
        Err(e) => {
            // Stderr only from here on.
            eprintln!("parafx: log file {} unavailable: {}", path.display(), e);
            None
        }
    };

    let logger = LOGGER.get_or_init(|| SessionLogger {
        file,
        path,
        level,
        echo_stderr,
    });
    if log::set_logger(logger).is_err() {
        return;
    }
    log::set_max_level(level);

    logger.write_line(&format!("=== ParaFX session started {} ===", session_stamp()));
    logger.write_line(&format!("Log file: {}", logger.path.display()));
    logger.write_line("");

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(l) = LOGGER.get() {
            l.write_line(&format!("[{}] [PANIC] {}", timestamp(), info));
        }
        prev(info);
    }));
}

fn log_file_path() -> PathBuf {
    app_data_root().join("ParaFX").join("parafx.log")
}

/// Per-user application data root for the current platform.
fn app_data_root() -> PathBuf {
    let env = |key: &str| std::env::var_os(key).map(PathBuf::from);
    let native = if cfg!(target_os = "windows") {
        env("APPDATA")
    } else if cfg!(target_os = "macos") {
        env("HOME").map(|h| h.join("Library/Application Support"))
    } else {
        None
    };
    native
        .or_else(|| env("XDG_DATA_HOME"))
        .or_else(|| env("HOME").map(|h| h.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn unix_secs() -> Option<u64> {
    SystemTime::now().duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

/// UTC wall clock as `HH:MM:SS`.
fn timestamp() -> String {
    unix_secs().map_or_else(
        || "--:--:--".to_string(),
        |t| format!("{:02}:{:02}:{:02}", t / 3600 % 24, t / 60 % 60, t % 60),
    )
}

fn session_stamp() -> String {
    unix_secs().map_or_else(|| "at unknown time".to_string(), |t| format!("at unix {t}"))
}
