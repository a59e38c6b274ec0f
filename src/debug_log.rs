//! File backend for the `log` facade.
//!
//! Writes to `debug_sculpt.log` (or a caller-chosen path). The file is
//! recreated on each `init_debug_log()` call.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

use crate::error::SculptError;

pub const DEFAULT_LOG_PATH: &str = "debug_sculpt.log";

lazy_static::lazy_static! {
    static ref DEBUG_LOG: Mutex<Option<File>> = Mutex::new(None);
}

struct FileLogger;

static LOGGER: FileLogger = FileLogger;

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            debug_log(&format_record(record));
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = DEBUG_LOG.lock() {
            if let Some(ref mut file) = *guard {
                let _ = file.flush();
            }
        }
    }
}

/// One log line: `[LEVEL target] message`.
pub fn format_record(record: &Record) -> String {
    format!("[{:<5} {}] {}", record.level(), record.target(), record.args())
}

/// Append a line to the debug log file, if one is open.
pub fn debug_log(msg: &str) {
    if let Ok(mut guard) = DEBUG_LOG.lock() {
        if let Some(ref mut file) = *guard {
            let _ = writeln!(file, "{}", msg);
            let _ = file.flush();
        }
    }
}

/// Create (or truncate) the debug log at `path` and route `log` records at
/// or above `level` into it.
pub fn init_debug_log(path: impl AsRef<Path>, level: LevelFilter) -> Result<(), SculptError> {
    let mut file = File::create(path.as_ref())?;
    writeln!(file, "=== TILE SCULPT DEBUG LOG ===")?;
    writeln!(file, "Timestamp: {:?}", std::time::SystemTime::now())?;
    writeln!(file)?;

    if let Ok(mut guard) = DEBUG_LOG.lock() {
        *guard = Some(file);
    }

    // A second init only swaps the file; the logger stays installed
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_format_record() {
        let line = format_record(
            &Record::builder()
                .args(format_args!("flatten reference locked at {:.3}", 2.5))
                .level(Level::Debug)
                .target("tile_sculpt::tools")
                .build(),
        );
        assert_eq!(
            line,
            "[DEBUG tile_sculpt::tools] flatten reference locked at 2.500"
        );
    }

    #[test]
    fn test_init_writes_header_and_records() {
        let path = std::env::temp_dir().join(format!(
            "tile_sculpt_debug_{}.log",
            std::process::id()
        ));
        init_debug_log(&path, LevelFilter::Info).unwrap();
        log::info!(target: "tile_sculpt::test", "generated 4 tiles");
        log::debug!("filtered out");
        debug_log("raw line");

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("=== TILE SCULPT DEBUG LOG ==="));
        assert!(text.contains("[INFO  tile_sculpt::test] generated 4 tiles"));
        assert!(!text.contains("filtered out"));
        assert!(text.contains("raw line"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_init_fails_on_bad_path() {
        let err = init_debug_log("/nonexistent-dir/sub/debug.log", LevelFilter::Info).unwrap_err();
        assert!(matches!(err, SculptError::Io(_)));
    }
}
