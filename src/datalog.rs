//! Append-only data collection log.
//!
//! One line per event, `"<timestamp>.<ms> - <level> - <message>"`, flushed
//! immediately so a crash never loses recorded reports. Explicitly
//! constructed and owned by whoever records into it.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::warn;

pub struct DataLogger {
    file: File,
}

impl DataLogger {
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    fn write_line(&mut self, level: &str, msg: &str) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let result = writeln!(self.file, "{} - {} - {}", stamp, level, msg)
            .and_then(|_| self.file.flush());
        if let Err(e) = result {
            warn!("Datalog write failed: {}", e);
        }
    }

    /// Records a raw report as read from the device.
    pub fn raw_data(&mut self, msg: &str) {
        self.write_line("rawData", msg);
    }

    /// Records that a snapshot is about to be sent.
    pub fn before_websocket(&mut self, msg: &str) {
        self.write_line("BeforeWebsocket", msg);
    }

    /// Records the payload that went out.
    pub fn after_websocket(&mut self, msg: &str) {
        self.write_line("AfterWebsocket", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join("spacebridge-tests")
            .join(format!("{}-{}", std::process::id(), name))
    }

    #[test]
    fn lines_carry_level_and_timestamp() {
        let path = temp_path("datalog.txt");
        let _ = fs::remove_file(&path);

        let mut log = DataLogger::open(&path).unwrap();
        log.raw_data("[1, 100, 0]");
        log.before_websocket("publishing");
        log.after_websocket("{\"x\":0.29}");

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(" - rawData - [1, 100, 0]"));
        assert!(lines[1].contains(" - BeforeWebsocket - publishing"));
        assert!(lines[2].contains(" - AfterWebsocket - "));

        // "<date> <time>.<ms>" before the first separator
        let stamp = lines[0].split(" - ").next().unwrap();
        assert_eq!(stamp.len(), "2026-01-01 00:00:00.000".len());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn reopening_appends() {
        let path = temp_path("datalog-append.txt");
        let _ = fs::remove_file(&path);

        DataLogger::open(&path).unwrap().raw_data("first");
        DataLogger::open(&path).unwrap().raw_data("second");

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);

        let _ = fs::remove_file(&path);
    }
}
