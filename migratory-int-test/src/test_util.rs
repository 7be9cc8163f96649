use migratory::common::{ReadExecutor, WriteExecutor};
use migratory::migratory_config::LogSink;
use migratory::{atomic, Atomic};
use std::path::PathBuf;
use std::sync::Arc;
use std::{env, fs};

#[ctor::ctor]
fn init_logger() {
    colog::init();
}

/// Returns a unique path under the system temp directory.
pub fn random_path() -> PathBuf {
    let id = uuid::Uuid::new_v4();
    env::temp_dir().join(format!("migratory-{}.json", id))
}

/// Removes the applied-set record at the given path, if present.
pub fn cleanup(path: &PathBuf) {
    let _ = fs::remove_file(path);
}

/// Captures every line handed to the contract log sink.
#[derive(Clone, Default)]
pub struct LogCapture {
    lines: Atomic<Vec<String>>,
}

impl LogCapture {
    pub fn new() -> Self {
        LogCapture {
            lines: atomic(Vec::new()),
        }
    }

    /// Returns a sink that appends into this capture.
    pub fn sink(&self) -> LogSink {
        let lines = self.lines.clone();
        Arc::new(move |line| {
            lines.write_with(|l| l.push(line.to_string()));
        })
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.read_with(|l| l.clone())
    }
}
