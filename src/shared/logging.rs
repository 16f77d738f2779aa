use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
        }
    }
}

/// JSON-lines event sink. A sink without a path drops every event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, event: &str, fields: &[(&str, Value)]) {
        self.append(LogLevel::Info, event, fields);
    }

    pub fn warn(&self, event: &str, fields: &[(&str, Value)]) {
        self.append(LogLevel::Warn, event, fields);
    }

    pub fn append(&self, level: LogLevel, event: &str, fields: &[(&str, Value)]) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        let _ = append_event_line(path, level, event, fields);
    }
}

pub fn append_event_line(
    path: &Path,
    level: LogLevel,
    event: &str,
    fields: &[(&str, Value)],
) -> Result<(), std::io::Error> {
    let mut payload = Map::new();
    payload.insert("timestamp".to_string(), Value::from(now_secs()));
    payload.insert("level".to_string(), Value::String(level.as_str().to_string()));
    payload.insert("event".to_string(), Value::String(event.to_string()));
    for (key, value) in fields {
        payload.insert((*key).to_string(), value.clone());
    }

    let line = serde_json::to_string(&payload)
        .map_err(|source| std::io::Error::other(source.to_string()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{line}")
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}
