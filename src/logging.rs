//! JSON-line logging on stderr for the agent processes.

use chrono::{SecondsFormat, Utc};
use std::io::Write;

/// Install the global logger.
///
/// `RUST_LOG` wins over `default_level` (normally `pipeline.log_level`).
pub fn init(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", default_level))
        .format(|buf, record| {
            let line = format_record(record.level(), record.target(), &record.args().to_string());
            writeln!(buf, "{}", line)
        })
        .init();
}

/// One log line: `{"timestamp": ..., "level": ..., "target": ..., "message": ...}`
pub fn format_record(level: log::Level, target: &str, message: &str) -> String {
    serde_json::json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "level": level.as_str(),
        "target": target,
        "message": message,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_record_is_one_json_object() {
        let line = format_record(log::Level::Warn, "pdf_to_knowledge::agents", "quote \" and\nnewline");
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["target"], "pdf_to_knowledge::agents");
        assert_eq!(value["message"], "quote \" and\nnewline");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
