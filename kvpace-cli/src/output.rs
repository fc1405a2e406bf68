//! Result line rendering

use anyhow::{Context, Result};
use kvpace_core::ResultSnapshot;

use crate::cli::OutputFormat;

/// Render one per-second snapshot as a single line
pub fn render(snapshot: &ResultSnapshot, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!(
            "expect {}\tqps {}\tdelay {}us\terr {}",
            snapshot.expected, snapshot.ops, snapshot.mean_latency_us, snapshot.errors
        )),
        OutputFormat::Json => {
            serde_json::to_string(snapshot).context("Failed to serialize result snapshot")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ResultSnapshot {
        ResultSnapshot {
            expected: 10000,
            ops: 9987,
            mean_latency_us: 412,
            errors: 3,
        }
    }

    #[test]
    fn test_text_line() {
        let line = render(&snapshot(), OutputFormat::Text).unwrap();
        assert_eq!(line, "expect 10000\tqps 9987\tdelay 412us\terr 3");
    }

    #[test]
    fn test_json_line() {
        let line = render(&snapshot(), OutputFormat::Json).unwrap();
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["expected"], 10000);
        assert_eq!(value["ops"], 9987);
        assert_eq!(value["mean_latency_us"], 412);
        assert_eq!(value["errors"], 3);
    }

    #[test]
    fn test_idle_interval() {
        let idle = ResultSnapshot {
            expected: 500,
            ops: 0,
            mean_latency_us: 0,
            errors: 0,
        };
        assert_eq!(
            render(&idle, OutputFormat::Text).unwrap(),
            "expect 500\tqps 0\tdelay 0us\terr 0"
        );
    }
}
