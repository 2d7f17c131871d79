//! NDJSON event source
//!
//! Each non-empty line holds either an `EventBatch`
//! (`{"timestamp": ..., "events": [...]}`) or a single `Event`, which is
//! wrapped into a one-event batch stamped with the read time.

use chrono::Utc;
use contracts::{Event, EventBatch};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::error::CliError;

/// Reads event batches line by line
pub struct BatchReader<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: AsyncBufRead + Unpin> BatchReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    /// Next line, parsed
    ///
    /// `Ok(None)` at end of input; blank lines are skipped. A parse error
    /// only affects its own line, the reader can be polled again.
    pub async fn next_batch(&mut self) -> Result<Option<EventBatch>, CliError> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return parse_line(&line, self.line_no).map(Some);
        }
        Ok(None)
    }
}

/// Parse one NDJSON line
pub fn parse_line(line: &str, line_no: usize) -> Result<EventBatch, CliError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| CliError::invalid_input(line_no, e.to_string()))?;

    if !value.is_object() {
        return Err(CliError::invalid_input(line_no, "expected a JSON object"));
    }

    if value.get("events").is_some() {
        serde_json::from_value::<EventBatch>(value)
            .map_err(|e| CliError::invalid_input(line_no, e.to_string()))
    } else {
        let event = serde_json::from_value::<Event>(value)
            .map_err(|e| CliError::invalid_input(line_no, e.to_string()))?;
        Ok(EventBatch::new(Utc::now(), vec![event]))
    }
}
