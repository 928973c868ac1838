use crate::errors::AppResult;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

/// A message of the Singer specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    Schema {
        stream: String,
        schema: Value,
        key_properties: Vec<String>,
    },
    Record {
        stream: String,
        record: Value,
        time_extracted: String,
    },
    State {
        value: Value,
    },
}

/// Writes messages as newline delimited JSON.
pub struct SingerWriter<W: Write> {
    out: W,
    records_written: usize,
}

impl<W: Write> SingerWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            records_written: 0,
        }
    }

    /// Serializes `message` on its own line and flushes.
    pub fn write_message(&mut self, message: &Message) -> AppResult<()> {
        serde_json::to_writer(&mut self.out, message)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        if matches!(message, Message::Record { .. }) {
            self.records_written += 1;
        }
        Ok(())
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
