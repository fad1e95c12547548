//! Screen capture and result reporting for headless runs.

use clap::ValueEnum;
use ratatui::buffer::Buffer;
use serde::Serializer;
use std::fmt::Write;
use std::time::Duration;

use super::HeadlessResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Final screen followed by a summary line
    #[default]
    Text,
    /// Screen, viewer state and assertion counts as JSON
    Json,
}

/// Plain text of a rendered buffer: one line per row, trailing spaces and
/// trailing blank rows removed.
pub fn screen_text(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut rows: Vec<String> = (area.y..area.y + area.height)
        .map(|y| {
            let row: String = (area.x..area.x + area.width)
                .filter_map(|x| buffer.cell((x, y)).map(|cell| cell.symbol()))
                .collect();
            row.trim_end().to_string()
        })
        .collect();
    while rows.last().is_some_and(String::is_empty) {
        rows.pop();
    }

    let mut text = rows.join("\n");
    text.push('\n');
    text
}

pub(super) fn as_millis<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(duration.as_millis() as u64)
}

impl HeadlessResult {
    /// Formats the result for stdout.
    pub fn report(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => self.text_report(),
            OutputFormat::Json => serde_json::to_string_pretty(self)
                .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}")),
        }
    }

    fn text_report(&self) -> String {
        let mut out = String::new();
        for snapshot in &self.snapshots {
            let _ = writeln!(out, "--- {} ---\n{}", snapshot.name, snapshot.screen);
        }
        out.push_str(&self.screen);

        let _ = write!(
            out,
            "\n[{} events, {}ms",
            self.events_executed,
            self.duration.as_millis()
        );
        let counts = &self.assertions;
        if counts.passed + counts.failed > 0 {
            let _ = write!(out, ", assertions {} passed / {} failed", counts.passed, counts.failed);
        }
        out.push_str("]\n");
        out
    }
}
