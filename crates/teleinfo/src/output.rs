use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use teleinfo_snapshot::{Publisher, Snapshot};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Publishes snapshots on stdout instead of the network.
///
/// JSON output is one object per line, identical to the broadcast payload.
pub struct StdoutPublisher {
    format: OutputFormat,
}

impl StdoutPublisher {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Publisher for StdoutPublisher {
    fn publish(&mut self, snapshot: &Snapshot) -> teleinfo_snapshot::Result<()> {
        let mut out = std::io::stdout().lock();
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut out, snapshot)?;
                writeln!(out)?;
            }
            OutputFormat::Table => {
                let mut table = new_table(vec!["TAG", "VALUE"]);
                for (tag, value) in snapshot.fields() {
                    table.add_row(vec![tag, value]);
                }
                writeln!(out, "{}", snapshot.kind().label())?;
                writeln!(out, "{table}")?;
            }
            OutputFormat::Pretty => {
                let fields = snapshot
                    .fields()
                    .map(|(tag, value)| format!("{tag}={value:?}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(out, "{} {fields}", snapshot.kind().label())?;
            }
        }
        out.flush()?;
        Ok(())
    }
}
