//! stat command - Show blob size and metadata

use std::collections::BTreeMap;
use std::sync::Arc;

use clap::Args;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use serde::Serialize;

use bfs_core::{InputStream, Metadata, ObjectInputFile, RandomAccessFile};

use crate::commands::open_remote;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, Tone};

/// Show size and metadata of a blob
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Blob to inspect (profile/container/blob)
    pub path: String,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    path: String,
    profile: String,
    container: String,
    blob: String,
    size_bytes: u64,
    size_human: String,
    metadata: BTreeMap<String, String>,
}

/// Execute the stat command
pub async fn execute(args: StatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (profile, mut reader) = match open_remote(&args.path, &formatter).await {
        Ok(opened) => opened,
        Err(code) => return code,
    };

    let (size, metadata) = match read_stat(&reader) {
        Ok(stat) => stat,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    let output = StatOutput {
        path: args.path.clone(),
        profile: profile.name.clone(),
        container: reader.path().container().to_string(),
        blob: reader.path().path_to_file().to_string(),
        size_bytes: size,
        size_human: humansize::format_size(size, humansize::BINARY),
        metadata: (*metadata).clone(),
    };
    if let Err(e) = reader.close() {
        tracing::debug!(error = %e, "Failed to close reader");
    }

    formatter.report(&output, |f| text_lines(&output, f));
    ExitCode::Success
}

fn read_stat(reader: &ObjectInputFile) -> bfs_core::Result<(u64, Arc<Metadata>)> {
    Ok((reader.get_size()?, reader.read_metadata()?))
}

fn text_lines(output: &StatOutput, f: &Formatter) -> Vec<String> {
    let size = format!(
        "{} {}",
        f.paint(Tone::Size, &output.size_human),
        f.paint(Tone::Dim, &format!("({} bytes)", output.size_bytes))
    );
    let mut lines = vec![
        f.field("Path", &output.path),
        f.field("Container", &f.paint(Tone::Name, &output.container)),
        f.field("Blob", &output.blob),
        f.field("Size", &size),
    ];

    if output.metadata.is_empty() {
        lines.push(f.field("Metadata", &f.paint(Tone::Dim, "(none)")));
        return lines;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Key", "Value"]);
    for (k, v) in &output.metadata {
        table.add_row(vec![k.as_str(), v.as_str()]);
    }
    lines.push(f.field("Metadata", ""));
    lines.push(table.to_string());
    lines
}
