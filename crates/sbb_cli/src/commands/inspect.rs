//! Inspect command implementation.

use super::record::format_size;
use sbb_core::SegmentRecord;
use sbb_storage::{DirectoryStore, RecordStore};
use serde::Serialize;
use std::path::Path;

/// Output directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Output directory.
    pub path: String,
    /// Number of segment records.
    pub record_count: usize,
    /// Frames across all records.
    pub frame_count: usize,
    /// Sum of record costs.
    pub total_cost: f64,
    /// Sum of record values.
    pub total_value: f64,
    /// Per-record statistics.
    pub records: Vec<RecordStats>,
}

/// Statistics for a single segment record.
#[derive(Debug, Serialize)]
pub struct RecordStats {
    /// Record name.
    pub name: String,
    /// Number of frames.
    pub frames: usize,
    /// First and last frame index.
    pub span: Option<(u64, u64)>,
    /// Total cost.
    pub cost: f64,
    /// Total value.
    pub value: f64,
    /// Mean compression decision.
    pub mean_decision: f64,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No output directory found at {}", path.display()).into());
    }

    let result = inspect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Reads every segment record of an output directory.
///
/// Files that are not segment logs are ignored.
pub fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let store = DirectoryStore::open(path)?;

    let mut records = Vec::new();
    for name in store.names() {
        if !name.ends_with("_log.json") {
            continue;
        }
        let handle = store.handle(&name)?;
        let record = SegmentRecord::from_json_slice(&store.get(&handle)?)
            .map_err(|e| format!("Failed to decode {name}: {e}"))?;
        records.push(RecordStats {
            span: record.frame.first().zip(record.frame.last()).map(|(a, b)| (*a, *b)),
            frames: record.len(),
            cost: record.total_cost(),
            value: record.total_value(),
            mean_decision: if record.decision.is_empty() {
                0.0
            } else {
                record.decision.iter().sum::<f64>() / record.decision.len() as f64
            },
            name,
        });
    }
    records.sort_by_key(|r| r.span.map(|(first, _)| first));

    Ok(InspectResult {
        path: path.display().to_string(),
        record_count: records.len(),
        frame_count: records.iter().map(|r| r.frames).sum(),
        total_cost: records.iter().map(|r| r.cost).sum(),
        total_value: records.iter().map(|r| r.value).sum(),
        records,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("SBB Output Inspection");
    println!("=====================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Records: {}", result.record_count);
    println!("Frames:  {}", result.frame_count);
    println!("Cost:    {}", format_size(result.total_cost));
    println!("Value:   {:.4}", result.total_value);

    if !result.records.is_empty() {
        println!();
        println!("Segments:");
        for record in &result.records {
            let span = match record.span {
                Some((first, last)) => format!("frames {first}..={last}"),
                None => "no frames".to_string(),
            };
            println!(
                "  {} - {}, {}, value {:.4}, mean decision {:.3}",
                record.name,
                span,
                format_size(record.cost),
                record.value,
                record.mean_decision
            );
        }
    }
}
