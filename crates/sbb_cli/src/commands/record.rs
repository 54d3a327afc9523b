//! Record command implementation.

use sbb_core::{
    normalize_scores, Config, Frame, FrameSignals, ObjectId, Recorder, RunSummary, ValueConfig,
    ValueModel, ValueOracle,
};
use sbb_storage::DirectoryStore;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// One entry of the frame file.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameInput {
    /// Storage cost in bytes.
    pub cost: f64,
    /// Raw anomaly score; normalised across the stream before use.
    #[serde(default)]
    pub anomaly_score: f64,
    /// Class probabilities, normal class first.
    #[serde(default)]
    pub class_scores: Vec<f64>,
    /// Tracked objects.
    #[serde(default)]
    pub objects: Vec<ObjectId>,
    /// Precomputed value; computed with the value model when absent.
    #[serde(default)]
    pub value: Option<f64>,
}

/// Runs the record command.
pub fn run(
    params: &Path,
    frames: &Path,
    output: &Path,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(params)
        .map_err(|e| format!("Failed to load parameters from {}: {e}", params.display()))?;
    let inputs: Vec<FrameInput> = serde_json::from_slice(&fs::read(frames)?)?;
    let frames = build_frames(inputs, &config.value)?;
    info!(frames = frames.len(), output = %output.display(), "recording");

    let store = DirectoryStore::create_clean(output)?;
    let mut recorder = Recorder::new(&config, store)?;
    for frame in frames {
        recorder.ingest(frame)?;
    }
    let summary = recorder.finish()?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            print_text_output(&summary, output);
        }
    }

    Ok(())
}

/// Turns frame file entries into frames.
///
/// Anomaly scores are min-max normalised over the whole stream. Entries
/// without a value are scored with the configured value model.
pub fn build_frames(
    inputs: Vec<FrameInput>,
    value: &ValueConfig,
) -> Result<Vec<Frame>, Box<dyn std::error::Error>> {
    let mut anomaly: Vec<f64> = inputs.iter().map(|f| f.anomaly_score).collect();
    normalize_scores(&mut anomaly);

    let model = ValueModel::from_config(value);
    let mut frames = Vec::with_capacity(inputs.len());
    for (i, (input, anomaly_score)) in inputs.into_iter().zip(anomaly).enumerate() {
        let value = match input.value {
            Some(value) => value,
            None => model.score(&FrameSignals {
                anomaly_score,
                class_scores: input.class_scores,
            })?,
        };
        frames.push(
            Frame::new(i as u64, value, input.cost)
                .with_anomaly_score(anomaly_score)
                .with_objects(input.objects),
        );
    }
    Ok(frames)
}

fn print_text_output(summary: &RunSummary, output: &Path) {
    let stats = &summary.stats;
    println!("SBB Recording Summary");
    println!("=====================");
    println!();
    println!("Output: {}", output.display());
    println!(
        "Mode:   {}",
        if summary.fifo { "fifo" } else { "priority" }
    );
    println!("Budget: {}", format_size(summary.budget_bytes));
    println!();
    println!("Frames ingested:  {}", stats.frames_ingested);
    println!();
    println!("Segments:");
    println!("  Closed:   {}", stats.segments_closed);
    println!("  Admitted: {}", stats.segments_admitted);
    println!("  Rejected: {}", stats.segments_rejected);
    println!("  Evicted:  {}", stats.segments_evicted);
    println!("  Resident: {}", summary.residents.len());
    if stats.empty_segments_skipped > 0 {
        println!("  Skipped (empty): {}", stats.empty_segments_skipped);
    }
    println!();
    println!("Resident cost:  {}", format_size(stats.resident_cost));
    println!("Resident value: {:.4}", stats.resident_value);
}

pub(crate) fn format_size(bytes: f64) -> String {
    if bytes < 1024.0 {
        format!("{bytes:.0} bytes")
    } else if bytes < 1024.0 * 1024.0 {
        format!("{:.1} KB", bytes / 1024.0)
    } else if bytes < 1024.0 * 1024.0 * 1024.0 {
        format!("{:.1} MB", bytes / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes / (1024.0 * 1024.0 * 1024.0))
    }
}
