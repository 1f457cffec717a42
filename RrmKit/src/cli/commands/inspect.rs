//! CLI interface for container inspection
use std::path::Path;

use crate::converter::{ConversionOptions, InspectReport, inspect_container};
use crate::cli::progress::print_warning;

/// # Errors
/// Any pipeline error for `file`.
pub fn execute(file: &Path, json: bool, options: &ConversionOptions) -> anyhow::Result<()> {
    let report = inspect_container(file, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &InspectReport) {
    println!("RRM Information: {}", report.file.display());
    println!();
    println!("Size: {} bytes", report.size);
    println!("Header:");
    println!("  Index stream:    {:#x}", report.header.index_offset);
    println!(
        "  Position stream: {:#x} (stride {}, capacity {})",
        report.header.position_stream.offset,
        report.header.position_stream.stride,
        report.header.position_capacity
    );
    if let Some(declared) = report.header.declared_vertex_count {
        println!("  Declared vertices: {declared}");
    }
    println!();

    let stream = &report.indices.stream;
    println!(
        "Indices: {} x {:?} at {:#x}..{:#x}",
        stream.count,
        stream.element_width,
        stream.offset,
        stream.end()
    );
    for trial in &report.indices.trials {
        match &trial.rejected {
            Some(reason) => println!("  {:?}: rejected ({reason})", trial.width),
            None => println!(
                "  {:?}: {} indices, max {}, penalty {:.3}",
                trial.width,
                trial.indices,
                trial.max_index.map_or_else(|| "-".to_string(), |m| m.to_string()),
                trial.penalty.unwrap_or_default()
            ),
        }
    }
    println!("Vertices: {}", report.indices.vertex_count);
    println!("Faces: {}", report.faces);
    if let Some((min, max)) = report.bounds {
        println!(
            "Bounds: ({:.3}, {:.3}, {:.3}) - ({:.3}, {:.3}, {:.3})",
            min[0], min[1], min[2], max[0], max[1], max[2]
        );
    }
    println!();

    println!("Stream candidates:");
    for ranking in &report.rankings {
        println!("  {}:", ranking.semantic);
        if ranking.candidates.is_empty() {
            println!("    (none)");
        }
        for candidate in &ranking.candidates {
            println!(
                "    {:.3}  {:<24} {:#x} stride {} ({:?})",
                candidate.confidence(),
                candidate.layout,
                candidate.descriptor.offset,
                candidate.descriptor.stride,
                candidate.origin
            );
        }
    }
    println!();

    if !report.uv_sets.is_empty() {
        println!("UV sets:");
        for set in &report.uv_sets {
            println!(
                "  [{}] {}  confidence {:.3}  outside [0,1]: {:.1}%  non-finite: {}",
                set.index,
                set.label,
                set.confidence,
                set.outside_unit * 100.0,
                set.non_finite
            );
        }
        println!();
    }

    for diagnostic in &report.diagnostics {
        print_warning(&diagnostic.to_string());
    }
}
