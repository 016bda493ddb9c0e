//! Human-readable rendering of discovery results.

use crate::discovery::{DiscoveryResult, TreeSummary, Verdict};
use std::fmt::Write;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Convert a byte count to mebibytes for display.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Render the verification report for a discovery result.
///
/// Pure formatting: no filesystem access. The final line states the verdict, where
/// an existing but empty or unrelated directory is reported separately from one
/// with required files missing.
pub fn format_report(result: &DiscoveryResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== SAM3D Checkpoint Verification ===");
    let _ = writeln!(out, "Checkpoints directory: {}", result.root().display());
    let _ = writeln!(out, "Directory exists: {}", result.root_exists());
    let _ = writeln!(out, "Layout: {}", result.format());

    let present = result.present();
    if !present.is_empty() {
        let _ = writeln!(out, "\n✓ Found {} required files:", present.len());
        for entry in present {
            let _ = writeln!(
                out,
                "  - {} ({:.1} MB)",
                entry.path.display(),
                bytes_to_mb(entry.size_bytes)
            );
        }
    }

    let missing = result.missing();
    if !missing.is_empty() {
        let _ = writeln!(out, "\n✗ Missing {} required files:", missing.len());
        for path in missing {
            let _ = writeln!(out, "  - {}", path.display());
        }
    }

    if result.size_measured() {
        let _ = writeln!(
            out,
            "\nTotal checkpoints size: {:.1} MB",
            bytes_to_mb(result.total_size())
        );
    } else {
        let _ = writeln!(out, "\nTotal checkpoints size: not measured");
    }

    let verdict = result.verdict();
    let _ = write!(out, "\n{}: ", if verdict.is_pass() { "PASS" } else { "FAIL" });
    let _ = match verdict {
        Verdict::Pass => writeln!(out, "all required files are present."),
        Verdict::MissingFiles => writeln!(
            out,
            "some required files are missing. Please download them first."
        ),
        Verdict::Unrecognized => writeln!(
            out,
            "no recognizable checkpoint layout (expected hf/pipeline.yaml with weights, or *.pth files)."
        ),
        Verdict::RootMissing => writeln!(out, "checkpoint directory not found."),
    };
    out
}

/// Render a short listing of a checkpoint tree.
pub fn format_summary(summary: &TreeSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Checkpoints directory: {}", summary.root.display());
    if !summary.exists {
        let _ = writeln!(out, "Directory not found.");
        return out;
    }
    if summary.file_count == 0 {
        let _ = writeln!(out, "Directory is empty.");
        return out;
    }

    let _ = writeln!(out, "Found {} files:", summary.file_count);
    for entry in &summary.sample {
        let name = entry
            .path
            .strip_prefix(&summary.root)
            .unwrap_or(&entry.path);
        let _ = writeln!(
            out,
            "  - {} ({:.1} MB)",
            name.display(),
            bytes_to_mb(entry.size_bytes)
        );
    }
    let hidden = summary.file_count.saturating_sub(summary.sample.len());
    if hidden > 0 {
        let _ = writeln!(out, "  ... and {hidden} more");
    }
    let _ = writeln!(out, "Total size: {:.1} MB", bytes_to_mb(summary.total_size));
    out
}
