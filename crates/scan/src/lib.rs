mod boss;
mod classifier;
mod donation;
mod ocr;
mod reconcile;

pub use boss::parse_boss_summary;
pub use classifier::{ACTOR_MARKER, DONATION_MARKER, ScanFormat, classify};
pub use donation::parse_donation_lines;
pub use ocr::{OcrEngine, OcrError, TesseractEngine};
pub use reconcile::{ReconcileOutcome, reconcile};

use guild_core::ExtractionResult;

/// Runs the classification and parsing stages over the recognized lines of
/// one screenshot. An empty or blank line sequence is the only input that
/// yields `Unrecognized`; everything else is routed to one of the two
/// format parsers, which degrade to empty/zero results rather than failing.
pub fn extract_activity(lines: &[String]) -> ExtractionResult {
    if lines.iter().all(|line| line.trim().is_empty()) {
        return ExtractionResult::Unrecognized;
    }
    let joined = lines.join("\n");
    match classify(&joined) {
        ScanFormat::Donation => ExtractionResult::Donation {
            donors: parse_donation_lines(lines),
        },
        ScanFormat::BossDamage => ExtractionResult::BossDamage {
            counters: parse_boss_summary(lines),
        },
    }
}
