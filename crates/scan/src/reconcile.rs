use serde::{Deserialize, Serialize};

use guild_core::{DailyRecord, ExtractionResult, MatchPolicy, RosterMember, merge_scanned};

/// The day's record with the extraction merged in, plus what happened to
/// each extracted identity. `record` is a value for the caller to persist;
/// nothing is written here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub record: DailyRecord,
    pub matched: usize,
    pub unmatched: Vec<String>,
}

/// Merges extracted counters into the current record for the day.
///
/// Donation results are matched donor-by-donor against the roster under the
/// given policy; the first matching member wins. Donors without a roster
/// match are dropped from the record (no roster members are ever created
/// from scan output) and reported in `unmatched`. Fields the scan did not
/// report as positive pass the stored value through unchanged.
///
/// Boss-damage results carry no identity, so the record is returned as-is;
/// assigning the extracted pair to a member is a manual edit the caller
/// submits through the ordinary merge write.
pub fn reconcile(
    extraction: &ExtractionResult,
    roster: &[RosterMember],
    current: &DailyRecord,
    policy: MatchPolicy,
) -> ReconcileOutcome {
    let mut record = current.clone();
    let mut matched = 0usize;
    let mut unmatched = Vec::new();
    if let ExtractionResult::Donation { donors } = extraction {
        for (name, scanned) in donors {
            let Some(member) = roster
                .iter()
                .find(|member| policy.matches(&member.name, name))
            else {
                unmatched.push(name.clone());
                continue;
            };
            let prev = record.get(&member.id).copied().unwrap_or_default();
            record.insert(member.id, merge_scanned(prev, *scanned));
            matched += 1;
        }
    }
    ReconcileOutcome {
        record,
        matched,
        unmatched,
    }
}
