use std::collections::BTreeMap;

use guild_core::{ActivityCounters, DonationTier};

use crate::classifier::{ACTOR_MARKER, DONATION_MARKER};

/// Count-unit token that follows an explicit repetition amount ("times").
pub const COUNT_UNIT: &str = "회";

// Order is semantic: a line matching several keywords lands on the first.
const TIER_KEYWORDS: &[(&str, DonationTier)] = &[
    ("초급", DonationTier::Basic),
    ("중급", DonationTier::Intermediate),
    ("고급", DonationTier::Advanced),
    ("아이템", DonationTier::Item),
];

/// Extracts per-donor donation counts from a donation-roster screenshot.
/// Purely additive and skip-on-miss: a line that yields no donor name or no
/// tier keyword contributes nothing, and donors absent from every line are
/// absent from the map.
pub fn parse_donation_lines(lines: &[String]) -> BTreeMap<String, ActivityCounters> {
    let mut donors: BTreeMap<String, ActivityCounters> = BTreeMap::new();
    for line in lines {
        if !line.contains(DONATION_MARKER) || !line.contains(ACTOR_MARKER) {
            continue;
        }
        let Some(name) = donor_name(line) else {
            continue;
        };
        let Some(tier) = tier_in_line(line) else {
            continue;
        };
        let amount = count_in_line(line).unwrap_or(1);
        donors
            .entry(name.to_string())
            .or_default()
            .add_tier(tier, amount);
    }
    donors
}

/// The last whitespace-delimited token before the actor marker. Any leading
/// timestamp or UI chrome is assumed to sit in earlier tokens.
fn donor_name(line: &str) -> Option<&str> {
    let before = line.split(ACTOR_MARKER).next()?;
    before.split_whitespace().last()
}

/// Looks for a `<digits>회` pattern; the digits immediately preceding the
/// first count unit win.
fn count_in_line(line: &str) -> Option<u32> {
    for (idx, _) in line.match_indices(COUNT_UNIT) {
        let digits: Vec<char> = line[..idx]
            .chars()
            .rev()
            .take_while(|ch| ch.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            continue;
        }
        let value: String = digits.into_iter().rev().collect();
        if let Ok(parsed) = value.parse::<u32>() {
            return Some(parsed);
        }
    }
    None
}

fn tier_in_line(line: &str) -> Option<DonationTier> {
    for (keyword, tier) in TIER_KEYWORDS {
        if line.contains(*keyword) {
            return Some(*tier);
        }
    }
    None
}
