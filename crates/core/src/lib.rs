use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One of the four fixed donation categories tracked per member per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationTier {
    Basic,
    Intermediate,
    Advanced,
    Item,
}

/// Per-member activity counters for one calendar day. Donation counts and
/// boss kills are whole numbers; boss damage is in hundred-million units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityCounters {
    #[serde(default)]
    pub basic: u32,
    #[serde(default)]
    pub intermediate: u32,
    #[serde(default)]
    pub advanced: u32,
    #[serde(default)]
    pub item: u32,
    #[serde(default)]
    pub boss_damage: f64,
    #[serde(default)]
    pub boss_kills: u32,
}

impl ActivityCounters {
    pub fn add_tier(&mut self, tier: DonationTier, amount: u32) {
        let slot = match tier {
            DonationTier::Basic => &mut self.basic,
            DonationTier::Intermediate => &mut self.intermediate,
            DonationTier::Advanced => &mut self.advanced,
            DonationTier::Item => &mut self.item,
        };
        *slot = slot.saturating_add(amount);
    }

    pub fn tier(&self, tier: DonationTier) -> u32 {
        match tier {
            DonationTier::Basic => self.basic,
            DonationTier::Intermediate => self.intermediate,
            DonationTier::Advanced => self.advanced,
            DonationTier::Item => self.item,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.basic == 0
            && self.intermediate == 0
            && self.advanced == 0
            && self.item == 0
            && self.boss_damage == 0.0
            && self.boss_kills == 0
    }
}

/// Field-by-field merge of freshly scanned counters into stored ones. A
/// scanned zero means "not reported" and leaves the stored value untouched;
/// a positive scanned value replaces the stored one.
pub fn merge_scanned(prev: ActivityCounters, scanned: ActivityCounters) -> ActivityCounters {
    ActivityCounters {
        basic: pick(prev.basic, scanned.basic),
        intermediate: pick(prev.intermediate, scanned.intermediate),
        advanced: pick(prev.advanced, scanned.advanced),
        item: pick(prev.item, scanned.item),
        boss_damage: if scanned.boss_damage > 0.0 {
            scanned.boss_damage
        } else {
            prev.boss_damage
        },
        boss_kills: pick(prev.boss_kills, scanned.boss_kills),
    }
}

fn pick(prev: u32, scanned: u32) -> u32 {
    if scanned > 0 { scanned } else { prev }
}

/// Typed outcome of running the extraction pipeline over one screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionResult {
    Donation {
        donors: BTreeMap<String, ActivityCounters>,
    },
    BossDamage {
        counters: ActivityCounters,
    },
    Unrecognized,
}

/// The day's counters for every member that has any, keyed by member id.
pub type DailyRecord = BTreeMap<i64, ActivityCounters>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterMember {
    pub id: i64,
    pub name: String,
    pub combat_power: i64,
    pub role: String,
}

/// Insert/update payload for a roster member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberInput {
    pub name: String,
    pub combat_power: i64,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guild {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub last_seen_at: Option<String>,
}

/// How scanned donor names are matched against roster names. `Exact` is
/// byte equality; `Folded` trims, lowercases, and maps fullwidth ASCII
/// forms to their halfwidth equivalents before comparing, which tolerates
/// the case/width variants OCR tends to produce for mixed-script names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    #[default]
    Exact,
    Folded,
}

impl MatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPolicy::Exact => "exact",
            MatchPolicy::Folded => "folded",
        }
    }

    pub fn parse(value: &str) -> Option<MatchPolicy> {
        match value {
            "exact" => Some(MatchPolicy::Exact),
            "folded" => Some(MatchPolicy::Folded),
            _ => None,
        }
    }

    pub fn matches(&self, roster_name: &str, scanned_name: &str) -> bool {
        match self {
            MatchPolicy::Exact => roster_name == scanned_name,
            MatchPolicy::Folded => fold_name(roster_name) == fold_name(scanned_name),
        }
    }
}

pub fn fold_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|ch| match ch {
            '\u{3000}' => ' ',
            '\u{ff01}'..='\u{ff5e}' => {
                char::from_u32(ch as u32 - 0xfee0).unwrap_or(ch)
            }
            _ => ch,
        })
        .flat_map(char::to_lowercase)
        .collect()
}
