use guild_core::ActivityCounters;

// Kill counts are single or double digit; anything bigger is screen noise
// such as coordinates or timestamps.
const KILL_COUNT_CEILING: u64 = 100;

/// Extracts the damage/kill pair from a boss-damage screenshot. Damage is
/// the largest decimal figure on screen and the kill count the largest
/// small integer, so no layout parsing is needed: sweep every
/// numeric-looking token and keep the maxima. Returns an all-zero reading
/// when nothing qualifies.
pub fn parse_boss_summary(lines: &[String]) -> ActivityCounters {
    let joined = lines.join("\n");
    let mut counters = ActivityCounters::default();
    for token in numeric_tokens(&joined) {
        if token.contains('.') {
            if let Ok(value) = token.parse::<f64>()
                && value > counters.boss_damage
            {
                counters.boss_damage = value;
            }
        } else if let Ok(value) = token.parse::<u64>()
            && value < KILL_COUNT_CEILING
            && value as u32 > counters.boss_kills
        {
            counters.boss_kills = value as u32;
        }
    }
    counters
}

/// Digit runs with optional thousands separators and at most one decimal
/// point, with separators stripped. Tokens carrying more than one decimal
/// point are not numeric-looking and are dropped.
fn numeric_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() || ch == ',' || ch == '.' {
            current.push(ch);
        } else {
            flush_token(&mut current, &mut tokens);
        }
    }
    flush_token(&mut current, &mut tokens);
    tokens
}

fn flush_token(raw: &mut String, tokens: &mut Vec<String>) {
    if raw.is_empty() {
        return;
    }
    let trimmed = raw.trim_matches(|ch| ch == ',' || ch == '.');
    let cleaned: String = trimmed.chars().filter(|ch| *ch != ',').collect();
    let has_digit = cleaned.chars().any(|ch| ch.is_ascii_digit());
    if has_digit && cleaned.matches('.').count() <= 1 {
        tokens.push(cleaned);
    }
    raw.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn takes_max_decimal_and_max_small_integer() {
        let counters = parse_boss_summary(&lines(&["1.5 23", "150 7.2"]));
        assert_eq!(counters.boss_damage, 7.2);
        assert_eq!(counters.boss_kills, 23);
    }

    #[test]
    fn integers_at_or_above_ceiling_are_noise() {
        let counters = parse_boss_summary(&lines(&["보스 처치 12 좌표 1920 1080"]));
        assert_eq!(counters.boss_kills, 12);
    }

    #[test]
    fn no_numeric_tokens_yield_zero_result() {
        let counters = parse_boss_summary(&lines(&["보스 토벌 결과 없음"]));
        assert_eq!(counters, ActivityCounters::default());
    }

    #[test]
    fn thousands_separators_are_stripped() {
        // "1,234" is an integer above the ceiling once cleaned, so only the
        // decimal survives.
        let counters = parse_boss_summary(&lines(&["누적 1,234 금일 5.8"]));
        assert_eq!(counters.boss_damage, 5.8);
        assert_eq!(counters.boss_kills, 0);
    }

    #[test]
    fn tokens_with_two_decimal_points_are_dropped() {
        let counters = parse_boss_summary(&lines(&["버전 1.2.3"]));
        assert_eq!(counters, ActivityCounters::default());
    }

    #[test]
    fn trailing_punctuation_does_not_break_a_token() {
        let counters = parse_boss_summary(&lines(&["금일 피해량 7.2."]));
        assert_eq!(counters.boss_damage, 7.2);
    }
}
