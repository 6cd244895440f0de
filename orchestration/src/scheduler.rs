//! Summary scheduling — decides when a recurrent summary is due.

use crate::session::DebateConfig;

/// Whether a summary should be generated before the next agent turn.
///
/// `turns_completed` is the count of turns already finished, not the
/// upcoming one. Returns true iff summarization is enabled, at least one
/// turn has completed, and `turns_completed` is a multiple of the
/// configured frequency. A frequency of 1 summarizes after every turn.
///
/// Pure function; no side effects.
pub fn should_summarize(turns_completed: usize, chain_len: usize, config: &DebateConfig) -> bool {
    if !config.summarization_enabled || chain_len == 0 || turns_completed == 0 {
        return false;
    }
    turns_completed % config.summary_frequency.max(1) as usize == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SummaryLength;

    fn config(enabled: bool, frequency: u32) -> DebateConfig {
        DebateConfig::new(enabled, frequency, SummaryLength::Medium)
    }

    #[test]
    fn test_frequency_three_truth_table() {
        let c = config(true, 3);
        for t in [3, 6, 9] {
            assert!(should_summarize(t, t, &c), "expected true at t={}", t);
        }
        for t in [1, 2, 4, 5, 7, 8] {
            assert!(!should_summarize(t, t, &c), "expected false at t={}", t);
        }
    }

    #[test]
    fn test_frequency_one_fires_every_turn() {
        let c = config(true, 1);
        for t in 1..=5 {
            assert!(should_summarize(t, t, &c));
        }
    }

    #[test]
    fn test_disabled_never_fires() {
        let c = config(false, 1);
        for t in 1..=5 {
            assert!(!should_summarize(t, t, &c));
        }
    }

    #[test]
    fn test_zero_turns_completed() {
        let c = config(true, 1);
        assert!(!should_summarize(0, 0, &c));
    }

    #[test]
    fn test_empty_chain_never_fires() {
        let c = config(true, 1);
        assert!(!should_summarize(2, 0, &c));
    }
}
