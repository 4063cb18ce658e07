use threadloom_types::{ThreadMessageRecord, ThreadRecord, Usage};

use crate::active::derive_active_history;
use crate::tokens::{payload_text, TokenCounter};

/// Token count of the given records' payload text
pub fn aggregate_context_size(records: &[ThreadMessageRecord], counter: &dyn TokenCounter) -> u64 {
    records
        .iter()
        .map(|record| counter.count(&payload_text(&record.message)))
        .fold(0u64, u64::saturating_add)
}

/// Thread-level usage.
///
/// Output tokens, duration and cost are summed over all non-deleted history.
/// Input tokens are the token count of the active history, re-tokenized from
/// its text rather than summed from per-message inputs.
pub fn aggregate_usage(
    history: &[ThreadMessageRecord],
    last_compaction_ordinal: Option<u64>,
    counter: &dyn TokenCounter,
) -> Usage {
    let mut usage = history
        .iter()
        .filter(|m| !m.is_deleted())
        .fold(Usage::default(), |acc, m| acc + m.usage);
    let active = derive_active_history(history, last_compaction_ordinal);
    usage.input_tokens = aggregate_context_size(&active, counter);
    usage
}

/// Recompute `context_size` and `usage` from the thread's history.
pub fn refresh_derived(thread: &mut ThreadRecord, counter: &dyn TokenCounter) {
    let active = derive_active_history(&thread.history, thread.last_compaction_ordinal);
    thread.context_size = aggregate_context_size(&active, counter);
    thread.usage = aggregate_usage(&thread.history, thread.last_compaction_ordinal, counter);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::CharEstimateCounter;
    use chrono::Utc;
    use serde_json::json;

    fn record(ordinal: u64, text: &str, usage: Usage) -> ThreadMessageRecord {
        ThreadMessageRecord::new(
            format!("m{ordinal}"),
            ordinal,
            json!({"role": "user", "content": text}),
            Utc::now(),
        )
        .with_usage(usage)
    }

    #[test]
    fn test_usage_sums_outputs_and_retokenizes_inputs() {
        let counter = CharEstimateCounter;
        let history = vec![
            record(1, "abcd", Usage::new(10, 1, 100)),
            record(2, "abcdefgh", Usage::new(3, 8, 250).with_cost(0.5)),
        ];

        let usage = aggregate_usage(&history, None, &counter);
        assert_eq!(usage.input_tokens, 3);
        assert_eq!(usage.output_tokens, 9);
        assert_eq!(usage.total_duration_ms, 350);
        assert_eq!(usage.total_cost_usd, 0.5);
    }

    #[test]
    fn test_deleted_records_do_not_count() {
        let counter = CharEstimateCounter;
        let mut history = vec![
            record(1, "abcd", Usage::new(1, 1, 1)),
            record(2, "abcd", Usage::new(1, 5, 5)),
        ];
        history[1].deleted_at = Some(Utc::now());

        let usage = aggregate_usage(&history, None, &counter);
        assert_eq!(usage.output_tokens, 1);
        assert_eq!(usage.input_tokens, 1);
    }

    #[test]
    fn test_compacted_records_keep_their_cost_but_not_their_tokens() {
        let counter = CharEstimateCounter;
        let history = vec![
            record(1, "abcdefgh", Usage::new(0, 4, 10)),
            record(2, "abcd", Usage::new(0, 2, 10)),
        ];

        let usage = aggregate_usage(&history, Some(1), &counter);
        assert_eq!(usage.output_tokens, 6);
        assert_eq!(usage.input_tokens, 1);
    }

    #[test]
    fn test_huge_usage_saturates_instead_of_overflowing() {
        let counter = CharEstimateCounter;
        let history = vec![
            record(1, "abcd", Usage::new(0, u64::MAX, u64::MAX)),
            record(2, "abcd", Usage::new(0, u64::MAX, 1)),
        ];

        let usage = aggregate_usage(&history, None, &counter);
        assert_eq!(usage.output_tokens, u64::MAX);
        assert_eq!(usage.total_duration_ms, u64::MAX);
        assert_eq!(usage.input_tokens, 2);
    }

    #[test]
    fn test_refresh_derived_sets_both_caches() {
        let counter = CharEstimateCounter;
        let mut thread = ThreadRecord::new("t1", "u1", "t", json!({}), Utc::now());
        thread.history.push(record(1, "abcdefgh", Usage::new(0, 3, 0)));
        thread.context_size = 999;

        refresh_derived(&mut thread, &counter);
        assert_eq!(thread.context_size, 2);
        assert_eq!(thread.usage.input_tokens, 2);
        assert_eq!(thread.usage.output_tokens, 3);
    }
}
