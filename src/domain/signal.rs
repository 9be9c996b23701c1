//! Entry-signal seam.
//!
//! The simulator asks an [`EntrySignal`] whether to open a position at a
//! bar. Production backtests use [`RuleEntrySignal`], which evaluates the
//! strategy's entry rules. [`DeterministicDemoEntrySignal`] is a demo/test
//! double with no market meaning; it exists so smoke runs can produce
//! trades without a tuned rule set.

use crate::domain::rule::EntryRule;
use crate::domain::rule_eval;
use crate::domain::series::IndicatorRow;
use std::hash::{DefaultHasher, Hash, Hasher};

pub trait EntrySignal {
    fn should_enter(&self, rows: &[IndicatorRow], index: usize) -> bool;
}

/// The default entry path: the strategy's entry rules, AND-combined.
pub struct RuleEntrySignal<'a> {
    rules: &'a [EntryRule],
}

impl<'a> RuleEntrySignal<'a> {
    pub fn new(rules: &'a [EntryRule]) -> Self {
        Self { rules }
    }
}

impl EntrySignal for RuleEntrySignal<'_> {
    fn should_enter(&self, rows: &[IndicatorRow], index: usize) -> bool {
        rule_eval::evaluate_entry(rows, index, self.rules)
    }
}

/// Demo/test double, NOT a trading signal: fires on roughly 0.5% of bars
/// whose close sits in the 4000–5000 price band, chosen by hashing the bar
/// timestamp so runs are reproducible.
pub struct DeterministicDemoEntrySignal;

impl DeterministicDemoEntrySignal {
    const ACTIVATION_MODULUS: u64 = 200;

    fn activates(timestamp_ms: i64) -> bool {
        let mut hasher = DefaultHasher::new();
        timestamp_ms.hash(&mut hasher);
        hasher.finish() % Self::ACTIVATION_MODULUS == 0
    }
}

impl EntrySignal for DeterministicDemoEntrySignal {
    fn should_enter(&self, rows: &[IndicatorRow], index: usize) -> bool {
        let Some(row) = rows.get(index) else {
            return false;
        };
        let close = row.candle.close;
        (4000.0..=5000.0).contains(&close)
            && Self::activates(row.candle.timestamp.timestamp_millis())
    }
}
