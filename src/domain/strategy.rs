//! Strategy configuration: rules plus exit policy.

use crate::domain::rule::{Condition, EntryRule};

/// One tick is a quarter of a price unit.
pub const TICK_SIZE: f64 = 0.25;

/// How a stop-loss / take-profit distance is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    /// Percent of the entry price.
    Percentage,
    /// Absolute price units.
    Points,
    /// Ticks of 0.25 price units.
    Ticks,
    /// Multiples of the ATR value at the evaluated bar.
    AtrMultiple,
}

impl ThresholdKind {
    pub fn parse(name: &str) -> Option<ThresholdKind> {
        match name.to_ascii_lowercase().as_str() {
            "percentage" => Some(ThresholdKind::Percentage),
            "points" => Some(ThresholdKind::Points),
            "ticks" => Some(ThresholdKind::Ticks),
            "atr" => Some(ThresholdKind::AtrMultiple),
            _ => None,
        }
    }
}

/// A stop-loss or take-profit distance from the entry price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopRule {
    pub kind: ThresholdKind,
    pub value: f64,
}

impl StopRule {
    /// Price distance from entry, or `None` when the distance depends on an
    /// ATR value that is still warming up.
    fn offset(&self, entry_price: f64, atr: Option<f64>) -> Option<f64> {
        match self.kind {
            ThresholdKind::Percentage => Some(entry_price * self.value / 100.0),
            ThresholdKind::Points => Some(self.value),
            ThresholdKind::Ticks => Some(self.value * TICK_SIZE),
            ThresholdKind::AtrMultiple => atr.map(|atr| self.value * atr),
        }
    }

    /// Stop price below entry for a long position.
    pub fn stop_threshold(&self, entry_price: f64, atr: Option<f64>) -> Option<f64> {
        self.offset(entry_price, atr).map(|off| entry_price - off)
    }

    /// Target price above entry for a long position.
    pub fn target_threshold(&self, entry_price: f64, atr: Option<f64>) -> Option<f64> {
        self.offset(entry_price, atr).map(|off| entry_price + off)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub entry_rules: Vec<EntryRule>,
    pub exit_rules: Vec<Condition>,
    pub stop_loss: Option<StopRule>,
    pub take_profit: Option<StopRule>,
    /// Close after this many bars in position, if set.
    pub max_hold_bars: Option<usize>,
}
