//! Rule evaluation against an indicator-augmented series.
//!
//! # Evaluation semantics
//!
//! - Operands resolve to `None` when the row index is out of bounds or the
//!   referenced column is still warming up; a condition with an unresolvable
//!   operand evaluates to `false`, never panics.
//! - Equality comparisons are float-tolerant (epsilon 1e-6).
//! - `crosses_above`/`crosses_below` require `index >= 1` and compare the
//!   previous bar too: the current bar must satisfy the strict inequality
//!   while the previous bar did not.
//! - Rule lists combine with AND; an empty list never signals.
//! - Order-flow clauses are opaque heuristics: they log and produce no signal.

use crate::domain::rule::{CompareOp, Condition, EntryRule, Operand};
use crate::domain::series::IndicatorRow;

pub const EPSILON: f64 = 1e-6;

pub fn resolve_operand(rows: &[IndicatorRow], index: usize, operand: &Operand) -> Option<f64> {
    if index >= rows.len() {
        return None;
    }
    match operand {
        Operand::Constant(v) => Some(*v),
        Operand::Field(field) => rows[index].field(*field),
    }
}

/// Scalar comparison for the non-crossing operators. Crossing operators
/// degrade to their instantaneous strict inequality here; two-bar detection
/// lives in [`evaluate_condition`].
pub fn apply_operator(left: f64, op: CompareOp, right: f64) -> bool {
    match op {
        CompareOp::Gt | CompareOp::CrossesAbove => left > right,
        CompareOp::Gte => left >= right,
        CompareOp::Lt | CompareOp::CrossesBelow => left < right,
        CompareOp::Lte => left <= right,
        CompareOp::Eq => (left - right).abs() < EPSILON,
        CompareOp::Ne => (left - right).abs() >= EPSILON,
    }
}

pub fn evaluate_condition(rows: &[IndicatorRow], index: usize, cond: &Condition) -> bool {
    let (Some(left), Some(right)) = (
        resolve_operand(rows, index, &cond.left),
        resolve_operand(rows, index, &cond.right),
    ) else {
        log::debug!("condition '{}' unresolved at bar {}, no signal", cond, index);
        return false;
    };

    if !cond.op.is_crossing() {
        return apply_operator(left, cond.op, right);
    }

    if index == 0 {
        return false;
    }
    let (Some(prev_left), Some(prev_right)) = (
        resolve_operand(rows, index - 1, &cond.left),
        resolve_operand(rows, index - 1, &cond.right),
    ) else {
        return false;
    };

    if cond.op == CompareOp::CrossesAbove {
        left > right && prev_left <= prev_right
    } else {
        left < right && prev_left >= prev_right
    }
}

/// All rules must hold (AND). An empty rule list never fires.
pub fn evaluate_entry(rows: &[IndicatorRow], index: usize, rules: &[EntryRule]) -> bool {
    if rules.is_empty() {
        return false;
    }
    rules.iter().all(|rule| match rule {
        EntryRule::Indicator(cond) => evaluate_condition(rows, index, cond),
        EntryRule::Orderflow(of) => {
            log::debug!(
                "order-flow heuristic '{}' is opaque to the simulator, no signal",
                of.heuristic
            );
            false
        }
    })
}

/// All exit conditions must hold (AND). An empty list never fires.
pub fn evaluate_exit(rows: &[IndicatorRow], index: usize, rules: &[Condition]) -> bool {
    !rules.is_empty() && rules.iter().all(|cond| evaluate_condition(rows, index, cond))
}
