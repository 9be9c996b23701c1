//! Rule data structures.
//!
//! Rules are closed sum types: an entry rule is either an indicator
//! comparison or an order-flow heuristic reference; exit rules are plain
//! comparisons. There is no stringly-typed discriminator — an unknown
//! condition or operator cannot be represented.

use crate::domain::series::Field;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Field(Field),
    Constant(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
    CrossesAbove,
    CrossesBelow,
}

impl CompareOp {
    /// True for operators that need the previous bar as well as the current one.
    pub fn is_crossing(&self) -> bool {
        matches!(self, CompareOp::CrossesAbove | CompareOp::CrossesBelow)
    }
}

/// A single comparison between two operands at a bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub left: Operand,
    pub op: CompareOp,
    pub right: Operand,
}

/// Order-flow heuristic reference. Recognized and carried through the
/// pipeline, but opaque to the simulator: it never produces a signal.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderflowCondition {
    pub heuristic: String,
    pub lookback: usize,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryRule {
    Indicator(Condition),
    Orderflow(OrderflowCondition),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Field(field) => write!(f, "{}", field),
            Operand::Constant(v) => write!(f, "{}", v),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::CrossesAbove => "crosses_above",
            CompareOp::CrossesBelow => "crosses_below",
        };
        f.write_str(symbol)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

impl fmt::Display for EntryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryRule::Indicator(cond) => write!(f, "{}", cond),
            EntryRule::Orderflow(of) => write!(
                f,
                "orderflow({}, {}, {})",
                of.heuristic, of.lookback, of.threshold
            ),
        }
    }
}
