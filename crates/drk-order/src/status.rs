//! Order status: two values, one transition.
//!
//! The `order.status` column is free text on legacy databases. Reads go
//! through [`OrderStatus::classify`]; writes only ever store one of the two
//! canonical labels.
//!
//! ```text
//!   (empty / 未完成 / anything else) ── complete() ──► 已完成
//!                                                      │
//!                                                      └─ complete() ─► 已完成
//! ```
//!
//! There is no way back from `Finished`.

use serde::{Deserialize, Serialize};

pub const UNFINISHED_LABEL: &str = "未完成";
pub const FINISHED_LABEL: &str = "已完成";

/// How a raw status string is matched against the finished label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMatchRule {
    /// Only the exact finished label counts.
    Exact,
    /// Any value sharing the finished label's first character ("已") counts.
    #[default]
    Prefix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Unfinished,
    Finished,
}

impl OrderStatus {
    /// Classify a raw status column value. Absent, blank and unrecognised
    /// values are all `Unfinished`.
    pub fn classify(raw: Option<&str>, rule: StatusMatchRule) -> Self {
        let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return OrderStatus::Unfinished;
        };

        let finished = match rule {
            StatusMatchRule::Exact => s == FINISHED_LABEL,
            StatusMatchRule::Prefix => FINISHED_LABEL
                .chars()
                .next()
                .map(|c| s.starts_with(c))
                .unwrap_or(false),
        };

        if finished {
            OrderStatus::Finished
        } else {
            OrderStatus::Unfinished
        }
    }

    /// The staff "mark complete" transition.
    pub fn complete(self) -> Self {
        OrderStatus::Finished
    }

    pub fn is_finished(self) -> bool {
        matches!(self, OrderStatus::Finished)
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Unfinished => UNFINISHED_LABEL,
            OrderStatus::Finished => FINISHED_LABEL,
        }
    }

    /// Label checkout should persist given the current raw value, or `None`
    /// when the stored value must be left alone (already finished).
    pub fn checkout_write(current: Option<&str>, rule: StatusMatchRule) -> Option<&'static str> {
        match Self::classify(current, rule) {
            OrderStatus::Finished => None,
            OrderStatus::Unfinished => Some(UNFINISHED_LABEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_trimmed_before_matching() {
        assert_eq!(
            OrderStatus::classify(Some("  已完成 "), StatusMatchRule::Exact),
            OrderStatus::Finished
        );
        assert_eq!(
            OrderStatus::classify(Some("   "), StatusMatchRule::Prefix),
            OrderStatus::Unfinished
        );
    }

    #[test]
    fn complete_is_idempotent() {
        let s = OrderStatus::Unfinished.complete();
        assert_eq!(s, OrderStatus::Finished);
        assert_eq!(s.complete(), OrderStatus::Finished);
    }
}
