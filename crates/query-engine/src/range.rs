//! Numeric range arguments.
//!
//! Range-valued predicates (`-version 2..4`, `-depth >=3`) parse their
//! argument once into a [`NumericRange`] and keep it in leaf metadata, so
//! evaluation is a pair of bound checks per subject. Every accepted form
//! reduces to optional inclusive bounds: `>=3` is `3..`, `<3` is `..2` and a
//! bare `3` is `3..3`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

/// An inclusive integer interval; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericRange {
    min: Option<i64>,
    max: Option<i64>,
}

impl NumericRange {
    /// Parses `A..B`, `A..`, `..B`, `>N`, `>=N`, `<N`, `<=N`, `=N` or `N`.
    pub fn parse(raw: &str) -> Result<Self> {
        let text = raw.trim();

        let range = if let Some((start, end)) = text.split_once("..") {
            if start.trim().is_empty() && end.trim().is_empty() {
                return Err(invalid(raw, "needs at least one bound"));
            }
            Self::between(optional_bound(start, raw)?, optional_bound(end, raw)?)
        } else if let Some(rest) = text.strip_prefix(">=") {
            Self::between(Some(bound(rest, raw)?), None)
        } else if let Some(rest) = text.strip_prefix("<=") {
            Self::between(None, Some(bound(rest, raw)?))
        } else if let Some(rest) = text.strip_prefix('>') {
            let min = bound(rest, raw)?.checked_add(1);
            Self::between(Some(min.ok_or_else(|| invalid(raw, "matches nothing"))?), None)
        } else if let Some(rest) = text.strip_prefix('<') {
            let max = bound(rest, raw)?.checked_sub(1);
            Self::between(None, Some(max.ok_or_else(|| invalid(raw, "matches nothing"))?))
        } else {
            let value = bound(text.strip_prefix('=').unwrap_or(text), raw)?;
            Self::exactly(value)
        };

        if range.is_empty() {
            return Err(invalid(raw, "has its start after its end"));
        }
        Ok(range)
    }

    /// Inclusive range between two bounds; either side may be open.
    pub fn between(min: Option<i64>, max: Option<i64>) -> Self {
        Self { min, max }
    }

    pub fn exactly(value: i64) -> Self {
        Self::between(Some(value), Some(value))
    }

    pub fn min(&self) -> Option<i64> {
        self.min
    }

    pub fn max(&self) -> Option<i64> {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min > max)
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => write!(f, "{min}"),
            (min, max) => {
                if let Some(min) = min {
                    write!(f, "{min}")?;
                }
                f.write_str("..")?;
                match max {
                    Some(max) => write!(f, "{max}"),
                    None => Ok(()),
                }
            }
        }
    }
}

fn optional_bound(text: &str, raw: &str) -> Result<Option<i64>> {
    if text.trim().is_empty() {
        Ok(None)
    } else {
        bound(text, raw).map(Some)
    }
}

fn bound(text: &str, raw: &str) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| invalid(raw, "is not an integer range"))
}

fn invalid(raw: &str, problem: &str) -> QueryError {
    QueryError::InvalidOrMissingArgument(format!("range {raw:?} {problem}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_number_is_exact() {
        let range = NumericRange::parse("42").expect("parse");
        assert_eq!(range, NumericRange::exactly(42));
        assert!(range.contains(42));
        assert!(!range.contains(41));
        assert_eq!(NumericRange::parse("=42").expect("parse"), range);
    }

    #[test]
    fn comparisons_become_bounds() {
        assert_eq!(
            NumericRange::parse("<10").expect("parse"),
            NumericRange::between(None, Some(9))
        );
        assert_eq!(
            NumericRange::parse(">= 10").expect("parse"),
            NumericRange::between(Some(10), None)
        );
        assert_eq!(
            NumericRange::parse(">10").expect("parse"),
            NumericRange::between(Some(11), None)
        );
        assert_eq!(
            NumericRange::parse("<=10").expect("parse"),
            NumericRange::between(None, Some(10))
        );
    }

    #[test]
    fn inclusive_range() {
        let range = NumericRange::parse("2..8").expect("parse");
        assert!(range.contains(2));
        assert!(range.contains(8));
        assert!(!range.contains(1));
        assert!(!range.contains(9));
    }

    #[test]
    fn open_ended_ranges() {
        let from = NumericRange::parse("5..").expect("parse");
        assert!(from.contains(i64::MAX));
        assert!(!from.contains(4));

        let to = NumericRange::parse("..5").expect("parse");
        assert!(to.contains(-100));
        assert!(!to.contains(6));
    }

    #[test]
    fn negative_bounds() {
        let range = NumericRange::parse("-3..-1").expect("parse");
        assert!(range.contains(-2));
        assert!(!range.contains(0));
    }

    #[test]
    fn unsatisfiable_ranges_are_rejected() {
        for raw in ["9..1", "<-9223372036854775808", ">9223372036854775807"] {
            let err = NumericRange::parse(raw).expect_err(raw);
            assert!(matches!(err, QueryError::InvalidOrMissingArgument(_)));
        }
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(NumericRange::parse("").is_err());
        assert!(NumericRange::parse("lots").is_err());
        assert!(NumericRange::parse("..").is_err());
        assert!(NumericRange::parse(">=").is_err());
        assert!(NumericRange::parse("1..x").is_err());
    }

    #[test]
    fn display_uses_range_syntax() {
        for (raw, shown) in [("7", "7"), ("<=7", "..7"), (">7", "8.."), ("1..9", "1..9")] {
            let range = NumericRange::parse(raw).expect("parse");
            assert_eq!(range.to_string(), shown);
        }
    }
}
