use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SortError;

/// Direction applied uniformly by every algorithm
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

impl Order {
    /// True when `a` must move past `b`, i.e. the adjacent pair `(a, b)` is out of order.
    ///
    /// Strict, so equal elements are never exchanged or shifted.
    #[inline]
    pub fn out_of_order<T: PartialOrd>(self, a: &T, b: &T) -> bool {
        match self {
            Order::Ascending => a > b,
            Order::Descending => a < b,
        }
    }

    /// Merge tie-break: whether the head of the left run is emitted before the right head.
    ///
    /// Ascending takes the left on `<=`. Descending flips the test to `>=`; both prefer the
    /// left head on ties, but only the ascending path is documented as stable.
    #[inline]
    pub fn take_left<T: PartialOrd>(self, left: &T, right: &T) -> bool {
        match self {
            Order::Ascending => left <= right,
            Order::Descending => left >= right,
        }
    }

    /// Check that every adjacent pair satisfies this order
    pub fn is_sorted<T: PartialOrd>(self, data: &[T]) -> bool {
        data.windows(2).all(|w| !self.out_of_order(&w[0], &w[1]))
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Ascending => write!(f, "Ascending"),
            Order::Descending => write!(f, "Descending"),
        }
    }
}

impl FromStr for Order {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Order::Ascending),
            "desc" | "descending" => Ok(Order::Descending),
            other => Err(SortError::UnknownOrder(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_order_is_strict() {
        assert!(Order::Ascending.out_of_order(&2, &1));
        assert!(!Order::Ascending.out_of_order(&1, &1));
        assert!(Order::Descending.out_of_order(&1, &2));
        assert!(!Order::Descending.out_of_order(&2, &2));
    }

    #[test]
    fn test_take_left_on_ties() {
        assert!(Order::Ascending.take_left(&3, &3));
        assert!(Order::Descending.take_left(&3, &3));
        assert!(!Order::Ascending.take_left(&4, &3));
        assert!(!Order::Descending.take_left(&3, &4));
    }

    #[test]
    fn test_parse() {
        assert_eq!("asc".parse::<Order>().unwrap(), Order::Ascending);
        assert_eq!("Descending".parse::<Order>().unwrap(), Order::Descending);
        assert!(matches!("sideways".parse::<Order>(), Err(SortError::UnknownOrder(_))));
    }

    #[test]
    fn test_is_sorted() {
        assert!(Order::Ascending.is_sorted(&[1, 1, 2, 3]));
        assert!(Order::Descending.is_sorted(&[3, 2, 2, 1]));
        assert!(!Order::Descending.is_sorted(&[1, 2]));
        assert!(Order::Ascending.is_sorted::<i32>(&[]));
    }
}
