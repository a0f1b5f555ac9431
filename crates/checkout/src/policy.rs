//! Configurable checkout and fulfilment policies.

use std::str::FromStr;

use domain::OrderStatus;
use store::StockGuard;

/// How checkout decrements stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
    /// Reject the batch if any product would go below zero.
    #[default]
    Conditional,
    /// Decrement blindly. Concurrent checkouts can oversell.
    Unchecked,
}

impl StockPolicy {
    pub fn guard(&self) -> StockGuard {
        match self {
            StockPolicy::Conditional => StockGuard::NonNegative,
            StockPolicy::Unchecked => StockGuard::None,
        }
    }
}

impl FromStr for StockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conditional" => Ok(StockPolicy::Conditional),
            "unchecked" => Ok(StockPolicy::Unchecked),
            other => Err(format!("unknown stock policy: {other}")),
        }
    }
}

/// Which status changes administrators may make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any status may be set from any status.
    #[default]
    Permissive,
    /// Only forward moves along the fulfilment lifecycle.
    Strict,
}

impl TransitionPolicy {
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => from.can_transition_to(to),
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(format!("unknown transition policy: {other}")),
        }
    }
}

/// Whether cancelling an order returns its units to stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestockPolicy {
    #[default]
    Never,
    OnCancel,
}

impl RestockPolicy {
    pub fn from_flag(restock_on_cancel: bool) -> Self {
        if restock_on_cancel {
            RestockPolicy::OnCancel
        } else {
            RestockPolicy::Never
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policies() {
        assert_eq!("Unchecked".parse(), Ok(StockPolicy::Unchecked));
        assert_eq!(" strict ".parse(), Ok(TransitionPolicy::Strict));
        assert!("optimistic".parse::<StockPolicy>().is_err());
    }

    #[test]
    fn test_strict_policy_follows_lifecycle() {
        let strict = TransitionPolicy::Strict;
        assert!(strict.allows(OrderStatus::Processing, OrderStatus::Shipped));
        assert!(!strict.allows(OrderStatus::Delivered, OrderStatus::Cancelled));
        assert!(TransitionPolicy::Permissive.allows(OrderStatus::Delivered, OrderStatus::Cancelled));
    }

    #[test]
    fn test_conditional_policy_guards_stock() {
        assert_eq!(StockPolicy::default().guard(), StockGuard::NonNegative);
        assert_eq!(StockPolicy::Unchecked.guard(), StockGuard::None);
        assert_eq!(RestockPolicy::from_flag(true), RestockPolicy::OnCancel);
    }
}
