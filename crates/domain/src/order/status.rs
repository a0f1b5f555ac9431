//! Order fulfilment status.

use serde::{Deserialize, Serialize};

/// The fulfilment status of an order.
///
/// Forward lifecycle:
/// ```text
/// Processing ──► Shipped ──► Delivered
///     │             │
///     └─────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Set by checkout; the order is being prepared.
    #[default]
    Processing,

    /// Handed to the courier.
    Shipped,

    /// Received by the customer (terminal).
    Delivered,

    /// Withdrawn by an administrator (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns true if the order can be cancelled from this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Processing | OrderStatus::Shipped)
    }

    /// Returns true if this is a terminal status under the forward lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if `target` follows this status in the forward lifecycle.
    ///
    /// Re-applying the current status is allowed.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        if *self == target {
            return true;
        }
        match target {
            OrderStatus::Processing => false,
            OrderStatus::Shipped => *self == OrderStatus::Processing,
            OrderStatus::Delivered => *self == OrderStatus::Shipped,
            OrderStatus::Cancelled => self.can_cancel(),
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_processing() {
        assert_eq!(OrderStatus::default(), OrderStatus::Processing);
    }

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn test_cancel_only_before_delivery() {
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn test_same_status_is_allowed() {
        for status in OrderStatus::ALL {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert_eq!(" Delivered ".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert!("Lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"Cancelled\"");
    }
}
