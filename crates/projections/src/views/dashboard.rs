//! Headline figures for the admin dashboard.

use domain::{Money, Order, OrderStatus};
use serde::Serialize;

/// Aggregate figures computed from the current order set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DashboardStats {
    /// Sum of totals over orders that are not cancelled.
    pub total_revenue: Money,
    pub total_orders: usize,
    pub total_customers: usize,
    /// Mean total over all orders, cancelled included. Zero with no orders.
    pub average_ticket: Money,
}

impl DashboardStats {
    pub fn compute(orders: &[Order], total_customers: usize) -> Self {
        let total_revenue = orders
            .iter()
            .filter(|o| o.status != OrderStatus::Cancelled)
            .map(|o| o.total)
            .sum();

        let gross: Money = orders.iter().map(|o| o.total).sum();
        let average_ticket = match i64::try_from(orders.len()) {
            Ok(count) if count > 0 => Money::from_minor(gross.minor() / count),
            _ => Money::zero(),
        };

        Self {
            total_revenue,
            total_orders: orders.len(),
            total_customers,
            average_ticket,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::order_at;

    #[test]
    fn test_empty_dashboard() {
        assert_eq!(DashboardStats::compute(&[], 3), DashboardStats {
            total_customers: 3,
            ..Default::default()
        });
    }

    #[test]
    fn test_cancelled_orders_excluded_from_revenue_only() {
        let orders = [
            order_at("u1", 100_000, OrderStatus::Delivered, 1_000),
            order_at("u2", 50_000, OrderStatus::Cancelled, 2_000),
        ];

        let stats = DashboardStats::compute(&orders, 2);
        assert_eq!(stats.total_revenue, Money::from_rupees(100_000));
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.average_ticket, Money::from_rupees(75_000));
    }
}
