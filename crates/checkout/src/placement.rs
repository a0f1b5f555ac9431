//! Order placement: turns a submitted cart into an order and a stock debit
//! in one atomic batch.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use domain::{
    Address, Cart, CartItem, Money, NewOrder, OrderId, ProfileUpdate, ShippingDetails, UserId,
};
use serde::{Deserialize, Serialize};
use store::{DocumentStore, StoreError, WriteBatch};
use uuid::Uuid;

use crate::error::CheckoutError;
use crate::identity::Session;
use crate::policy::StockPolicy;

/// What the shopper submits at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    /// Grand total as displayed to the shopper. Stored as submitted.
    pub total: Money,
    pub shipping: ShippingDetails,
}

impl CheckoutRequest {
    /// Builds a request from the cart's current lines and totals.
    pub fn from_cart(cart: &Cart, shipping: ShippingDetails) -> Self {
        Self {
            items: cart.items().to_vec(),
            total: cart.totals().total,
            shipping,
        }
    }
}

/// Users with a checkout that has not settled.
#[derive(Debug, Clone, Default)]
struct InFlight {
    users: Arc<Mutex<HashSet<UserId>>>,
}

impl InFlight {
    fn acquire(&self, uid: &UserId) -> Option<InFlightGuard> {
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        users.insert(uid.clone()).then(|| InFlightGuard {
            users: Arc::clone(&self.users),
            uid: uid.clone(),
        })
    }
}

/// Releases the user's slot when dropped, whatever the outcome.
struct InFlightGuard {
    users: Arc<Mutex<HashSet<UserId>>>,
    uid: UserId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.uid);
    }
}

/// Places orders.
///
/// A successful call writes exactly one order and debits each product by
/// its line quantity exactly once. A failed call writes nothing.
/// Identical submissions made one after another create separate orders.
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn DocumentStore>,
    stock_policy: StockPolicy,
    in_flight: InFlight,
}

impl CheckoutService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            stock_policy: StockPolicy::default(),
            in_flight: InFlight::default(),
        }
    }

    pub fn with_stock_policy(mut self, policy: StockPolicy) -> Self {
        self.stock_policy = policy;
        self
    }

    pub fn stock_policy(&self) -> StockPolicy {
        self.stock_policy
    }

    /// Places an order for the signed-in shopper.
    #[tracing::instrument(skip(self, session, request), fields(lines = request.items.len()))]
    pub async fn place_order(
        &self,
        session: &Session,
        request: CheckoutRequest,
    ) -> Result<OrderId, CheckoutError> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let start = Instant::now();

        let result = self.try_place_order(session, request).await;

        metrics::histogram!("checkout_duration_seconds").record(start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            metrics::counter!("checkout_failures_total", "kind" => e.kind()).increment(1);
            tracing::warn!(kind = e.kind(), error = %e, "Checkout failed");
        }
        result
    }

    async fn try_place_order(
        &self,
        session: &Session,
        request: CheckoutRequest,
    ) -> Result<OrderId, CheckoutError> {
        let identity = session.identity().ok_or(CheckoutError::AuthRequired)?;
        let uid = identity.uid.clone();

        let order = NewOrder::from_cart(uid.clone(), &request.items, request.total, request.shipping)?;

        let guard = self
            .in_flight
            .acquire(&uid)
            .ok_or(CheckoutError::CheckoutInProgress)?;

        let computed = order.computed_totals().total;
        if computed != order.total {
            tracing::debug!(
                submitted = order.total.minor(),
                computed = computed.minor(),
                "Submitted total differs from line totals"
            );
        }

        let order_id = order.id;
        let shipping = order.shipping.clone();
        let stock_guard = self.stock_policy.guard();

        let mut batch = WriteBatch::new();
        for line in &order.items {
            batch.adjust_stock(
                line.product_id.clone(),
                -i64::from(line.quantity),
                stock_guard,
            );
        }
        batch.create_order(order);

        self.store.commit(batch).await?;
        drop(guard);

        tracing::info!(order_id = %order_id, user_id = %uid, "Order placed");
        metrics::counter!("orders_placed_total").increment(1);

        if let Err(e) = self.enrich_profile(&uid, &shipping).await {
            tracing::warn!(user_id = %uid, error = %e, "Profile enrichment failed");
        }

        Ok(order_id)
    }

    /// Saves a new shipping address and the phone number on the profile.
    async fn enrich_profile(
        &self,
        uid: &UserId,
        shipping: &ShippingDetails,
    ) -> Result<(), StoreError> {
        let Some(profile) = self.store.get_profile(uid).await? else {
            tracing::debug!(user_id = %uid, "No profile to enrich");
            return Ok(());
        };

        if !profile.has_address_for(shipping) {
            let address = Address::from_shipping(
                Uuid::new_v4().to_string(),
                shipping,
                profile.addresses.is_empty(),
            );
            self.store.add_address(uid, address).await?;
        }

        let phone = shipping.phone.trim();
        if !phone.is_empty() && profile.phone != phone {
            let update = ProfileUpdate {
                phone: Some(phone.to_string()),
                ..Default::default()
            };
            self.store.update_profile(uid, update).await?;
        }

        Ok(())
    }
}
