use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use super::{OrderRepository, PaymentNotification, PaymentStatusUpdate, StoreError, TransitionOutcome};
use crate::domain::aggregates::{Order, PaymentTransition};

#[derive(Default)]
struct Inner {
    orders: HashMap<Uuid, Order>,
    notifications: Vec<PaymentNotification>,
}

/// In-process order store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    inner: Arc<RwLock<Inner>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryOrderStore {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, order: Order) -> Result<(), StoreError> {
        self.write()?.orders.insert(order.id(), order);
        Ok(())
    }

    pub fn notifications(&self) -> Result<Vec<PaymentNotification>, StoreError> {
        Ok(self.read()?.notifications.clone())
    }

    /// Makes every subsequent call fail, simulating a database outage.
    pub fn set_unavailable(&self, unavailable: bool) { self.unavailable.store(unavailable, Ordering::SeqCst); }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".into()));
        }
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.check_available()?;
        self.inner.read().map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.check_available()?;
        self.inner.write().map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderStore {
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn apply_payment_status(&self, update: &PaymentStatusUpdate) -> Result<TransitionOutcome, StoreError> {
        let mut inner = self.write()?;
        let Some(order) = inner.orders.get_mut(&update.order_id) else { return Ok(TransitionOutcome::OrderMissing) };
        Ok(match order.apply_payment_status(update.status, &update.gateway_payment_id) {
            PaymentTransition::Applied(change) => TransitionOutcome::Applied(change),
            PaymentTransition::Unchanged => TransitionOutcome::Unchanged,
            PaymentTransition::Superseded => TransitionOutcome::Superseded { current: order.status() },
        })
    }

    async fn record_notification(&self, notification: &PaymentNotification) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let duplicate = inner.notifications.iter().any(|n| {
            n.gateway_payment_id == notification.gateway_payment_id && n.raw_status == notification.raw_status && n.source == notification.source
        });
        if !duplicate { inner.notifications.push(notification.clone()); }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{OrderStatus, StatusChange};
    use crate::domain::value_objects::{Money, PaymentMethod};
    use crate::store::NotificationSource;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn seeded() -> (MemoryOrderStore, Uuid) {
        let store = MemoryOrderStore::new();
        let order = Order::create("ORD-1", PaymentMethod::CreditCard, Money::brl(Decimal::TEN), Money::brl(Decimal::ZERO)).unwrap();
        let id = order.id();
        store.insert(order).unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_apply_then_reapply() {
        let (store, id) = seeded();
        let update = PaymentStatusUpdate { order_id: id, status: OrderStatus::Declined, gateway_payment_id: "5".into() };
        assert_eq!(
            store.apply_payment_status(&update).await.unwrap(),
            TransitionOutcome::Applied(StatusChange { from: OrderStatus::Pending, to: OrderStatus::Declined })
        );
        assert_eq!(store.apply_payment_status(&update).await.unwrap(), TransitionOutcome::Unchanged);
        assert_eq!(store.find_order(id).await.unwrap().unwrap().status(), OrderStatus::Declined);
    }

    #[tokio::test]
    async fn test_older_payment_is_superseded() {
        let (store, id) = seeded();
        let update = |status, payment: &str| PaymentStatusUpdate { order_id: id, status, gateway_payment_id: payment.into() };
        store.apply_payment_status(&update(OrderStatus::Declined, "card")).await.unwrap();
        store.apply_payment_status(&update(OrderStatus::Paid, "pix")).await.unwrap();

        assert_eq!(
            store.apply_payment_status(&update(OrderStatus::Declined, "card")).await.unwrap(),
            TransitionOutcome::Superseded { current: OrderStatus::Paid }
        );
        let order = store.find_order(id).await.unwrap().unwrap();
        assert_eq!(order.status(), OrderStatus::Paid);
        assert_eq!(order.gateway_payment_id(), Some("pix"));
    }

    #[tokio::test]
    async fn test_missing_order() {
        let (store, _) = seeded();
        let update = PaymentStatusUpdate { order_id: Uuid::new_v4(), status: OrderStatus::Paid, gateway_payment_id: "5".into() };
        assert_eq!(store.apply_payment_status(&update).await.unwrap(), TransitionOutcome::OrderMissing);
    }

    #[tokio::test]
    async fn test_duplicate_notifications_are_ignored() {
        let (store, id) = seeded();
        let n = PaymentNotification {
            gateway_payment_id: "5".into(), raw_status: "approved".into(), status_detail: None,
            order_id: Some(id), source: NotificationSource::Webhook, received_at: Utc::now(),
        };
        store.record_notification(&n).await.unwrap();
        store.record_notification(&n).await.unwrap();
        store.record_notification(&PaymentNotification { source: NotificationSource::Poll, ..n.clone() }).await.unwrap();
        assert_eq!(store.notifications().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let (store, id) = seeded();
        store.set_unavailable(true);
        assert!(matches!(store.find_order(id).await, Err(StoreError::Unavailable(_))));
    }
}
