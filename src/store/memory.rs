//! In-Memory Order Store
//!
//! [`OrderStore`] over process-local tables with the same four-table layout
//! and the same write plan as the Postgres store. An upsert stages every
//! statement on a copy of the tables and swaps it in only after all steps,
//! finalization and commit succeed. A [`FailPoint`] forces a failure at any of
//! those stages.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{StorageCause, StoreError, StoreResult};
use crate::models::{Delivery, Item, Order, Payment};
use crate::store::{check_identifier, prepare_for_write, OrderStore, Statement, WriteBatch};

// == Fail Point ==
/// Where an injected failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Statement at this index of the write batch
    Step(usize),
    /// After all statements, before commit
    Finalize,
    /// At commit
    Commit,
    /// Every read
    Read,
}

// == Tables ==
#[derive(Debug, Clone, Default)]
struct Tables {
    /// Header rows; nested records are kept empty
    orders: HashMap<String, Order>,
    payments: HashMap<String, Payment>,
    deliveries: HashMap<String, Delivery>,
    /// Item rows keyed by their sequence id, so iteration is insertion order
    items: BTreeMap<i64, (String, Item)>,
    next_item_id: i64,
}

impl Tables {
    fn apply(&mut self, statement: &Statement<'_>) {
        match *statement {
            Statement::UpsertHeader(order) => {
                let header = Order {
                    delivery: Delivery::default(),
                    payment: Payment::default(),
                    items: Vec::new(),
                    ..order.clone()
                };
                self.orders.insert(order.order_uid.clone(), header);
            }
            Statement::UpsertPayment { order_uid, payment } => {
                self.payments.insert(order_uid.to_string(), payment.clone());
            }
            Statement::UpsertDelivery {
                order_uid,
                delivery,
            } => {
                self.deliveries
                    .insert(order_uid.to_string(), delivery.clone());
            }
            Statement::DeleteItems { order_uid } => {
                self.items.retain(|_, (owner, _)| owner != order_uid);
            }
            Statement::InsertItem { order_uid, item } => {
                self.next_item_id += 1;
                self.items
                    .insert(self.next_item_id, (order_uid.to_string(), item.clone()));
            }
        }
    }

    fn items_of(&self, order_uid: &str) -> Vec<Item> {
        self.items
            .values()
            .filter(|(owner, _)| owner == order_uid)
            .map(|(_, item)| item.clone())
            .collect()
    }
}

// == Memory Order Store ==
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    tables: RwLock<Tables>,
    fail_point: Mutex<Option<FailPoint>>,
    /// Number of operations that reached the tables
    accesses: AtomicUsize,
    /// Number of committed upserts
    commits: AtomicUsize,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms (or with `None`, disarms) an injected failure.
    pub fn set_fail_point(&self, fail_point: Option<FailPoint>) {
        if let Ok(mut guard) = self.fail_point.lock() {
            *guard = fail_point;
        }
    }

    fn fail_point(&self) -> Option<FailPoint> {
        self.fail_point.lock().ok().and_then(|guard| *guard)
    }

    /// Number of reads and writes that touched the tables.
    pub fn storage_accesses(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    /// Number of upserts that committed.
    pub fn committed_upserts(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Number of item rows stored for `order_uid`.
    pub async fn item_rows(&self, order_uid: &str) -> usize {
        self.tables.read().await.items_of(order_uid).len()
    }

    /// Drops the payment row, leaving the header behind.
    pub async fn remove_payment(&self, order_uid: &str) {
        self.tables.write().await.payments.remove(order_uid);
    }

    /// Drops the delivery row, leaving the header behind.
    pub async fn remove_delivery(&self, order_uid: &str) {
        self.tables.write().await.deliveries.remove(order_uid);
    }

    fn injected(context: impl Into<String>) -> StoreError {
        StoreError::storage(context, StorageCause::Fault("injected failure".to_string()))
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn get_order(&self, order_uid: &str) -> StoreResult<Order> {
        check_identifier(order_uid)?;
        self.accesses.fetch_add(1, Ordering::SeqCst);
        if self.fail_point() == Some(FailPoint::Read) {
            return Err(Self::injected("get_order_header"));
        }

        let tables = self.tables.read().await;
        let mut order = tables
            .orders
            .get(order_uid)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        order.payment = tables
            .payments
            .get(order_uid)
            .cloned()
            .ok_or_else(|| StoreError::Inconsistent("payment missing".to_string()))?;
        order.delivery = tables
            .deliveries
            .get(order_uid)
            .cloned()
            .ok_or_else(|| StoreError::Inconsistent("delivery missing".to_string()))?;
        order.items = tables.items_of(order_uid);
        Ok(order)
    }

    async fn list_recent_ids(&self, limit: i64) -> StoreResult<Vec<String>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        self.accesses.fetch_add(1, Ordering::SeqCst);
        if self.fail_point() == Some(FailPoint::Read) {
            return Err(Self::injected("list_recent_ids"));
        }

        let tables = self.tables.read().await;
        let mut headers: Vec<&Order> = tables.orders.values().collect();
        headers.sort_by(|a, b| b.date_created.cmp(&a.date_created));
        Ok(headers
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|order| order.order_uid.clone())
            .collect())
    }

    async fn upsert_order(&self, order: &Order) -> StoreResult<Order> {
        let order = prepare_for_write(order)?;
        let batch = WriteBatch::for_order(&order);
        self.accesses.fetch_add(1, Ordering::SeqCst);
        let fail_point = self.fail_point();

        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();

        for (index, statement) in batch.statements().iter().enumerate() {
            if fail_point == Some(FailPoint::Step(index)) {
                return Err(Self::injected(format!("batch step {index}")));
            }
            staged.apply(statement);
        }
        if fail_point == Some(FailPoint::Finalize) {
            return Err(Self::injected("batch finalize"));
        }
        if fail_point == Some(FailPoint::Commit) {
            return Err(Self::injected("commit"));
        }

        *tables = staged;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(order)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
