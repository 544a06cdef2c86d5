//! PostgreSQL Order Store
//!
//! [`OrderStore`] backed by a shared `sqlx::PgPool`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgQueryResult};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{StorageCause, StoreError, StoreResult};
use crate::models::{Delivery, Item, Order, Payment};
use crate::store::queries::*;
use crate::store::{
    check_identifier, prepare_for_write, OrderStore, Statement, WriteBatch, DEFAULT_QUERY_TIMEOUT,
    DEFAULT_TX_TIMEOUT,
};

// == Pool Settings ==
const MAX_CONNECTIONS: u32 = 20;
const MIN_CONNECTIONS: u32 = 0;
const MAX_IDLE_TIME: Duration = Duration::from_secs(2 * 60);
const MAX_LIFETIME: Duration = Duration::from_secs(45 * 60);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

// == Pg Order Store ==
/// Order store over PostgreSQL.
///
/// Every read query runs under `query_timeout`; a whole upsert transaction runs
/// under `tx_timeout`.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
    query_timeout: Duration,
    tx_timeout: Duration,
}

impl PgOrderStore {
    // == Constructors ==
    /// Wraps an existing pool with the default timeouts.
    pub fn new(pool: PgPool) -> Self {
        Self::with_timeouts(pool, DEFAULT_QUERY_TIMEOUT, DEFAULT_TX_TIMEOUT)
    }

    pub fn with_timeouts(pool: PgPool, query_timeout: Duration, tx_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
            tx_timeout,
        }
    }

    /// Opens the connection pool shared by the read path and the consumer.
    pub async fn connect(
        dsn: &str,
        query_timeout: Duration,
        tx_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .min_connections(MIN_CONNECTIONS)
            .idle_timeout(MAX_IDLE_TIME)
            .max_lifetime(MAX_LIFETIME)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(dsn)
            .await?;

        Ok(Self::with_timeouts(pool, query_timeout, tx_timeout))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // == Bounded Query ==
    /// Runs one query under the read timeout, tagging failures with `context`.
    async fn bounded<T, F>(&self, context: &'static str, query: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match timeout(self.query_timeout, query).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(StoreError::storage(context, err)),
            Err(_) => Err(StoreError::storage(
                context,
                StorageCause::Timeout(self.query_timeout),
            )),
        }
    }

    // == Sub-reads ==
    async fn get_order_header(&self, order_uid: &str) -> StoreResult<Order> {
        let header = self
            .bounded(
                "get_order_header",
                sqlx::query_as::<_, Order>(SELECT_ORDER)
                    .bind(order_uid)
                    .fetch_optional(&self.pool),
            )
            .await?;

        header.ok_or(StoreError::NotFound)
    }

    async fn get_payment(&self, order_uid: &str) -> StoreResult<Payment> {
        let payment = self
            .bounded(
                "get_payment",
                sqlx::query_as::<_, Payment>(SELECT_PAYMENT)
                    .bind(order_uid)
                    .fetch_optional(&self.pool),
            )
            .await?;

        payment.ok_or_else(|| StoreError::Inconsistent("payment missing".to_string()))
    }

    async fn get_delivery(&self, order_uid: &str) -> StoreResult<Delivery> {
        let delivery = self
            .bounded(
                "get_delivery",
                sqlx::query_as::<_, Delivery>(SELECT_DELIVERY)
                    .bind(order_uid)
                    .fetch_optional(&self.pool),
            )
            .await?;

        delivery.ok_or_else(|| StoreError::Inconsistent("delivery missing".to_string()))
    }

    async fn get_items(&self, order_uid: &str) -> StoreResult<Vec<Item>> {
        self.bounded(
            "get_items",
            sqlx::query_as::<_, Item>(SELECT_ITEMS)
                .bind(order_uid)
                .fetch_all(&self.pool),
        )
        .await
    }

    // == Transactional Write ==
    /// Executes the batch inside one transaction.
    ///
    /// The transaction is rolled back explicitly on every failure path. Any
    /// other early exit (timeout, a dropped future, a panic) drops the
    /// uncommitted `Transaction`, which rolls it back as well; only a
    /// successful `commit` releases it.
    async fn write_batch(&self, batch: &WriteBatch<'_>) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| StoreError::storage("begin tx", err))?;

        for (index, statement) in batch.statements().iter().enumerate() {
            if let Err(err) = execute(statement, &mut *tx).await {
                rollback(tx).await;
                return Err(StoreError::storage(format!("batch step {index}"), err));
            }
        }

        if let Err(err) = sqlx::query(FINALIZE_BATCH).execute(&mut *tx).await {
            rollback(tx).await;
            return Err(StoreError::storage("batch finalize", err));
        }

        tx.commit()
            .await
            .map_err(|err| StoreError::storage("commit", err))
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn get_order(&self, order_uid: &str) -> StoreResult<Order> {
        check_identifier(order_uid)?;

        let mut order = self.get_order_header(order_uid).await?;
        order.payment = self.get_payment(order_uid).await?;
        order.delivery = self.get_delivery(order_uid).await?;
        order.items = self.get_items(order_uid).await?;
        Ok(order)
    }

    async fn list_recent_ids(&self, limit: i64) -> StoreResult<Vec<String>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        self.bounded(
            "list_recent_ids",
            sqlx::query_scalar::<_, String>(SELECT_RECENT_IDS)
                .bind(limit)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn upsert_order(&self, order: &Order) -> StoreResult<Order> {
        let order = prepare_for_write(order)?;
        let batch = WriteBatch::for_order(&order);

        match timeout(self.tx_timeout, self.write_batch(&batch)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(StoreError::storage(
                    "upsert transaction",
                    StorageCause::Timeout(self.tx_timeout),
                ))
            }
        }

        debug!(order_uid = %order.order_uid, steps = batch.len(), "Order upserted");
        Ok(order)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.bounded("ping", sqlx::query_scalar::<_, i32>(PING).fetch_one(&self.pool))
            .await
            .map(|_| ())
    }
}

// == Statement Execution ==
async fn execute(
    statement: &Statement<'_>,
    conn: &mut PgConnection,
) -> Result<PgQueryResult, sqlx::Error> {
    match *statement {
        Statement::UpsertHeader(order) => {
            sqlx::query(UPSERT_ORDER)
                .bind(&order.order_uid)
                .bind(&order.track_number)
                .bind(&order.entry)
                .bind(&order.locale)
                .bind(&order.internal_signature)
                .bind(&order.customer_id)
                .bind(&order.delivery_service)
                .bind(&order.shard_key)
                .bind(order.sm_id)
                .bind(order.date_created)
                .bind(&order.oof_shard)
                .execute(&mut *conn)
                .await
        }
        Statement::UpsertPayment { order_uid, payment } => {
            sqlx::query(UPSERT_PAYMENT)
                .bind(order_uid)
                .bind(&payment.transaction_id)
                .bind(&payment.request_id)
                .bind(&payment.currency)
                .bind(&payment.provider)
                .bind(payment.amount)
                .bind(payment.payment_dt)
                .bind(&payment.bank)
                .bind(payment.delivery_cost)
                .bind(payment.goods_total)
                .bind(payment.custom_fee)
                .execute(&mut *conn)
                .await
        }
        Statement::UpsertDelivery {
            order_uid,
            delivery,
        } => {
            sqlx::query(UPSERT_DELIVERY)
                .bind(order_uid)
                .bind(&delivery.name)
                .bind(&delivery.phone)
                .bind(&delivery.zip)
                .bind(&delivery.city)
                .bind(&delivery.address)
                .bind(&delivery.region)
                .bind(&delivery.email)
                .execute(&mut *conn)
                .await
        }
        Statement::DeleteItems { order_uid } => {
            sqlx::query(DELETE_ITEMS)
                .bind(order_uid)
                .execute(&mut *conn)
                .await
        }
        Statement::InsertItem { order_uid, item } => {
            sqlx::query(INSERT_ITEM)
                .bind(order_uid)
                .bind(item.chrt_id)
                .bind(&item.track_number)
                .bind(item.price)
                .bind(&item.rid)
                .bind(&item.name)
                .bind(item.sale)
                .bind(&item.size)
                .bind(item.total_price)
                .bind(item.nm_id)
                .bind(&item.brand)
                .bind(item.status)
                .execute(&mut *conn)
                .await
        }
    }
}

async fn rollback(tx: Transaction<'static, Postgres>) {
    if let Err(err) = tx.rollback().await {
        warn!(error = %err, "Transaction rollback failed");
    }
}
