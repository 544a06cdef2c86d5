//! SQL text for the order store.

pub const SELECT_ORDER: &str = r#"
SELECT order_uid, track_number, entry, locale, internal_signature, customer_id,
       delivery_service, shardkey, sm_id, date_created, oof_shard
FROM orders
WHERE order_uid = $1
"#;

pub const SELECT_PAYMENT: &str = r#"
SELECT transaction_id, request_id, currency, provider, amount, payment_dt,
       bank, delivery_cost, goods_total, custom_fee
FROM order_payment
WHERE order_uid = $1
"#;

pub const SELECT_DELIVERY: &str = r#"
SELECT name, phone, zip, city, address, region, email
FROM order_delivery
WHERE order_uid = $1
"#;

pub const SELECT_ITEMS: &str = r#"
SELECT chrt_id, track_number, price, rid, name, sale, size,
       total_price, nm_id, brand, status
FROM order_items
WHERE order_uid = $1
ORDER BY id
"#;

pub const SELECT_RECENT_IDS: &str = r#"
SELECT order_uid
FROM orders
ORDER BY date_created DESC
LIMIT $1
"#;

pub const UPSERT_ORDER: &str = r#"
INSERT INTO orders (
    order_uid, track_number, entry, locale, internal_signature, customer_id,
    delivery_service, shardkey, sm_id, date_created, oof_shard
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
ON CONFLICT (order_uid)
DO UPDATE SET track_number = EXCLUDED.track_number,
              entry = EXCLUDED.entry,
              locale = EXCLUDED.locale,
              internal_signature = EXCLUDED.internal_signature,
              customer_id = EXCLUDED.customer_id,
              delivery_service = EXCLUDED.delivery_service,
              shardkey = EXCLUDED.shardkey,
              sm_id = EXCLUDED.sm_id,
              date_created = EXCLUDED.date_created,
              oof_shard = EXCLUDED.oof_shard
"#;

pub const UPSERT_PAYMENT: &str = r#"
INSERT INTO order_payment (
    order_uid, transaction_id, request_id, currency, provider, amount, payment_dt,
    bank, delivery_cost, goods_total, custom_fee
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
ON CONFLICT (order_uid)
DO UPDATE SET transaction_id = EXCLUDED.transaction_id,
              request_id = EXCLUDED.request_id,
              currency = EXCLUDED.currency,
              provider = EXCLUDED.provider,
              amount = EXCLUDED.amount,
              payment_dt = EXCLUDED.payment_dt,
              bank = EXCLUDED.bank,
              delivery_cost = EXCLUDED.delivery_cost,
              goods_total = EXCLUDED.goods_total,
              custom_fee = EXCLUDED.custom_fee
"#;

pub const UPSERT_DELIVERY: &str = r#"
INSERT INTO order_delivery (
    order_uid, name, phone, zip, city, address, region, email
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (order_uid)
DO UPDATE SET name = EXCLUDED.name,
              phone = EXCLUDED.phone,
              zip = EXCLUDED.zip,
              city = EXCLUDED.city,
              address = EXCLUDED.address,
              region = EXCLUDED.region,
              email = EXCLUDED.email
"#;

pub const DELETE_ITEMS: &str = "DELETE FROM order_items WHERE order_uid = $1";

pub const INSERT_ITEM: &str = r#"
INSERT INTO order_items (
    order_uid, chrt_id, track_number, price, rid, name, sale, size,
    total_price, nm_id, brand, status
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
"#;

/// Forces deferred constraint checks to run before commit.
pub const FINALIZE_BATCH: &str = "SET CONSTRAINTS ALL IMMEDIATE";

pub const PING: &str = "SELECT 1";
