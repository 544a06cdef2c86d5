//! Write Batch Module
//!
//! The ordered list of statements that make up one order upsert. Both store
//! backends execute the same plan, so step indices mean the same thing
//! everywhere.

use crate::models::{Delivery, Item, Order, Payment};

// == Statement ==
/// One statement of an upsert, borrowing its data from the order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statement<'a> {
    UpsertHeader(&'a Order),
    UpsertPayment {
        order_uid: &'a str,
        payment: &'a Payment,
    },
    UpsertDelivery {
        order_uid: &'a str,
        delivery: &'a Delivery,
    },
    DeleteItems {
        order_uid: &'a str,
    },
    InsertItem {
        order_uid: &'a str,
        item: &'a Item,
    },
}

// == Write Batch ==
/// Statements for one order, in execution order:
/// header, payment, delivery, item purge, then one insert per item.
#[derive(Debug, Clone)]
pub struct WriteBatch<'a> {
    statements: Vec<Statement<'a>>,
}

impl<'a> WriteBatch<'a> {
    /// Number of statements that precede the item inserts
    pub const FIXED_STEPS: usize = 4;

    /// Queues the full replacement of `order`.
    pub fn for_order(order: &'a Order) -> Self {
        let order_uid = order.order_uid.as_str();
        let mut statements = Vec::with_capacity(Self::FIXED_STEPS + order.items.len());

        statements.push(Statement::UpsertHeader(order));
        statements.push(Statement::UpsertPayment {
            order_uid,
            payment: &order.payment,
        });
        statements.push(Statement::UpsertDelivery {
            order_uid,
            delivery: &order.delivery,
        });
        statements.push(Statement::DeleteItems { order_uid });
        statements.extend(
            order
                .items
                .iter()
                .map(|item| Statement::InsertItem { order_uid, item }),
        );

        Self { statements }
    }

    pub fn statements(&self) -> &[Statement<'a>] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
