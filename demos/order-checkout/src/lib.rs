//! Order Checkout Example
//!
//! An e-commerce checkout assembled from chain members, sub-chains and
//! decorators.
//!
//! # Architecture
//!
//! ```text
//! Validation ─► Payment ─► [Inventory ─► Fulfillment] ─► Notification
//!                  │        └ timed, transactional ┘       └ logged
//!                  └─ CreditCard ─► PayPal ─► Crypto
//! ```
//!
//! - Validation stops the run on the first incomplete order.
//! - Payment is a sub-chain; `PayPal` takes over when the card is declined.
//! - Inventory and fulfillment run as one unit. When that unit ends with the
//!   checkout failed, the inventory reservation is compensated.
//! - Notification only writes to successful customers.
//!
//! A separate [`purchase_order_chain`] takes supplier purchase orders through
//! catalogue validation and registration.
//!
//! # Usage
//!
//! ```
//! use order_checkout::{
//!     CheckoutConfig, Customer, Order, OrderContext, OrderItem, PaymentInfo, StockTable,
//!     checkout_chain,
//! };
//!
//! # fn main() -> Result<(), composable_chain_core::ChainError> {
//! let config = CheckoutConfig::without_delays();
//! let stock = StockTable::with_levels(config.initial_stock.clone());
//! let chain = checkout_chain(&config, &stock)?;
//!
//! let order = Order::new(
//!     Some(Customer::new("Hoang Le", "hoang.le@example.com")),
//!     vec![OrderItem::new("PROD-001", 1, 99_999)],
//!     PaymentInfo::card("1234-5678-9876-5432"),
//! );
//! let execution = chain.run(OrderContext::new(order))?;
//!
//! assert!(execution.request.payload().successful);
//! assert_eq!(stock.level("PROD-001"), Some(9));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;
pub mod handlers;
pub mod order;
pub mod payment;
pub mod purchase;
pub mod stock;

pub use config::{CheckoutConfig, CheckoutConfigBuilder};
pub use handlers::{FulfillmentHandler, InventoryHandler, NotificationHandler, ValidationHandler};
pub use order::{
    CheckoutFact, CheckoutReceipt, Customer, Money, Order, OrderContext, OrderItem, PaymentInfo,
    PaymentMethod,
};
pub use payment::{
    ALL_GATEWAYS_FAILED, CreditCardGateway, CryptoGateway, PayPalGateway, payment_stage,
    standard_payment_stage,
};
pub use purchase::{
    PurchaseOrder, PurchaseOrderLine, PurchaseOrderRegistration, PurchaseOrderValidation,
    purchase_order_chain,
};
pub use stock::StockTable;

use composable_chain_core::prelude::*;
use std::sync::Arc;

/// Inventory followed by `fulfillment`, timed and wrapped in a transaction
/// that compensates `inventory` when the checkout fails inside the unit.
///
/// # Errors
///
/// Never fails in practice; building the two-member inner chain cannot hit
/// [`ChainError::EmptyChain`].
pub fn transactional_operations<F>(
    inventory: Arc<InventoryHandler>,
    fulfillment: F,
) -> Result<impl Handler<OrderContext>>
where
    F: Handler<OrderContext> + 'static,
{
    let operations = Chain::with_config(ChainConfig::labelled("inventory-fulfillment"))
        .add_shared(Arc::clone(&inventory))
        .add_handler(fulfillment);

    Ok(operations
        .build()?
        .timed()
        .transactional([inventory as Arc<dyn Compensate<OrderContext>>]))
}

/// The full checkout pipeline reserving against `stock`.
///
/// # Errors
///
/// Propagates [`ChainError::EmptyChain`] from assembling the inner
/// operations unit.
pub fn checkout_chain(config: &CheckoutConfig, stock: &StockTable) -> Result<Chain<OrderContext>> {
    let inventory = Arc::new(InventoryHandler::new(stock.clone()));
    let operations =
        transactional_operations(inventory, FulfillmentHandler::new(config.fulfillment_delay))?;

    Ok(
        Chain::with_config(ChainConfig::labelled("order-checkout"))
            .add_handler(ValidationHandler)
            .add_handler(standard_payment_stage(config))
            .add_handler(operations)
            .add_handler(NotificationHandler::new(config.notification_delay).logged("notification")),
    )
}
