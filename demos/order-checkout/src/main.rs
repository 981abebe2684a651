//! Order checkout example binary
//!
//! Runs three checkouts through the pipeline: a successful order, an order
//! rejected by validation, and a declined card rescued by the `PayPal`
//! failover.

use anyhow::Context;
use composable_chain_core::metrics::describe_metrics;
use order_checkout::{
    CheckoutConfig, Customer, Order, OrderContext, OrderItem, PaymentInfo, PurchaseOrder,
    PurchaseOrderLine, PurchaseOrderValidation, StockTable, checkout_chain, purchase_order_chain,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_checkout=info,composable_chain_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    describe_metrics();

    println!("=== Order Checkout: Chain of Responsibility ===\n");

    let config = CheckoutConfig::default();
    let stock = StockTable::with_levels(config.initial_stock.clone());
    let chain = checkout_chain(&config, &stock).context("assembling checkout chain")?;

    let scenarios = [
        (
            "Successful order",
            Order::new(
                Some(Customer::new("Hoang Le", "hoang.le@example.com")),
                vec![
                    OrderItem::new("PROD-001", 1, 99_999),
                    OrderItem::new("PROD-002", 2, 4_950),
                ],
                PaymentInfo::card("1234-5678-9876-5432"),
            ),
        ),
        (
            "Validation and inventory failure",
            Order::new(
                Some(Customer::new("Anonymous", "invalid-email")),
                vec![OrderItem::new("PROD-999", 1, 1_000)],
                PaymentInfo::paypal("anon@paypal.com"),
            ),
        ),
        (
            "Payment failover (credit card -> PayPal)",
            Order::new(
                Some(Customer::new("Charlie", "charlie@example.com")),
                vec![OrderItem::new("PROD-003", 5, 2_500)],
                PaymentInfo::card("9999-9999-9999-9999"),
            ),
        ),
    ];

    for (index, (title, order)) in scenarios.into_iter().enumerate() {
        println!("--- SCENARIO {}: {title} ---\n", index + 1);
        let execution = chain
            .run(OrderContext::new(order))
            .with_context(|| format!("running scenario {title}"))?;

        let receipt = execution.request.payload().receipt();
        println!("\n--- ORDER PROCESSING RESULT ---");
        println!("{}", serde_json::to_string_pretty(&receipt)?);
        println!("-------------------------------\n");
    }

    println!("Remaining stock:");
    for (product, _) in &config.initial_stock {
        println!("  {product}: {}", stock.level(product).unwrap_or_default());
    }

    println!("\n--- PURCHASE ORDERS ---\n");
    let intake = purchase_order_chain(PurchaseOrderValidation::default());
    for lines in [
        vec![PurchaseOrderLine::new("Prod1", 20, 1_250)],
        vec![PurchaseOrderLine::new("Widget", 5, 300)],
    ] {
        let execution = intake
            .run(PurchaseOrder::new(lines))
            .context("running purchase order intake")?;
        let order = execution.request.payload();
        if order.problems.is_empty() {
            println!("Registered as {}", order.doc_code);
        } else {
            println!("Rejected: {}", order.problems.join(" "));
        }
    }

    Ok(())
}
