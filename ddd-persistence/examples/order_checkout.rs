//! 下单流程示例：聚合记录事件，工作单元提交时分发
//!
//! 运行：`RUST_LOG=debug cargo run -p ddd-persistence --example order_checkout`
//!
use async_trait::async_trait;
use ddd_domain::aggregate_root::AggregateRoot;
use ddd_domain::entity::Entity;
use ddd_domain::entity_id::EntityId;
use ddd_domain::eventing::{
    DispatchScope, DomainEventHandler, HandlerRegistry, InProcessDispatcher,
};
use ddd_domain::specification::{Specification, criteria};
use ddd_macros::{aggregate_root, domain_event, value_object};
use ddd_persistence::{DispatchingSession, InMemorySession, UnitOfWork};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[value_object]
struct Money {
    cents: u64,
    currency: String,
}

#[domain_event(name = "checkout.order_placed")]
struct OrderPlaced {
    order_id: EntityId,
    total: Money,
}

#[domain_event(name = "checkout.stock_reserved")]
struct StockReserved {
    sku: String,
    quantity: u32,
}

#[aggregate_root]
#[derive(Debug, Clone, Default)]
struct Order {
    customer: String,
    total_cents: u64,
}

impl Order {
    fn place(customer: &str, lines: &[(&str, u32, u64)]) -> Self {
        let mut order = Order {
            id: EntityId::create_unique(),
            customer: customer.to_string(),
            ..Default::default()
        };
        for (sku, quantity, price) in lines {
            order.total_cents += u64::from(*quantity) * price;
            order.add_event(StockReserved {
                sku: sku.to_string(),
                quantity: *quantity,
            });
        }
        order.add_event(OrderPlaced {
            order_id: *order.id(),
            total: Money {
                cents: order.total_cents,
                currency: "EUR".into(),
            },
        });
        order
    }
}

/// 批次内共享的营收统计
#[derive(Default)]
struct Revenue(AtomicU64);

struct RevenueProjector {
    revenue: Arc<Revenue>,
}

#[async_trait]
impl DomainEventHandler<OrderPlaced> for RevenueProjector {
    async fn handle(&self, e: &OrderPlaced, _: &CancellationToken) -> anyhow::Result<()> {
        self.revenue.0.fetch_add(e.total.cents, Ordering::Relaxed);
        info!(
            order = %e.order_id,
            total = e.total.cents,
            currency = %e.total.currency,
            "order placed"
        );
        Ok(())
    }
}

struct StockLogger;

#[async_trait]
impl DomainEventHandler<StockReserved> for StockLogger {
    async fn handle(&self, e: &StockReserved, _: &CancellationToken) -> anyhow::Result<()> {
        info!(sku = %e.sku, quantity = e.quantity, "stock reserved");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let registry = Arc::new(HandlerRegistry::new());
    registry.register::<OrderPlaced, _, _>(|scope: &mut DispatchScope| RevenueProjector {
        revenue: scope.get_or_insert_with(Revenue::default),
    });
    registry.register_shared::<StockReserved, _>(Arc::new(StockLogger));

    let dispatcher = Arc::new(InProcessDispatcher::new(registry));
    let session = Arc::new(DispatchingSession::new(InMemorySession::new(), dispatcher));
    let cancel = CancellationToken::new();

    let uow = UnitOfWork::new(session.clone());
    let orders = uow.repository::<Order>();

    let committed = uow
        .execute(
            || async {
                let mut alice = Order::place("alice", &[("book", 2, 1_500), ("pen", 3, 200)]);
                let mut bob = Order::place("bob", &[("lamp", 1, 4_900)]);
                orders.insert(&mut alice, &cancel).await;
                orders.insert(&mut bob, &cancel).await;
                Ok::<_, anyhow::Error>(())
            },
            |_| uow.rollback(),
            &cancel,
        )
        .await;
    info!(committed, "checkout finished");

    let big_orders = Specification::builder()
        .filter(criteria(|o: &Order| o.total_cents > 4_000))
        .order_by_descending(|o: &Order| o.total_cents)
        .build();
    for order in orders.list(&big_orders, &cancel).await? {
        info!(
            customer = %order.customer,
            total = order.total_cents,
            created_on = %order.created_on(),
            "large order"
        );
    }

    Ok(())
}
