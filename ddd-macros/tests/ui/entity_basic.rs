use ddd_domain::entity::Entity;
use ddd_domain::entity_id::EntityId;
use ddd_macros::entity;

#[entity]
#[derive(Debug, Clone, Default)]
struct OrderLine {
    // 已有的 id 字段会被复用并移到最前
    sku: String,
    id: EntityId,
    quantity: u32,
}

fn main() {
    let mut line = OrderLine::default();
    line.set_created_on(ddd_domain::chrono::Utc::now());
    assert!(line.as_aggregate_root_mut().is_none());
    let _ = (line.sku.len(), line.quantity, line.id());
}
