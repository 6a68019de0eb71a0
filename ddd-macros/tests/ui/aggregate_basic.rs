use ddd_domain::aggregate_root::AggregateRoot;
use ddd_domain::entity::Entity;
use ddd_domain::entity_id::EntityId;
use ddd_macros::{aggregate_root, domain_event};
use serde::{Deserialize, Serialize};

#[domain_event]
struct Renamed {
    name: String,
}

#[aggregate_root]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Account {
    name: String,
}

fn main() {
    let mut account = Account {
        id: EntityId::create_unique(),
        name: "a".into(),
        ..Default::default()
    };
    account.add_event(Renamed { name: "b".into() });

    let _: &EntityId = account.id();
    let _ = account.updated_on();
    assert_eq!(account.events().len(), 1);
    assert!(account.as_aggregate_root_mut().is_some());
    let _ = account.name.len();
}
