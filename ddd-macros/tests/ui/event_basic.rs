use ddd_domain::domain_event::DomainEvent;
use ddd_macros::domain_event;

#[domain_event(name = "order.placed")]
struct OrderPlaced {
    total: u64,
}

#[domain_event]
enum PaymentEvent {
    Authorized { amount: u64 },
    Declined,
}

fn main() {
    let placed = OrderPlaced { total: 10 };
    assert_eq!(placed.event_type(), "order.placed");
    let _ = placed.clone().total;

    let ev: &dyn DomainEvent = &PaymentEvent::Declined;
    assert!(ev.event_type().ends_with("PaymentEvent"));
    assert!(ev.is::<PaymentEvent>());
    let _ = format!("{:?}", PaymentEvent::Authorized { amount: 1 });
}
