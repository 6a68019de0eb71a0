use ddd_macros::value_object;
use std::collections::HashSet;

#[value_object]
struct Money {
    amount: i64,
    currency: String,
    #[value_object(skip)]
    display: String,
}

#[value_object(debug = false)]
struct Percent(u8);

#[value_object]
enum Level {
    Low,
    High,
}

fn main() {
    let a = Money { amount: 5, currency: "EUR".into(), display: "5 €".into() };
    let b = Money { amount: 5, currency: "EUR".into(), display: "EUR 5".into() };
    assert_eq!(a, b);
    let _ = format!("{:?}", a.clone());

    let set: HashSet<Money> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);

    assert!(Percent(1) == Percent(1));
    assert!(Level::Low != Level::High);
}
