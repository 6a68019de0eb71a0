use ddd_domain::entity_id::EntityId;
use ddd_domain::specification::{Criteria, OrderBy, SharedCriteria, Specification, criteria};
use ddd_macros::entity;
use ddd_persistence::{InMemorySession, Query, Repository, SpecificationEvaluator};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[entity]
#[derive(Debug, Clone, Default)]
struct Invoice {
    number: u32,
    customer: String,
}

async fn seeded(rows: u32) -> Repository<Invoice, InMemorySession> {
    let repo = Repository::builder()
        .session(Arc::new(InMemorySession::new()))
        .build();

    // 插入顺序与编号顺序不同，排序才有意义
    let mut invoices: Vec<Invoice> = (0..rows)
        .map(|i| Invoice {
            id: EntityId::create_unique(),
            number: (i * 11) % rows,
            customer: if i % 2 == 0 { "acme" } else { "globex" }.to_string(),
            ..Default::default()
        })
        .collect();
    assert!(repo.insert_many(&mut invoices, &CancellationToken::new()).await);
    repo
}

fn numbers(rows: &[Invoice]) -> Vec<u32> {
    rows.iter().map(|r| r.number).collect()
}

#[tokio::test]
async fn twenty_five_rows_in_pages_of_ten() {
    let repo = seeded(25).await;
    let cancel = CancellationToken::new();

    let mut sizes = Vec::new();
    let mut seen = Vec::new();
    for page in 0..3 {
        let spec = Specification::builder()
            .order_by(|i: &Invoice| i.number)
            .page(page, 10)
            .build();
        let rows = repo.list(&spec, &cancel).await.unwrap();
        sizes.push(rows.len());
        seen.extend(numbers(&rows));
    }

    assert_eq!(sizes, [10, 10, 5]);
    assert_eq!(seen, (0..25).collect::<Vec<_>>());
}

#[tokio::test]
async fn repeated_evaluation_is_identical() {
    let repo = seeded(25).await;
    let cancel = CancellationToken::new();
    let spec = Specification::builder()
        .filter(criteria(|i: &Invoice| i.customer == "acme"))
        .order_by_descending(|i: &Invoice| i.number)
        .page(1, 4)
        .build();

    let first = numbers(&repo.list(&spec, &cancel).await.unwrap());
    for _ in 0..5 {
        assert_eq!(numbers(&repo.list(&spec, &cancel).await.unwrap()), first);
    }
    assert_eq!(first.len(), 4);
    assert!(first.windows(2).all(|w| w[0] > w[1]));
}

#[tokio::test]
async fn page_past_the_end_is_empty() {
    let repo = seeded(25).await;
    let spec = Specification::builder()
        .order_by(|i: &Invoice| i.number)
        .page(3, 10)
        .build();
    assert!(repo.list(&spec, &CancellationToken::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn evaluator_composes_with_a_base_query() {
    let repo = seeded(25).await;
    let spec = Specification::builder()
        .order_by(|i: &Invoice| i.number)
        .paging(0, 3)
        .build();

    // 基础查询中的条件先于规约执行
    let base = Query::new().filter(criteria(|i: &Invoice| i.number >= 20));
    let query = SpecificationEvaluator::evaluate(base, &spec);
    let rows = repo.fetch(&query, &CancellationToken::new()).await.unwrap();
    assert_eq!(numbers(&rows), [20, 21, 22]);
}

#[tokio::test]
async fn unordered_specification_keeps_insertion_order() {
    let repo = seeded(5).await;
    let spec: Specification<Invoice> = Specification::builder().paging(1, 2).build();
    let rows = repo.list(&spec, &CancellationToken::new()).await.unwrap();
    // 编号序列为 (i * 11) % 5：0, 1, 2, 3, 4
    assert_eq!(numbers(&rows), [1, 2]);
}

#[tokio::test]
async fn shared_filter_is_reused_across_reads() {
    let repo = seeded(25).await;
    let cancel = CancellationToken::new();
    let acme: SharedCriteria<Invoice> = criteria(|i: &Invoice| i.customer == "acme").shared();

    assert_eq!(repo.count(&Specification::new(acme.clone()), &cancel).await.unwrap(), 13);
    assert_eq!(
        repo.count(&Specification::new(acme.clone().not()), &cancel).await.unwrap(),
        12
    );

    let narrowed = Specification::builder()
        .filter(acme.clone().and(criteria(|i: &Invoice| i.number < 10)))
        .order_by(|i: &Invoice| i.number)
        .build();
    let rows = repo.list(&narrowed, &cancel).await.unwrap();
    assert_eq!(numbers(&rows), [0, 1, 4, 7]);
    assert!(rows.iter().all(|i| i.customer == "acme"));

    let first = repo.first(acme, &cancel).await.unwrap().unwrap();
    assert_eq!(first.number, 0);
}

#[tokio::test]
async fn optional_parameters_shape_the_query() {
    let repo = seeded(25).await;
    let cancel = CancellationToken::new();
    let search = |customer: Option<&str>, numbers_in: Vec<u32>| {
        Query::new()
            .filter_contains(|i: &Invoice| i.customer.as_str(), customer)
            .filter_in(|i: &Invoice| i.number, numbers_in)
            .order_by_if(customer.is_some(), OrderBy::descending(|i: &Invoice| i.number))
    };

    let rows = repo.fetch(&search(Some("glob"), vec![1, 4, 5]), &cancel).await.unwrap();
    assert_eq!(numbers(&rows), [5]);

    let rows = repo.fetch(&search(None, vec![3, 2, 1]), &cancel).await.unwrap();
    // 未指定客户时不排序，保持插入顺序
    assert_eq!(numbers(&rows), [2, 1, 3]);

    let rows = repo.fetch(&search(Some(" "), Vec::new()), &cancel).await.unwrap();
    assert_eq!(rows.len(), 25);
}
