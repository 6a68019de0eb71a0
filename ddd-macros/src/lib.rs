//! ddd-domain 的过程宏
//!
//! - `#[entity]` / `#[aggregate_root]`：注入标识与审计字段（聚合根另注入事件缓冲）并实现对应 trait
//! - `#[value_object]`：按字段生成相等分量与 `PartialEq`/`Eq`/`Hash`
//! - `#[domain_event]`：实现 `DomainEvent`，可覆写事件类型名
//!
use proc_macro::TokenStream;

mod derive_utils;
mod domain_event;
mod entity;
mod field_utils;
mod value_object;

/// 实体宏
/// - 若缺失则追加字段：`id: EntityId`, `created_on`, `updated_on`，并置于字段最前
/// - 自动实现 `::ddd_domain::entity::Entity`
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item, entity::Kind::Entity)
}

/// 聚合根宏
/// - 在 `#[entity]` 的基础上追加 `domain_events` 缓冲
/// - 自动实现 `Entity` 与 `::ddd_domain::aggregate_root::AggregateRoot`
#[proc_macro_attribute]
pub fn aggregate_root(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item, entity::Kind::AggregateRoot)
}

/// 值对象宏
/// - 参数：`#[value_object(debug = true|false)]`
/// - 字段级：`#[value_object(skip)]` 排除出相等比较
#[proc_macro_attribute]
pub fn value_object(attr: TokenStream, item: TokenStream) -> TokenStream {
    value_object::expand(attr, item)
}

/// 领域事件宏
/// - 参数：`#[domain_event(name = "...")]`
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}
