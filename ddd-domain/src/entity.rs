//! 实体（Entity）基础抽象
//!
//! 所有持久化对象共享的基础属性：标识、创建时间与更新时间。
//! 时间戳由持久化层在写入时设置，领域逻辑不应修改。
//!
use crate::aggregate_root::AggregateRoot;
use crate::entity_id::EntityId;
use chrono::{DateTime, Utc};

/// 具备唯一标识与审计时间戳的实体抽象
///
/// 通常由 `#[entity]` 或 `#[aggregate_root]` 宏生成实现。
pub trait Entity: Send + Sync + 'static {
    /// 实体标识
    fn id(&self) -> &EntityId;

    /// 创建时间（写入时由持久化层设置）
    fn created_on(&self) -> DateTime<Utc>;

    /// 最近一次更新时间，从未更新时为 `None`
    fn updated_on(&self) -> Option<DateTime<Utc>>;

    /// 仅供持久化层调用
    fn set_created_on(&mut self, at: DateTime<Utc>);

    /// 仅供持久化层调用
    fn set_updated_on(&mut self, at: DateTime<Utc>);

    /// 若该实体是聚合根，返回其聚合根视图，供保存管线收集事件
    fn as_aggregate_root_mut(&mut self) -> Option<&mut dyn AggregateRoot> {
        None
    }
}
