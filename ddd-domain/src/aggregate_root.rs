//! 聚合根（Aggregate Root）
//!
//! 聚合根是一组相关对象的一致性边界，也是该边界内领域事件的唯一来源。
//! 领域逻辑在业务操作中通过 `add_event` 追加事件；保存管线在提交前
//! 一次性取出并清空缓冲，之后再分发。其他代码不应访问缓冲。
//!
use crate::domain_event::{DomainEvent, DomainEvents};
use crate::entity::Entity;
use std::sync::Arc;

/// 聚合根接口
pub trait AggregateRoot: Entity {
    /// 待分发事件缓冲
    fn domain_events(&self) -> &DomainEvents;

    fn domain_events_mut(&mut self) -> &mut DomainEvents;

    /// 待分发事件的只读快照（追加顺序）
    fn events(&self) -> &[Arc<dyn DomainEvent>] {
        self.domain_events().as_slice()
    }

    /// 是否存在待分发事件
    fn has_events(&self) -> bool {
        !self.domain_events().is_empty()
    }

    /// 追加领域事件
    fn add_event<E: DomainEvent>(&mut self, event: E)
    where
        Self: Sized,
    {
        self.domain_events_mut().push(event);
    }

    /// 清空待分发事件
    fn clear_events(&mut self) {
        self.domain_events_mut().clear();
    }
}
