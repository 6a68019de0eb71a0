use super::DomainEvent;
use std::slice::Iter;
use std::sync::Arc;

/// 聚合根内部的待分发事件缓冲，按追加顺序保存
///
/// 只允许两类访问：领域逻辑追加（`push`），保存管线一次性取出（`take`）。
/// 克隆仅复制 `Arc`，不会复制事件本身。
#[derive(Clone, Default, Debug)]
pub struct DomainEvents {
    events: Vec<Arc<dyn DomainEvent>>,
}

impl DomainEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加事件
    pub fn push<E: DomainEvent>(&mut self, event: E) {
        self.events.push(Arc::new(event));
    }

    /// 只读快照
    pub fn as_slice(&self) -> &[Arc<dyn DomainEvent>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Arc<dyn DomainEvent>> {
        self.events.iter()
    }

    /// 清空缓冲
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// 取出全部事件并清空缓冲（收集与清空为同一步）
    pub fn take(&mut self) -> Vec<Arc<dyn DomainEvent>> {
        std::mem::take(&mut self.events)
    }

    /// 将先前取出的事件放回缓冲前部，保持其原有顺序在新事件之前
    pub fn restore(&mut self, events: Vec<Arc<dyn DomainEvent>>) {
        self.events.splice(0..0, events);
    }
}

impl<'a> IntoIterator for &'a DomainEvents {
    type Item = &'a Arc<dyn DomainEvent>;
    type IntoIter = Iter<'a, Arc<dyn DomainEvent>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
