//! 保存流水线（DispatchingSession）
//!
//! 包装任意 `Session`，在每次 `save_changes` 前：
//! 1. 按跟踪顺序访问聚合根，逐个取出并清空非空的事件缓冲；
//! 2. 合并后的事件序列（聚合顺序、追加顺序）非空时交给分发器，
//!    分发失败则中止保存并返回错误，缓冲保持清空；
//! 3. 执行内层落库；落库失败时把取出的事件放回各自聚合缓冲的前部，再返回错误。
//!
//! 取出的事件由 `Harvested` 持有，直到落库成功或处理器失败才放弃；
//! 其余任何中断（落库出错、取消、外层丢弃该 future）都会在析构时放回。
//!
use crate::query::Query;
use crate::session::{EntryInfo, EntryKey, EntryState, Persistable, Session};
use async_trait::async_trait;
use ddd_domain::aggregate_root::AggregateRoot;
use ddd_domain::domain_event::DomainEvent;
use ddd_domain::entity_id::EntityId;
use ddd_domain::error::DomainResult;
use ddd_domain::eventing::DomainEventDispatcher;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

type Harvest = Vec<(EntryKey, Vec<Arc<dyn DomainEvent>>)>;

/// 在落库前分发领域事件的会话装饰器
pub struct DispatchingSession<S> {
    inner: S,
    dispatcher: Arc<dyn DomainEventDispatcher>,
}

impl<S> DispatchingSession<S>
where
    S: Session,
{
    pub fn new(inner: S, dispatcher: Arc<dyn DomainEventDispatcher>) -> Self {
        Self { inner, dispatcher }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

/// 已从聚合取出、尚未确认消费的事件
struct Harvested<'a, S: Session> {
    session: &'a S,
    pending: Harvest,
}

impl<'a, S: Session> Harvested<'a, S> {
    fn collect(session: &'a S) -> Self {
        let mut pending = Harvest::new();
        session.visit_aggregates(&mut |key: &EntryKey, root: &mut dyn AggregateRoot| {
            let events = root.domain_events_mut().take();
            if !events.is_empty() {
                pending.push((*key, events));
            }
        });
        Self { session, pending }
    }

    fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// 按聚合顺序、追加顺序展开
    fn events(&self) -> Vec<Arc<dyn DomainEvent>> {
        self.pending
            .iter()
            .flat_map(|(_, events)| events.iter().cloned())
            .collect()
    }

    /// 事件已被消费，不再放回
    fn settle(mut self) {
        self.pending.clear();
    }
}

impl<S: Session> Drop for Harvested<'_, S> {
    fn drop(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let mut pending = std::mem::take(&mut self.pending);
        debug!(aggregates = pending.len(), "restoring harvested events");
        self.session
            .visit_aggregates(&mut |key: &EntryKey, root: &mut dyn AggregateRoot| {
                if let Some(pos) = pending.iter().position(|(k, _)| k == key) {
                    let (_, events) = pending.swap_remove(pos);
                    root.domain_events_mut().restore(events);
                }
            });
    }
}

#[async_trait]
impl<S> Session for DispatchingSession<S>
where
    S: Session,
{
    async fn add<T: Persistable>(&self, entity: T) -> DomainResult<()> {
        self.inner.add(entity).await
    }

    async fn add_range<T: Persistable>(&self, entities: Vec<T>) -> DomainResult<()> {
        self.inner.add_range(entities).await
    }

    async fn update<T: Persistable>(&self, entity: T) -> DomainResult<()> {
        self.inner.update(entity).await
    }

    async fn update_range<T: Persistable>(&self, entities: Vec<T>) -> DomainResult<()> {
        self.inner.update_range(entities).await
    }

    async fn remove<T: Persistable>(&self, entity: &T) -> DomainResult<()> {
        self.inner.remove(entity).await
    }

    async fn find<T: Persistable>(&self, id: &EntityId) -> DomainResult<Option<T>> {
        self.inner.find(id).await
    }

    async fn fetch<T: Persistable>(&self, query: &Query<T>) -> DomainResult<Vec<T>> {
        self.inner.fetch(query).await
    }

    async fn save_changes(&self, cancel: &CancellationToken) -> DomainResult<usize> {
        let harvested = Harvested::collect(&self.inner);

        if !harvested.is_empty() {
            let events = harvested.events();
            debug!(
                aggregates = harvested.pending.len(),
                events = events.len(),
                "dispatching events before flush"
            );
            if let Err(err) = self.dispatcher.dispatch(&events, cancel).await {
                // 处理器失败不放回；取消放回以便重试
                if !err.is_cancelled() {
                    harvested.settle();
                }
                return Err(err);
            }
        }

        match self.inner.save_changes(cancel).await {
            Ok(rows) => {
                harvested.settle();
                Ok(rows)
            }
            Err(err) => {
                warn!(error = %err, "flush failed, harvested events go back to their aggregates");
                Err(err)
            }
        }
    }

    fn entries(&self) -> Vec<EntryInfo> {
        self.inner.entries()
    }

    fn set_entry_state(&self, key: &EntryKey, state: EntryState) {
        self.inner.set_entry_state(key, state)
    }

    fn visit_aggregates(&self, visitor: &mut dyn FnMut(&EntryKey, &mut dyn AggregateRoot)) {
        self.inner.visit_aggregates(visitor)
    }
}
