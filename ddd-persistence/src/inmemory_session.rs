//! 内存会话（InMemorySession）
//!
//! 带变更跟踪的 `Session` 参考实现，用于测试与示例：
//! - 已提交数据按实体类型分表保存，保持插入顺序；
//! - 变更先登记在跟踪器中，`save_changes` 时整体校验后一次性应用；
//! - 新增写入 `created_on`，修改写入 `updated_on`；
//! - 修改/删除不存在的行、重复新增视为并发冲突，整批不生效；
//! - 待分发事件只存在于跟踪副本上：替换跟踪副本时保留旧副本尚未分发的事件，
//!   `find`/`fetch` 交给调用方的副本不携带事件。
//!
use crate::query::Query;
use crate::session::{EntryInfo, EntryKey, EntryState, Persistable, Session};
use async_trait::async_trait;
use chrono::Utc;
use ddd_domain::aggregate_root::AggregateRoot;
use ddd_domain::entity::Entity;
use ddd_domain::entity_id::EntityId;
use ddd_domain::error::{DomainError, DomainResult};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

trait StoredEntity: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn entity_mut(&mut self) -> &mut dyn Entity;
    fn clone_box(&self) -> Box<dyn StoredEntity>;
}

impl<T: Persistable> StoredEntity for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn entity_mut(&mut self) -> &mut dyn Entity {
        self
    }

    fn clone_box(&self) -> Box<dyn StoredEntity> {
        Box::new(self.clone())
    }
}

fn carry_pending_events(from: &mut dyn StoredEntity, to: &mut dyn StoredEntity) {
    let pending = from
        .entity_mut()
        .as_aggregate_root_mut()
        .map(|root| root.domain_events_mut().take());
    if let (Some(events), Some(root)) = (pending, to.entity_mut().as_aggregate_root_mut()) {
        root.domain_events_mut().restore(events);
    }
}

fn without_events<T: Persistable>(mut entity: T) -> T {
    if let Some(root) = entity.as_aggregate_root_mut() {
        root.domain_events_mut().clear();
    }
    entity
}

struct Tracked {
    key: EntryKey,
    state: EntryState,
    entity: Box<dyn StoredEntity>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<TypeId, Vec<(EntityId, Box<dyn StoredEntity>)>>,
    tracker: Vec<Tracked>,
    fail_next_save: Option<String>,
}

impl Inner {
    fn tracked_mut(&mut self, key: &EntryKey) -> Option<&mut Tracked> {
        self.tracker.iter_mut().find(|t| t.key == *key)
    }

    fn row_exists(&self, key: &EntryKey) -> bool {
        self.tables
            .get(&key.type_id)
            .is_some_and(|rows| rows.iter().any(|(id, _)| *id == key.id))
    }

    fn track(&mut self, key: EntryKey, state: EntryState, mut entity: Box<dyn StoredEntity>) {
        match self.tracked_mut(&key) {
            Some(tracked) => {
                carry_pending_events(&mut *tracked.entity, &mut *entity);
                tracked.state = state;
                tracked.entity = entity;
            }
            None => self.tracker.push(Tracked { key, state, entity }),
        }
    }

    fn validate(&self) -> DomainResult<()> {
        for tracked in &self.tracker {
            let exists = self.row_exists(&tracked.key);
            let conflict = match tracked.state {
                EntryState::Added => exists,
                EntryState::Modified | EntryState::Deleted => !exists,
                EntryState::Unchanged | EntryState::Detached => false,
            };
            if conflict {
                return Err(DomainError::Concurrency {
                    entity: tracked.key.type_name.to_string(),
                    id: tracked.key.id.to_string(),
                });
            }
        }
        Ok(())
    }

    fn apply(&mut self) -> usize {
        let now = Utc::now();
        let mut rows = 0;

        for tracked in &mut self.tracker {
            let table = self.tables.entry(tracked.key.type_id).or_default();
            match tracked.state {
                EntryState::Added => {
                    tracked.entity.entity_mut().set_created_on(now);
                    table.push((tracked.key.id, tracked.entity.clone_box()));
                }
                EntryState::Modified => {
                    tracked.entity.entity_mut().set_updated_on(now);
                    if let Some(row) = table.iter_mut().find(|(id, _)| *id == tracked.key.id) {
                        row.1 = tracked.entity.clone_box();
                    }
                }
                EntryState::Deleted => table.retain(|(id, _)| *id != tracked.key.id),
                EntryState::Unchanged | EntryState::Detached => continue,
            }
            trace!(entry = %tracked.key, state = ?tracked.state, "applied tracked entry");
            rows += 1;
        }

        self.tracker.retain(|t| t.state != EntryState::Deleted);
        for tracked in &mut self.tracker {
            tracked.state = EntryState::Unchanged;
        }

        rows
    }
}

/// 内存会话
#[derive(Default)]
pub struct InMemorySession {
    inner: Mutex<Inner>,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 让下一次 `save_changes` 以数据库错误失败（不应用任何变更）
    pub fn fail_next_save(&self, reason: impl Into<String>) {
        self.lock().fail_next_save = Some(reason.into());
    }

    /// 已提交的行（插入顺序），不经过跟踪器
    pub fn committed<T: Persistable>(&self) -> Vec<T> {
        self.lock()
            .tables
            .get(&TypeId::of::<T>())
            .map(|rows| {
                rows.iter()
                    .filter_map(|(_, e)| e.as_any().downcast_ref::<T>().cloned())
                    .map(without_events)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 指定实体的跟踪状态
    pub fn entry_state<T: Persistable>(&self, id: &EntityId) -> EntryState {
        let key = EntryKey::of::<T>(*id);
        self.lock()
            .tracker
            .iter()
            .find(|t| t.key == key)
            .map_or(EntryState::Detached, |t| t.state)
    }
}

#[async_trait]
impl Session for InMemorySession {
    async fn add<T: Persistable>(&self, entity: T) -> DomainResult<()> {
        let key = EntryKey::of::<T>(*entity.id());
        self.lock().track(key, EntryState::Added, Box::new(entity));
        Ok(())
    }

    async fn update<T: Persistable>(&self, entity: T) -> DomainResult<()> {
        let key = EntryKey::of::<T>(*entity.id());
        let mut inner = self.lock();
        let state = match inner.tracked_mut(&key).map(|t| t.state) {
            Some(EntryState::Added) => EntryState::Added,
            _ => EntryState::Modified,
        };
        inner.track(key, state, Box::new(entity));
        Ok(())
    }

    async fn remove<T: Persistable>(&self, entity: &T) -> DomainResult<()> {
        let key = EntryKey::of::<T>(*entity.id());
        let mut inner = self.lock();
        match inner.tracked_mut(&key).map(|t| t.state) {
            // 尚未落库的新增直接停止跟踪
            Some(EntryState::Added) => inner.tracker.retain(|t| t.key != key),
            _ => inner.track(key, EntryState::Deleted, Box::new(entity.clone())),
        }
        Ok(())
    }

    async fn find<T: Persistable>(&self, id: &EntityId) -> DomainResult<Option<T>> {
        let key = EntryKey::of::<T>(*id);
        let inner = self.lock();

        if let Some(tracked) = inner.tracker.iter().find(|t| t.key == key) {
            if tracked.state == EntryState::Deleted {
                return Ok(None);
            }
            return Ok(tracked
                .entity
                .as_any()
                .downcast_ref::<T>()
                .cloned()
                .map(without_events));
        }

        Ok(inner
            .tables
            .get(&key.type_id)
            .and_then(|rows| {
                rows.iter()
                    .find(|(row_id, _)| row_id == id)
                    .and_then(|(_, e)| e.as_any().downcast_ref::<T>().cloned())
            })
            .map(without_events))
    }

    async fn fetch<T: Persistable>(&self, query: &Query<T>) -> DomainResult<Vec<T>> {
        let rows = self.committed::<T>();
        Ok(query.apply(rows))
    }

    async fn save_changes(&self, cancel: &CancellationToken) -> DomainResult<usize> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        let mut inner = self.lock();
        if let Some(reason) = inner.fail_next_save.take() {
            return Err(DomainError::database(reason));
        }

        inner.validate()?;
        let rows = inner.apply();
        debug!(rows, "in-memory session flushed");
        Ok(rows)
    }

    fn entries(&self) -> Vec<EntryInfo> {
        self.lock()
            .tracker
            .iter()
            .map(|t| EntryInfo {
                key: t.key,
                state: t.state,
            })
            .collect()
    }

    fn set_entry_state(&self, key: &EntryKey, state: EntryState) {
        let mut inner = self.lock();
        if state == EntryState::Detached {
            inner.tracker.retain(|t| t.key != *key);
        } else if let Some(tracked) = inner.tracked_mut(key) {
            tracked.state = state;
        }
    }

    fn visit_aggregates(&self, visitor: &mut dyn FnMut(&EntryKey, &mut dyn AggregateRoot)) {
        let mut inner = self.lock();
        for tracked in &mut inner.tracker {
            if let Some(root) = tracked.entity.entity_mut().as_aggregate_root_mut() {
                visitor(&tracked.key, root);
            }
        }
    }
}
