//! 持久化会话（Session）协议
//!
//! 抽象外部存储/ORM 会话：登记新增、修改、删除，按条件查询，
//! 统一落库并报告受影响行数，以及枚举当前跟踪中的条目及其状态。
//! 所有方法以 `&self` 调用，实现方使用内部可变性，会话通过 `Arc` 共享。
//!
use crate::query::Query;
use async_trait::async_trait;
use ddd_domain::aggregate_root::AggregateRoot;
use ddd_domain::entity::Entity;
use ddd_domain::entity_id::EntityId;
use ddd_domain::error::DomainResult;
use std::any::{TypeId, type_name};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// 可由会话持久化的实体
pub trait Persistable: Entity + Clone {}

impl<T> Persistable for T where T: Entity + Clone {}

/// 跟踪条目的键：实体类型 + 标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub id: EntityId,
}

impl EntryKey {
    pub fn of<T: 'static>(id: EntityId) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            id,
        }
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_name, self.id)
    }
}

/// 条目的变更状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// 未被跟踪
    Detached,
    Unchanged,
    Added,
    Modified,
    Deleted,
}

/// 跟踪条目快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    pub key: EntryKey,
    pub state: EntryState,
}

/// 持久化会话
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// 登记新增
    async fn add<T: Persistable>(&self, entity: T) -> DomainResult<()>;

    async fn add_range<T: Persistable>(&self, entities: Vec<T>) -> DomainResult<()> {
        for entity in entities {
            self.add(entity).await?;
        }
        Ok(())
    }

    /// 登记修改
    async fn update<T: Persistable>(&self, entity: T) -> DomainResult<()>;

    async fn update_range<T: Persistable>(&self, entities: Vec<T>) -> DomainResult<()> {
        for entity in entities {
            self.update(entity).await?;
        }
        Ok(())
    }

    /// 登记删除
    async fn remove<T: Persistable>(&self, entity: &T) -> DomainResult<()>;

    /// 按标识查找
    async fn find<T: Persistable>(&self, id: &EntityId) -> DomainResult<Option<T>>;

    /// 执行查询计划
    async fn fetch<T: Persistable>(&self, query: &Query<T>) -> DomainResult<Vec<T>>;

    /// 落库，返回受影响行数
    async fn save_changes(&self, cancel: &CancellationToken) -> DomainResult<usize>;

    /// 当前跟踪中的条目（跟踪顺序）
    fn entries(&self) -> Vec<EntryInfo>;

    /// 修改条目状态；`Detached` 表示停止跟踪
    fn set_entry_state(&self, key: &EntryKey, state: EntryState);

    /// 按跟踪顺序访问所有被跟踪的聚合根；访问期间不得回调会话
    fn visit_aggregates(&self, visitor: &mut dyn FnMut(&EntryKey, &mut dyn AggregateRoot));
}
