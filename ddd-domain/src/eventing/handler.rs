//! 事件处理器（DomainEventHandler）
//!
//! 处理某一具体事件类型；按精确类型注册，不做继承/子类型匹配。
//!
use crate::domain_event::DomainEvent;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// 领域事件处理器
#[async_trait]
pub trait DomainEventHandler<E>: Send + Sync
where
    E: DomainEvent,
{
    /// 处理事件；返回错误会中止当前批次并向调用方传播
    async fn handle(&self, event: &E, cancel: &CancellationToken) -> anyhow::Result<()>;
}
