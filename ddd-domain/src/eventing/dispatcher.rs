//! 事件分发器（DomainEventDispatcher）协议
//!
use crate::domain_event::DomainEvent;
use crate::error::DomainResult;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 将一批事件按顺序投递给已注册的处理器
#[async_trait]
pub trait DomainEventDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        events: &[Arc<dyn DomainEvent>],
        cancel: &CancellationToken,
    ) -> DomainResult<()>;
}

#[async_trait]
impl<T> DomainEventDispatcher for Arc<T>
where
    T: DomainEventDispatcher + ?Sized,
{
    async fn dispatch(
        &self,
        events: &[Arc<dyn DomainEvent>],
        cancel: &CancellationToken,
    ) -> DomainResult<()> {
        (**self).dispatch(events, cancel).await
    }
}
