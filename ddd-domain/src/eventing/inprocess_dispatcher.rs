//! 进程内事件分发器（InProcessDispatcher）
//!
//! - 每个批次新建一个 `DispatchScope`，批次结束即丢弃；
//! - 事件按给定顺序逐个处理，同一事件的处理器按注册顺序串行执行；
//! - 任一处理器失败即中止批次并返回 `DomainError::EventHandler`，已投递的不回滚；
//! - 取消令牌在处理器执行期间优先检查，取消时返回 `DomainError::Cancelled`。
//!
use super::dispatcher::DomainEventDispatcher;
use super::registry::HandlerRegistry;
use super::scope::DispatchScope;
use crate::domain_event::DomainEvent;
use crate::error::{DomainError, DomainResult};
use async_trait::async_trait;
use bon::Builder;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// 作用域初始化器：在批次开始时放入共享协作对象
pub type ScopeInitializer = Arc<dyn Fn(&mut DispatchScope) + Send + Sync>;

#[derive(Builder)]
pub struct InProcessDispatcher {
    registry: Arc<HandlerRegistry>,
    scope_initializer: Option<ScopeInitializer>,
}

impl InProcessDispatcher {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            scope_initializer: None,
        }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    fn new_scope(&self) -> DispatchScope {
        let mut scope = DispatchScope::new();
        if let Some(init) = &self.scope_initializer {
            init(&mut scope);
        }
        scope
    }
}

#[async_trait]
impl DomainEventDispatcher for InProcessDispatcher {
    async fn dispatch(
        &self,
        events: &[Arc<dyn DomainEvent>],
        cancel: &CancellationToken,
    ) -> DomainResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        debug!(events = events.len(), "dispatching domain events");
        let mut scope = self.new_scope();

        for event in events {
            let event: &dyn DomainEvent = &**event;
            let event_type = event.event_type();

            for registered in self.registry.handlers_for(event) {
                if cancel.is_cancelled() {
                    return Err(DomainError::Cancelled);
                }

                let handler = registered.instantiate(&mut scope);
                trace!(handler = registered.name, event_type, "invoking handler");

                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(DomainError::Cancelled),
                    r = handler.handle(event, cancel) => r,
                };

                if let Err(err) = result {
                    warn!(
                        handler = registered.name,
                        event_type,
                        error = %err,
                        "domain event handler failed"
                    );
                    return Err(DomainError::EventHandler {
                        handler: registered.name.to_string(),
                        event_type: event_type.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
