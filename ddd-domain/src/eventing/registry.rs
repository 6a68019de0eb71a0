//! 处理器注册表（HandlerRegistry）
//!
//! 启动时显式注册：`TypeId(事件) → 有序的处理器工厂列表`。
//! 分发时按事件的精确类型解析，工厂在每个批次的作用域内实例化处理器，
//! 实例不跨批次缓存。
//!
use super::handler::DomainEventHandler;
use super::scope::DispatchScope;
use crate::domain_event::DomainEvent;
use async_trait::async_trait;
use dashmap::DashMap;
use std::any::{TypeId, type_name};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 类型擦除后的处理器
#[async_trait]
pub(crate) trait ErasedHandler: Send + Sync {
    async fn handle(
        &self,
        event: &dyn DomainEvent,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()>;
}

struct Typed<E, H> {
    handler: Arc<H>,
    _event: PhantomData<fn(E)>,
}

#[async_trait]
impl<E, H> ErasedHandler for Typed<E, H>
where
    E: DomainEvent,
    H: DomainEventHandler<E> + 'static,
{
    async fn handle(
        &self,
        event: &dyn DomainEvent,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        // 键与闭包同一泛型 E，正常情况下不会失败
        let Some(event) = event.as_any().downcast_ref::<E>() else {
            anyhow::bail!("event type mismatch, expected {}", type_name::<E>());
        };
        self.handler.handle(event, cancel).await
    }
}

type HandlerFactory = Arc<dyn Fn(&mut DispatchScope) -> Box<dyn ErasedHandler> + Send + Sync>;

/// 已注册的处理器：名称 + 工厂
#[derive(Clone)]
pub(crate) struct RegisteredHandler {
    pub(crate) name: &'static str,
    factory: HandlerFactory,
}

impl RegisteredHandler {
    pub(crate) fn instantiate(&self, scope: &mut DispatchScope) -> Box<dyn ErasedHandler> {
        (self.factory)(scope)
    }
}

/// 事件处理器注册表
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<TypeId, Vec<RegisteredHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册处理器工厂；同一事件的多个处理器按注册顺序执行
    pub fn register<E, H, F>(&self, factory: F)
    where
        E: DomainEvent,
        H: DomainEventHandler<E> + 'static,
        F: Fn(&mut DispatchScope) -> H + Send + Sync + 'static,
    {
        let factory: HandlerFactory =
            Arc::new(move |scope: &mut DispatchScope| -> Box<dyn ErasedHandler> {
                Box::new(Typed::<E, H> {
                    handler: Arc::new(factory(scope)),
                    _event: PhantomData,
                })
            });
        self.push::<E, H>(factory);
    }

    /// 注册共享的处理器实例（无作用域依赖的无状态处理器）
    pub fn register_shared<E, H>(&self, handler: Arc<H>)
    where
        E: DomainEvent,
        H: DomainEventHandler<E> + 'static,
    {
        let factory: HandlerFactory =
            Arc::new(move |_: &mut DispatchScope| -> Box<dyn ErasedHandler> {
                Box::new(Typed::<E, H> {
                    handler: handler.clone(),
                    _event: PhantomData,
                })
            });
        self.push::<E, H>(factory);
    }

    fn push<E: DomainEvent, H: 'static>(&self, factory: HandlerFactory) {
        self.handlers
            .entry(TypeId::of::<E>())
            .or_default()
            .push(RegisteredHandler {
                name: type_name::<H>(),
                factory,
            });
    }

    /// 指定事件类型已注册的处理器数量
    pub fn handler_count<E: DomainEvent>(&self) -> usize {
        self.handlers
            .get(&TypeId::of::<E>())
            .map_or(0, |h| h.len())
    }

    /// 已注册处理器的事件类型集合
    pub fn registered_event_types(&self) -> Vec<TypeId> {
        self.handlers.iter().map(|e| *e.key()).collect()
    }

    pub(crate) fn handlers_for(&self, event: &dyn DomainEvent) -> Vec<RegisteredHandler> {
        self.handlers
            .get(&event.as_any().type_id())
            .map(|h| h.clone())
            .unwrap_or_default()
    }
}
