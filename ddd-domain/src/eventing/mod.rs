//! 领域事件分发（eventing）
//!
//! 保存流水线在落库前收集聚合缓冲的事件，交由 `DomainEventDispatcher` 投递：
//! - `DomainEventHandler<E>`：处理某一具体事件类型；
//! - `HandlerRegistry`：启动时注册的 `TypeId → 处理器工厂` 表；
//! - `DispatchScope`：单批次内共享的协作对象；
//! - `InProcessDispatcher`：进程内、按序、串行的默认实现。
//!
pub mod dispatcher;
pub mod handler;
pub mod inprocess_dispatcher;
pub mod registry;
pub mod scope;

pub use dispatcher::DomainEventDispatcher;
pub use handler::DomainEventHandler;
pub use inprocess_dispatcher::{InProcessDispatcher, ScopeInitializer};
pub use registry::HandlerRegistry;
pub use scope::DispatchScope;
