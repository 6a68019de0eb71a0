//! 领域事件（Domain Event）与待分发事件缓冲
//!
//! 定义事件载荷需要实现的最小接口（`DomainEvent`），以及聚合根内部
//! 按追加顺序保存待分发事件的 `DomainEvents`。

mod domain_event_trait;
mod domain_events;

pub use domain_event_trait::{AsAny, DomainEvent};
pub use domain_events::DomainEvents;
