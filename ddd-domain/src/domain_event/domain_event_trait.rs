use std::any::{Any, type_name};
use std::fmt;

/// 将具体类型视作 `dyn Any`，用于按精确类型向下转型
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 领域事件：表示“某件事已经发生”，载荷对分发机制不透明
pub trait DomainEvent: AsAny + fmt::Debug + Send + Sync {
    /// 事件类型名（默认取 Rust 类型名，可由 `#[domain_event(name = "...")]` 覆写）
    fn event_type(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl<'a> dyn DomainEvent + 'a {
    /// 按精确具体类型向下转型
    pub fn downcast_ref<E: DomainEvent>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    /// 是否为指定的具体事件类型
    pub fn is<E: DomainEvent>(&self) -> bool {
        self.as_any().is::<E>()
    }
}
