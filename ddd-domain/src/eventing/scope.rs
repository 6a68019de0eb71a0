//! 分发作用域（DispatchScope）
//!
//! 每次分发批次新建一个作用域，批次结束后丢弃。处理器工厂可从中获取或
//! 放入作用域内共享的协作对象（例如一次请求范围内的连接或缓存）。
//!
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type Service = Arc<dyn Any + Send + Sync>;

/// 按类型存放协作对象的作用域
#[derive(Default)]
pub struct DispatchScope {
    services: HashMap<TypeId, Service>,
}

impl DispatchScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// 放入协作对象，覆盖同类型的旧值
    pub fn insert<T>(&mut self, value: T)
    where
        T: Any + Send + Sync,
    {
        self.services.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// 获取协作对象
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| Arc::clone(s).downcast::<T>().ok())
    }

    /// 获取协作对象，不存在时用 `init` 创建并放入
    pub fn get_or_insert_with<T, F>(&mut self, init: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        if let Some(existing) = self.get::<T>() {
            return existing;
        }
        let value = Arc::new(init());
        self.services.insert(TypeId::of::<T>(), value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
