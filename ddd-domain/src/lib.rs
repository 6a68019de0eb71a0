//! DDD 领域层基础库（ddd-domain）
//!
//! 提供面向聚合建模的通用构件：
//! - 值对象（`value_object`）与实体标识（`entity_id`）
//! - 实体（`entity`）与聚合根（`aggregate_root`），聚合根缓冲待发布的领域事件
//! - 领域事件（`domain_event`）及其进程内分发（`eventing`）
//! - 查询规约（`specification`）：筛选、预加载、排序与分页的声明式描述
//!
//! 本 crate 不绑定任何存储实现；仓储、工作单元与保存流水线位于 `ddd-persistence`。
//!
//! 典型用法：
//! 1. 以 `#[aggregate_root]`/`#[entity]`/`#[value_object]` 定义领域模型；
//! 2. 在领域逻辑中通过 `add_event` 记录事件；
//! 3. 启动时向 `HandlerRegistry` 注册事件处理器；
//! 4. 由持久化层在保存时收集并分发事件。
//!
pub mod aggregate_root;
pub mod domain_event;
pub mod entity;
pub mod entity_id;
pub mod error;
#[cfg(feature = "eventing")]
pub mod eventing;
pub mod specification;
pub mod value_object;

pub use chrono;
pub use uuid;

// 允许在本 crate 内部通过 ::ddd_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::ddd_domain 路径。
extern crate self as ddd_domain;
