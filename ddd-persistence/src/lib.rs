//! DDD 持久化基础库（ddd-persistence）
//!
//! 在 `ddd-domain` 的领域模型之上提供面向聚合的持久化构件：
//! - 会话协议（`session`）：外部存储/变更跟踪的最小接口，附内存实现（`inmemory_session`）
//! - 通用仓储（`repository`）与保存策略（`save_state`）
//! - 工作单元（`unit_of_work`）：提交、回滚与带补偿的执行
//! - 查询计划（`query`）与规约求值器（`evaluator`）
//! - 保存流水线（`pipeline`）：落库前收集、清空并分发聚合的领域事件
//!
//! 典型用法：
//! 1. 以 `DispatchingSession` 包装具体会话并注入事件分发器；
//! 2. 单聚合写入使用默认 `LocalSave` 的仓储，每次变更立即落库；
//! 3. 跨聚合事务通过 `UnitOfWork` 获取 `PartOfUnitOfWork` 仓储，最后统一 `commit`。
//!
pub mod cancellation;
pub mod evaluator;
pub mod inmemory_session;
pub mod pipeline;
pub mod query;
pub mod repository;
pub mod save_state;
pub mod session;
pub mod unit_of_work;

pub use evaluator::SpecificationEvaluator;
pub use inmemory_session::InMemorySession;
pub use pipeline::DispatchingSession;
pub use query::{IncludeTarget, Query, QueryOp};
pub use repository::Repository;
pub use save_state::SaveState;
pub use session::{EntryInfo, EntryKey, EntryState, Persistable, Session};
pub use unit_of_work::UnitOfWork;
