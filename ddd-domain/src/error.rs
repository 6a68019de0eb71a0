//! 领域层统一错误定义
//!
//! 聚焦持久化、事件分发、取消与值校验等最小必要集合，
//! 便于仓储与工作单元在边界处统一记录并转换为布尔结果。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 解析/值校验 ---
    #[error("parse error: {reason}")]
    Parse { reason: String },
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },

    // --- 事件系统 ---
    #[error("event handler error: handler={handler}, event={event_type}, reason={reason}")]
    EventHandler {
        handler: String,
        event_type: String,
        reason: String,
    },

    // --- 仓储/持久化 ---
    #[error("repository error: {reason}")]
    Repository { reason: String },
    #[error("database error: {reason}")]
    Database { reason: String },
    #[error("concurrency conflict: entity={entity}, id={id}")]
    Concurrency { entity: String, id: String },
    #[error("not found: {reason}")]
    NotFound { reason: String },

    // --- 通用 ---
    #[error("operation cancelled")]
    Cancelled,
}

impl DomainError {
    pub fn database(reason: impl Into<String>) -> Self {
        DomainError::Database {
            reason: reason.into(),
        }
    }

    pub fn repository(reason: impl Into<String>) -> Self {
        DomainError::Repository {
            reason: reason.into(),
        }
    }

    /// 是否为取消导致的失败
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl From<uuid::Error> for DomainError {
    fn from(err: uuid::Error) -> Self {
        DomainError::Parse {
            reason: err.to_string(),
        }
    }
}
