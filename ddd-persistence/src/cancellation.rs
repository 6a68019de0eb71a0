//! 取消令牌与后端调用的竞速
//!
use ddd_domain::error::{DomainError, DomainResult};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// 以取消优先的方式等待 `fut`；令牌先触发时返回 `DomainError::Cancelled`
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> DomainResult<T>
where
    F: Future<Output = DomainResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DomainError::Cancelled),
        r = fut => r,
    }
}
