//! 工作单元（Unit of Work）
//!
//! 持有一次逻辑操作的会话，协调多个仓储在同一事务中的变更：
//! - `commit`：统一落库，错误记录后以 `false` 报告；
//! - `rollback`：撤销跟踪器中未提交的状态；
//! - `execute` / `execute_with`：执行动作并提交，失败时调用补偿回调。
//!
use crate::cancellation::cancellable;
use crate::repository::Repository;
use crate::save_state::SaveState;
use crate::session::{EntryKey, EntryState, Persistable, Session};
use ddd_domain::aggregate_root::AggregateRoot;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

pub struct UnitOfWork<S> {
    session: Arc<S>,
}

impl<S> UnitOfWork<S>
where
    S: Session,
{
    pub fn new(session: Arc<S>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// 释放会话所有权
    pub fn into_session(self) -> Arc<S> {
        self.session
    }

    /// 参与本工作单元的仓储（`PartOfUnitOfWork`）
    pub fn repository<A: Persistable>(&self) -> Repository<A, S> {
        Repository::builder()
            .session(self.session.clone())
            .state(SaveState::PartOfUnitOfWork)
            .build()
    }

    /// 统一落库
    pub async fn commit(&self, cancel: &CancellationToken) -> bool {
        match cancellable(cancel, self.session.save_changes(cancel)).await {
            Ok(rows) => {
                debug!(rows, "unit of work committed");
                true
            }
            Err(err) => {
                error!(error = %err, "unit of work commit failed");
                false
            }
        }
    }

    /// 撤销未提交的变更状态
    ///
    /// Modified → Unchanged，Added → Detached，Deleted → Unchanged。
    /// 被撤销条目上尚未分发的事件一并丢弃。
    pub fn rollback(&self) {
        let mut reverted = Vec::new();
        for entry in self.session.entries() {
            let target = match entry.state {
                EntryState::Modified | EntryState::Deleted => EntryState::Unchanged,
                EntryState::Added => EntryState::Detached,
                EntryState::Unchanged | EntryState::Detached => continue,
            };
            self.session.set_entry_state(&entry.key, target);
            reverted.push(entry.key);
        }
        self.session
            .visit_aggregates(&mut |key: &EntryKey, root: &mut dyn AggregateRoot| {
                if reverted.contains(key) {
                    root.clear_events();
                }
            });
        debug!(reverted = reverted.len(), "unit of work rolled back");
    }

    /// 执行动作并提交；动作出错或提交失败时调用 `on_failed` 并返回 `false`
    pub async fn execute<F, Fut, E, OnFailed>(
        &self,
        action: F,
        on_failed: OnFailed,
        cancel: &CancellationToken,
    ) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Into<anyhow::Error>,
        OnFailed: FnOnce(&S),
    {
        let committed = match self.run(action, cancel).await {
            Some(()) => self.commit(cancel).await,
            None => false,
        };
        if !committed {
            on_failed(self.session.as_ref());
        }
        committed
    }

    /// 执行带结果的动作并提交；动作出错或提交失败时返回 `on_failed` 的结果
    pub async fn execute_with<T, F, Fut, E, OnFailed>(
        &self,
        action: F,
        on_failed: OnFailed,
        cancel: &CancellationToken,
    ) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<anyhow::Error>,
        OnFailed: FnOnce(&S) -> T,
    {
        let Some(result) = self.run(action, cancel).await else {
            return on_failed(self.session.as_ref());
        };
        if self.commit(cancel).await {
            result
        } else {
            on_failed(self.session.as_ref())
        }
    }

    async fn run<T, F, Fut, E>(&self, action: F, cancel: &CancellationToken) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<anyhow::Error>,
    {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(anyhow::anyhow!("operation cancelled")),
            r = action() => r.map_err(Into::into),
        };

        match outcome {
            Ok(result) => Some(result),
            Err(err) => {
                error!(error = %err, "unit of work action failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory_session::InMemorySession;
    use ddd_domain::entity::Entity;
    use ddd_domain::entity_id::EntityId;
    use ddd_macros::entity;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[entity]
    #[derive(Debug, Clone, Default)]
    struct Ticket {
        seat: u32,
    }

    fn ticket(seat: u32) -> Ticket {
        Ticket {
            id: EntityId::create_unique(),
            seat,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn rollback_reverts_tracked_states() {
        let session = Arc::new(InMemorySession::new());
        let uow = UnitOfWork::new(session.clone());
        let cancel = CancellationToken::new();

        let kept = ticket(1);
        let dropped = ticket(2);
        session.add(kept.clone()).await.unwrap();
        session.add(dropped.clone()).await.unwrap();
        assert!(uow.commit(&cancel).await);

        let tickets = uow.repository::<Ticket>();
        let mut fresh = ticket(3);
        tickets.insert(&mut fresh, &cancel).await;
        tickets.update(&mut Ticket { seat: 10, ..kept.clone() }, &cancel).await;
        tickets.delete(&dropped, &cancel).await;

        uow.rollback();

        assert_eq!(session.entry_state::<Ticket>(fresh.id()), EntryState::Detached);
        assert_eq!(session.entry_state::<Ticket>(kept.id()), EntryState::Unchanged);
        assert_eq!(session.entry_state::<Ticket>(dropped.id()), EntryState::Unchanged);

        // 回滚后无待提交变更
        assert_eq!(session.save_changes(&cancel).await.unwrap(), 0);
        assert_eq!(session.committed::<Ticket>().len(), 2);
    }

    #[tokio::test]
    async fn execute_commits_on_success() {
        let session = Arc::new(InMemorySession::new());
        let uow = UnitOfWork::new(session.clone());
        let tickets = uow.repository::<Ticket>();
        let cancel = CancellationToken::new();

        let ok = uow
            .execute(
                || async {
                    tickets.insert(&mut ticket(7), &cancel).await;
                    Ok::<_, anyhow::Error>(())
                },
                |_| panic!("must not be called"),
                &cancel,
            )
            .await;

        assert!(ok);
        assert_eq!(session.committed::<Ticket>().len(), 1);
    }

    #[tokio::test]
    async fn execute_calls_on_failed_when_action_errors() {
        let session = Arc::new(InMemorySession::new());
        let uow = UnitOfWork::new(session.clone());
        let tickets = uow.repository::<Ticket>();
        let cancel = CancellationToken::new();
        let failed = AtomicBool::new(false);

        let ok = uow
            .execute(
                || async {
                    tickets.insert(&mut ticket(8), &cancel).await;
                    Err(std::io::Error::other("seat map unavailable"))
                },
                |s: &InMemorySession| {
                    failed.store(true, Ordering::Relaxed);
                    assert_eq!(s.entries().len(), 1);
                },
                &cancel,
            )
            .await;

        assert!(!ok);
        assert!(failed.load(Ordering::Relaxed));
        assert!(session.committed::<Ticket>().is_empty());
    }

    #[tokio::test]
    async fn execute_with_falls_back_when_commit_fails() {
        let session = Arc::new(InMemorySession::new());
        let uow = UnitOfWork::new(session.clone());
        let tickets = uow.repository::<Ticket>();
        let cancel = CancellationToken::new();
        session.fail_next_save("deadlock");

        let seat = uow
            .execute_with(
                || async {
                    let mut t = ticket(9);
                    tickets.insert(&mut t, &cancel).await;
                    Ok::<_, anyhow::Error>(t.seat)
                },
                |_| 0,
                &cancel,
            )
            .await;

        assert_eq!(seat, 0);
        assert!(session.committed::<Ticket>().is_empty());

        // 变更仍在跟踪中，再次提交即可落库
        assert!(uow.commit(&cancel).await);
        assert_eq!(session.committed::<Ticket>().len(), 1);
    }
}
