//! 通用仓储（Repository）
//!
//! 面向单一聚合类型的增删改查，外加两个组合操作：
//! - `insert_if_not_exists`：按条件查重，不存在才创建并插入；
//! - `update_or_not_found`：按标识加载，存在才修改并持久化。
//!
//! 变更类操作在仓储边界捕获所有错误，以 `tracing::error!` 记录后返回 `false`；
//! 读取类操作返回 `DomainResult`。是否立即落库由 `SaveState` 决定。
//!
//! `insert`/`update` 借用调用方的聚合：其事件缓冲整体移交给会话中的跟踪副本，
//! 调用方之后看到的缓冲为空。失败时事件留在会话里，由下一次保存或回滚处理。
//!
use crate::cancellation::cancellable;
use crate::evaluator::SpecificationEvaluator;
use crate::query::Query;
use crate::save_state::SaveState;
use crate::session::{Persistable, Session};
use bon::bon;
use ddd_domain::entity::Entity;
use ddd_domain::entity_id::EntityId;
use ddd_domain::error::DomainResult;
use ddd_domain::specification::{Criteria, Specification};
use std::any::type_name;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// 聚合 `A` 的通用仓储
pub struct Repository<A, S> {
    session: Arc<S>,
    state: SaveState,
    _aggregate: PhantomData<fn() -> A>,
}

#[bon]
impl<A, S> Repository<A, S>
where
    A: Persistable,
    S: Session,
{
    #[builder]
    pub fn new(session: Arc<S>, #[builder(default)] state: SaveState) -> Self {
        Self {
            session,
            state,
            _aggregate: PhantomData,
        }
    }

    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    /// 切换保存策略
    pub fn set_state(&mut self, state: SaveState) {
        self.state = state;
    }

    /// 以指定保存策略返回仓储
    pub fn with_state(mut self, state: SaveState) -> Self {
        self.state = state;
        self
    }

    // ---------- 写入 ----------

    pub async fn insert(&self, entity: &mut A, cancel: &CancellationToken) -> bool {
        let tracked = hand_over(entity);
        self.guard("insert", cancel, async {
            self.session.add(tracked).await?;
            self.state.save(&*self.session, cancel).await
        })
        .await
    }

    pub async fn insert_many(&self, entities: &mut [A], cancel: &CancellationToken) -> bool {
        let tracked: Vec<A> = entities.iter_mut().map(hand_over).collect();
        self.guard("insert_many", cancel, async {
            self.session.add_range(tracked).await?;
            self.state.save(&*self.session, cancel).await
        })
        .await
    }

    pub async fn update(&self, entity: &mut A, cancel: &CancellationToken) -> bool {
        let tracked = hand_over(entity);
        self.guard("update", cancel, async {
            self.session.update(tracked).await?;
            self.state.save(&*self.session, cancel).await
        })
        .await
    }

    pub async fn update_many(&self, entities: &mut [A], cancel: &CancellationToken) -> bool {
        let tracked: Vec<A> = entities.iter_mut().map(hand_over).collect();
        self.guard("update_many", cancel, async {
            self.session.update_range(tracked).await?;
            self.state.save(&*self.session, cancel).await
        })
        .await
    }

    /// 按标识删除；不存在时仅执行保存
    pub async fn delete_by_id(&self, id: &EntityId, cancel: &CancellationToken) -> bool {
        self.guard("delete_by_id", cancel, async {
            if let Some(entity) = self.session.find::<A>(id).await? {
                self.session.remove(&entity).await?;
            }
            self.state.save(&*self.session, cancel).await
        })
        .await
    }

    pub async fn delete(&self, entity: &A, cancel: &CancellationToken) -> bool {
        self.guard("delete", cancel, async {
            self.session.remove(entity).await?;
            self.state.save(&*self.session, cancel).await
        })
        .await
    }

    pub async fn delete_many(&self, entities: &[A], cancel: &CancellationToken) -> bool {
        self.guard("delete_many", cancel, async {
            for entity in entities {
                self.session.remove(entity).await?;
            }
            self.state.save(&*self.session, cancel).await
        })
        .await
    }

    /// 删除所有满足条件的行
    pub async fn delete_where<C>(&self, criteria: C, cancel: &CancellationToken) -> bool
    where
        C: Criteria<A> + 'static,
    {
        self.guard("delete_where", cancel, async {
            let matched = self.session.fetch(&Query::new().filter(criteria)).await?;
            for entity in &matched {
                self.session.remove(entity).await?;
            }
            self.state.save(&*self.session, cancel).await
        })
        .await
    }

    /// 按保存策略落库
    pub async fn save(&self, cancel: &CancellationToken) -> bool {
        self.guard("save", cancel, self.state.save(&*self.session, cancel))
            .await
    }

    // ---------- 读取 ----------

    pub async fn find(
        &self,
        id: &EntityId,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<A>> {
        cancellable(cancel, self.session.find(id)).await
    }

    /// 第一条满足条件的行
    pub async fn first<C>(
        &self,
        criteria: C,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<A>>
    where
        C: Criteria<A> + 'static,
    {
        let query = Query::new().filter(criteria).take(1);
        let rows = cancellable(cancel, self.session.fetch(&query)).await?;
        Ok(rows.into_iter().next())
    }

    /// 按规约查询
    pub async fn list(
        &self,
        spec: &Specification<A>,
        cancel: &CancellationToken,
    ) -> DomainResult<Vec<A>> {
        let query = SpecificationEvaluator::evaluate(Query::new(), spec);
        cancellable(cancel, self.session.fetch(&query)).await
    }

    /// 满足规约筛选条件的行数（忽略排序与分页）
    pub async fn count(
        &self,
        spec: &Specification<A>,
        cancel: &CancellationToken,
    ) -> DomainResult<usize> {
        let query = match spec.filter() {
            Some(filter) => Query::new().filter_shared(filter.clone()),
            None => Query::new(),
        };
        let rows = cancellable(cancel, self.session.fetch(&query)).await?;
        Ok(rows.len())
    }

    /// 执行查询计划
    pub async fn fetch(
        &self,
        query: &Query<A>,
        cancel: &CancellationToken,
    ) -> DomainResult<Vec<A>> {
        cancellable(cancel, self.session.fetch(query)).await
    }

    // ---------- 组合操作 ----------

    /// 不存在才插入
    ///
    /// 找到满足 `exists` 的行时调用 `on_exists`，不做任何修改；否则以 `create`
    /// 构造并插入，成功时 `on_final(Some(entity))`，失败时 `on_final(None)`。
    /// 每次调用至多尝试一次插入。
    pub async fn insert_if_not_exists<R, C, OnExists, Create, OnFinal>(
        &self,
        exists: C,
        on_exists: OnExists,
        create: Create,
        on_final: OnFinal,
        cancel: &CancellationToken,
    ) -> DomainResult<R>
    where
        C: Criteria<A> + 'static,
        OnExists: FnOnce() -> R,
        Create: FnOnce() -> A,
        OnFinal: FnOnce(Option<A>) -> R,
    {
        if self.first(exists, cancel).await?.is_some() {
            return Ok(on_exists());
        }

        let mut entity = create();
        let inserted = self.insert(&mut entity, cancel).await;
        Ok(on_final(inserted.then_some(entity)))
    }

    /// `insert_if_not_exists` 的异步收尾版本
    pub async fn insert_if_not_exists_async<R, C, OnExists, Create, OnFinal, Fut>(
        &self,
        exists: C,
        on_exists: OnExists,
        create: Create,
        on_final: OnFinal,
        cancel: &CancellationToken,
    ) -> DomainResult<R>
    where
        C: Criteria<A> + 'static,
        OnExists: FnOnce() -> R,
        Create: FnOnce() -> A,
        OnFinal: FnOnce(Option<A>) -> Fut,
        Fut: Future<Output = R>,
    {
        if self.first(exists, cancel).await?.is_some() {
            return Ok(on_exists());
        }

        let mut entity = create();
        let inserted = self.insert(&mut entity, cancel).await;
        Ok(on_final(inserted.then_some(entity)).await)
    }

    /// 存在才更新
    ///
    /// 按标识加载；不存在时调用 `on_not_found`；否则以 `update` 修改并持久化，
    /// 成功时 `on_final(Some(updated))`，失败时 `on_final(None)`。
    pub async fn update_or_not_found<R, NotFound, OnFinal, Update>(
        &self,
        id: &EntityId,
        on_not_found: NotFound,
        on_final: OnFinal,
        update: Update,
        cancel: &CancellationToken,
    ) -> DomainResult<R>
    where
        NotFound: FnOnce() -> R,
        OnFinal: FnOnce(Option<A>) -> R,
        Update: FnOnce(A) -> A,
    {
        let Some(entity) = self.find(id, cancel).await? else {
            return Ok(on_not_found());
        };

        let mut updated = update(entity);
        let persisted = self.update(&mut updated, cancel).await;
        Ok(on_final(persisted.then_some(updated)))
    }

    /// `update_or_not_found` 的异步收尾版本
    pub async fn update_or_not_found_async<R, NotFound, OnFinal, Update, Fut>(
        &self,
        id: &EntityId,
        on_not_found: NotFound,
        on_final: OnFinal,
        update: Update,
        cancel: &CancellationToken,
    ) -> DomainResult<R>
    where
        NotFound: FnOnce() -> R,
        OnFinal: FnOnce(Option<A>) -> Fut,
        Update: FnOnce(A) -> A,
        Fut: Future<Output = R>,
    {
        let Some(entity) = self.find(id, cancel).await? else {
            return Ok(on_not_found());
        };

        let mut updated = update(entity);
        let persisted = self.update(&mut updated, cancel).await;
        Ok(on_final(persisted.then_some(updated)).await)
    }

    async fn guard<F>(&self, op: &'static str, cancel: &CancellationToken, fut: F) -> bool
    where
        F: Future<Output = DomainResult<bool>>,
    {
        match cancellable(cancel, fut).await {
            Ok(saved) => saved,
            Err(err) => {
                error!(
                    entity = type_name::<A>(),
                    op,
                    state = ?self.state,
                    error = %err,
                    "repository operation failed"
                );
                false
            }
        }
    }
}

/// 取走调用方的事件缓冲，返回携带这些事件的跟踪副本
fn hand_over<A: Persistable>(entity: &mut A) -> A {
    let events = entity
        .as_aggregate_root_mut()
        .map(|root| root.domain_events_mut().take())
        .unwrap_or_default();
    let mut tracked = entity.clone();
    if let Some(root) = tracked.as_aggregate_root_mut() {
        root.domain_events_mut().restore(events);
    }
    tracked
}

impl<A, S> Clone for Repository<A, S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            state: self.state,
            _aggregate: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory_session::InMemorySession;
    use ddd_domain::entity::Entity;
    use ddd_domain::specification::criteria;
    use ddd_macros::entity;

    #[entity]
    #[derive(Debug, Clone, Default)]
    struct Customer {
        email: String,
        vip: bool,
    }

    fn customer(email: &str) -> Customer {
        Customer {
            id: EntityId::create_unique(),
            email: email.into(),
            ..Default::default()
        }
    }

    fn repo() -> (Arc<InMemorySession>, Repository<Customer, InMemorySession>) {
        let session = Arc::new(InMemorySession::new());
        let repo = Repository::builder().session(session.clone()).build();
        (session, repo)
    }

    #[tokio::test]
    async fn local_save_flushes_every_mutation() {
        let (session, repo) = repo();
        let cancel = CancellationToken::new();
        let mut c = customer("a@x.io");

        assert_eq!(repo.state(), SaveState::LocalSave);
        assert!(repo.insert(&mut c, &cancel).await);
        assert_eq!(session.committed::<Customer>().len(), 1);

        c.vip = true;
        assert!(repo.update(&mut c, &cancel).await);
        assert!(repo.find(c.id(), &cancel).await.unwrap().unwrap().vip);

        assert!(repo.delete_by_id(c.id(), &cancel).await);
        assert!(session.committed::<Customer>().is_empty());
    }

    #[tokio::test]
    async fn nothing_to_flush_reports_false() {
        let (_, repo) = repo();
        let cancel = CancellationToken::new();
        assert!(!repo.save(&cancel).await);
        assert!(!repo.delete_by_id(&EntityId::create_unique(), &cancel).await);
    }

    #[tokio::test]
    async fn part_of_unit_of_work_never_flushes() {
        let (session, repo) = repo();
        let repo = repo.with_state(SaveState::PartOfUnitOfWork);
        let cancel = CancellationToken::new();

        assert!(repo.insert(&mut customer("b@x.io"), &cancel).await);
        assert!(repo.save(&cancel).await);
        assert!(session.committed::<Customer>().is_empty());
        assert_eq!(session.entries().len(), 1);
    }

    #[tokio::test]
    async fn failures_are_reported_as_false() {
        let (session, repo) = repo();
        let cancel = CancellationToken::new();
        session.fail_next_save("connection reset");
        assert!(!repo.insert(&mut customer("c@x.io"), &cancel).await);

        let cancelled = CancellationToken::new();
        cancelled.cancel();
        assert!(!repo.insert(&mut customer("d@x.io"), &cancelled).await);
    }

    #[tokio::test]
    async fn insert_if_not_exists_takes_one_branch() {
        let (session, repo) = repo();
        let cancel = CancellationToken::new();

        let first = repo
            .insert_if_not_exists(
                criteria(|c: &Customer| c.email == "e@x.io"),
                || "exists",
                || customer("e@x.io"),
                |created| if created.is_some() { "created" } else { "failed" },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(first, "created");

        let mut created_again = false;
        let second = repo
            .insert_if_not_exists(
                criteria(|c: &Customer| c.email == "e@x.io"),
                || "exists",
                || {
                    created_again = true;
                    customer("e@x.io")
                },
                |_| "created",
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(second, "exists");
        assert!(!created_again);
        assert_eq!(session.committed::<Customer>().len(), 1);
    }

    #[tokio::test]
    async fn update_or_not_found_branches() {
        let (_, repo) = repo();
        let cancel = CancellationToken::new();
        let mut c = customer("f@x.io");
        repo.insert(&mut c, &cancel).await;

        let missing = repo
            .update_or_not_found(
                &EntityId::create_unique(),
                || None,
                |updated| updated.map(|u| u.vip),
                |c| c,
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(missing, None);

        let updated = repo
            .update_or_not_found_async(
                c.id(),
                || None,
                |updated| async move { updated.map(|u| u.vip) },
                |c| Customer { vip: true, ..c },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(updated, Some(true));
    }

    #[tokio::test]
    async fn reads_and_delete_where() {
        let (_, repo) = repo();
        let cancel = CancellationToken::new();
        repo.insert_many(
            &mut [customer("g@x.io"), customer("h@y.io"), customer("i@x.io")],
            &cancel,
        )
        .await;

        let spec = Specification::builder()
            .filter_fn(|c: &Customer| c.email.ends_with("@x.io"))
            .order_by_descending(|c| c.email.clone())
            .build();
        let emails: Vec<String> = repo
            .list(&spec, &cancel)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.email)
            .collect();
        assert_eq!(emails, ["i@x.io", "g@x.io"]);
        assert_eq!(repo.count(&spec, &cancel).await.unwrap(), 2);

        assert!(
            repo.delete_where(criteria(|c: &Customer| c.email.ends_with("@x.io")), &cancel)
                .await
        );
        assert_eq!(repo.count(&Specification::all(), &cancel).await.unwrap(), 1);
    }
}
