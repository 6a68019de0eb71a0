//! 查询计划（Query）
//!
//! 有序的查询操作列表，由规约求值器按固定顺序追加；
//! `apply` 在内存行集上自左向右执行（排序为稳定排序）。
//!
//! 另有一组条件式组合方法（`filter_if`、`order_by_if`、`filter_contains`、`filter_in`），
//! 便于按可选的请求参数拼装查询：条件不成立或参数为空时计划保持不变。
//!
use ddd_domain::specification::{Criteria, OrderBy, SharedCriteria, contains, one_of};
use std::fmt;

/// 预加载目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeTarget {
    /// 带类型检查的导航属性
    Navigation(&'static str),
    /// 字符串路径
    Path(String),
}

/// 单个查询操作
pub enum QueryOp<T> {
    Filter(SharedCriteria<T>),
    Include(IncludeTarget),
    OrderBy(OrderBy<T>),
    Skip(usize),
    Take(usize),
}

impl<T> Clone for QueryOp<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Filter(c) => Self::Filter(c.clone()),
            Self::Include(i) => Self::Include(i.clone()),
            Self::OrderBy(o) => Self::OrderBy(o.clone()),
            Self::Skip(n) => Self::Skip(*n),
            Self::Take(n) => Self::Take(*n),
        }
    }
}

impl<T> fmt::Debug for QueryOp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(_) => f.write_str("Filter"),
            Self::Include(i) => f.debug_tuple("Include").field(i).finish(),
            Self::OrderBy(o) => f.debug_tuple("OrderBy").field(o).finish(),
            Self::Skip(n) => f.debug_tuple("Skip").field(n).finish(),
            Self::Take(n) => f.debug_tuple("Take").field(n).finish(),
        }
    }
}

/// 查询计划
pub struct Query<T> {
    ops: Vec<QueryOp<T>>,
}

impl<T> Query<T> {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn filter<C>(self, criteria: C) -> Self
    where
        C: Criteria<T> + 'static,
    {
        self.filter_shared(criteria.shared())
    }

    pub fn filter_shared(mut self, criteria: SharedCriteria<T>) -> Self {
        self.ops.push(QueryOp::Filter(criteria));
        self
    }

    pub fn include(mut self, navigation: &'static str) -> Self {
        self.ops
            .push(QueryOp::Include(IncludeTarget::Navigation(navigation)));
        self
    }

    pub fn include_path(mut self, path: impl Into<String>) -> Self {
        self.ops.push(QueryOp::Include(IncludeTarget::Path(path.into())));
        self
    }

    pub fn order_by(mut self, order: OrderBy<T>) -> Self {
        self.ops.push(QueryOp::OrderBy(order));
        self
    }

    /// `condition` 成立时才追加筛选
    pub fn filter_if<C>(self, condition: bool, criteria: C) -> Self
    where
        C: Criteria<T> + 'static,
    {
        if condition { self.filter(criteria) } else { self }
    }

    /// `condition` 成立时才追加排序
    pub fn order_by_if(self, condition: bool, order: OrderBy<T>) -> Self {
        if condition { self.order_by(order) } else { self }
    }

    /// 字符串字段包含关键字；关键字缺失或全为空白时不筛选
    pub fn filter_contains<F>(self, field: F, keyword: Option<&str>) -> Self
    where
        T: 'static,
        F: Fn(&T) -> &str + Send + Sync + 'static,
    {
        match keyword.filter(|k| !k.trim().is_empty()) {
            Some(keyword) => self.filter(contains(field, keyword)),
            None => self,
        }
    }

    /// 字段值属于给定集合；集合为空时不筛选
    pub fn filter_in<K, F>(self, key: F, values: impl IntoIterator<Item = K>) -> Self
    where
        T: 'static,
        K: PartialEq + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let values: Vec<K> = values.into_iter().collect();
        if values.is_empty() {
            return self;
        }
        self.filter(one_of(key, values))
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.ops.push(QueryOp::Skip(n));
        self
    }

    pub fn take(mut self, n: usize) -> Self {
        self.ops.push(QueryOp::Take(n));
        self
    }

    pub fn ops(&self) -> &[QueryOp<T>] {
        &self.ops
    }

    /// 计划中的预加载目标（按追加顺序）
    pub fn includes(&self) -> impl Iterator<Item = &IncludeTarget> {
        self.ops.iter().filter_map(|op| match op {
            QueryOp::Include(target) => Some(target),
            _ => None,
        })
    }

    /// 在内存行集上执行计划
    ///
    /// 预加载对内存行没有意义，直接跳过。
    pub fn apply(&self, mut rows: Vec<T>) -> Vec<T> {
        for op in &self.ops {
            match op {
                QueryOp::Filter(c) => rows.retain(|r| c.is_satisfied_by(r)),
                QueryOp::Include(_) => {}
                QueryOp::OrderBy(order) => rows.sort_by(|a, b| order.compare(a, b)),
                QueryOp::Skip(n) => {
                    rows.drain(..(*n).min(rows.len()));
                }
                QueryOp::Take(n) => rows.truncate(*n),
            }
        }
        rows
    }
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            ops: self.ops.clone(),
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.ops).finish()
    }
}
