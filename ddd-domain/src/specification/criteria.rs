//! 筛选条件（Criteria）
//!
//! 条件一经放入规约或查询计划就以 `SharedCriteria`（`Arc`）形式流转：
//! 求值器、仓储的 `count`/`first` 与组合操作都直接复用同一份条件，不重新装箱。
//! 组合结果 `Composite` 同样只持有 `Arc`，可廉价克隆。
//!
use std::fmt;
use std::sync::Arc;

/// 共享的条件句柄
pub type SharedCriteria<T> = Arc<dyn Criteria<T>>;

/// 作用于单行的筛选条件
pub trait Criteria<T>: Send + Sync {
    fn is_satisfied_by(&self, candidate: &T) -> bool;

    /// 与另一条件同时满足
    fn and<C>(self, other: C) -> Composite<T>
    where
        Self: Sized + 'static,
        C: Criteria<T> + 'static,
    {
        Composite::All(vec![self.shared(), other.shared()])
    }

    /// 任一满足
    fn or<C>(self, other: C) -> Composite<T>
    where
        Self: Sized + 'static,
        C: Criteria<T> + 'static,
    {
        Composite::Any(vec![self.shared(), other.shared()])
    }

    fn not(self) -> Composite<T>
    where
        Self: Sized + 'static,
    {
        Composite::Not(self.shared())
    }

    /// 转为共享句柄
    fn shared(self) -> SharedCriteria<T>
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

impl<T> Criteria<T> for SharedCriteria<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.as_ref().is_satisfied_by(candidate)
    }

    fn shared(self) -> SharedCriteria<T> {
        self
    }
}

/// 组合条件
pub enum Composite<T> {
    /// 全部满足（空集恒真）
    All(Vec<SharedCriteria<T>>),
    /// 任一满足（空集恒假）
    Any(Vec<SharedCriteria<T>>),
    Not(SharedCriteria<T>),
}

impl<T> Composite<T> {
    /// 由多个共享条件构造 `All`
    pub fn all_of(parts: impl IntoIterator<Item = SharedCriteria<T>>) -> Self {
        Self::All(parts.into_iter().collect())
    }

    /// 由多个共享条件构造 `Any`
    pub fn any_of(parts: impl IntoIterator<Item = SharedCriteria<T>>) -> Self {
        Self::Any(parts.into_iter().collect())
    }
}

impl<T: 'static> Composite<T> {
    /// 追加一个必须满足的条件；`All` 原地扩展，其他形态外包一层 `All`
    pub fn and_also<C>(self, other: C) -> Self
    where
        C: Criteria<T> + 'static,
    {
        match self {
            Self::All(mut parts) => {
                parts.push(other.shared());
                Self::All(parts)
            }
            composite => Self::All(vec![composite.shared(), other.shared()]),
        }
    }

    /// 追加一个备选条件；`Any` 原地扩展
    pub fn or_else<C>(self, other: C) -> Self
    where
        C: Criteria<T> + 'static,
    {
        match self {
            Self::Any(mut parts) => {
                parts.push(other.shared());
                Self::Any(parts)
            }
            composite => Self::Any(vec![composite.shared(), other.shared()]),
        }
    }
}

impl<T> Criteria<T> for Composite<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        match self {
            Self::All(parts) => parts.iter().all(|c| c.is_satisfied_by(candidate)),
            Self::Any(parts) => parts.iter().any(|c| c.is_satisfied_by(candidate)),
            Self::Not(inner) => !inner.is_satisfied_by(candidate),
        }
    }
}

impl<T> Clone for Composite<T> {
    fn clone(&self) -> Self {
        match self {
            Self::All(parts) => Self::All(parts.clone()),
            Self::Any(parts) => Self::Any(parts.clone()),
            Self::Not(inner) => Self::Not(inner.clone()),
        }
    }
}

impl<T> fmt::Debug for Composite<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All(parts) => write!(f, "All({})", parts.len()),
            Self::Any(parts) => write!(f, "Any({})", parts.len()),
            Self::Not(_) => f.write_str("Not"),
        }
    }
}

/// 闭包形式的条件，见 [`criteria`]
pub struct FnCriteria<F>(F);

impl<T, F> Criteria<T> for FnCriteria<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (self.0)(candidate)
    }
}

impl<F> fmt::Debug for FnCriteria<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnCriteria")
    }
}

/// 将闭包包装为条件
///
/// ```
/// use ddd_domain::specification::{Criteria, criteria};
///
/// let adult = criteria(|age: &u32| *age >= 18);
/// let senior = criteria(|age: &u32| *age >= 65);
/// let working_age = adult.and(senior.not());
///
/// assert!(working_age.is_satisfied_by(&30));
/// assert!(!working_age.is_satisfied_by(&70));
/// ```
pub fn criteria<T, F>(f: F) -> FnCriteria<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    FnCriteria(f)
}

/// 字段值属于给定集合，见 [`one_of`]
pub struct OneOf<F, K> {
    key: F,
    values: Vec<K>,
}

impl<T, F, K> Criteria<T> for OneOf<F, K>
where
    F: Fn(&T) -> K + Send + Sync,
    K: PartialEq + Send + Sync,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.values.contains(&(self.key)(candidate))
    }
}

pub fn one_of<T, F, K>(key: F, values: impl IntoIterator<Item = K>) -> OneOf<F, K>
where
    F: Fn(&T) -> K + Send + Sync,
{
    OneOf {
        key,
        values: values.into_iter().collect(),
    }
}

/// 字符串字段包含关键字（区分大小写），见 [`contains`]
pub struct Contains<F> {
    field: F,
    keyword: String,
}

impl<T, F> Criteria<T> for Contains<F>
where
    F: Fn(&T) -> &str + Send + Sync,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (self.field)(candidate).contains(self.keyword.as_str())
    }
}

pub fn contains<T, F>(field: F, keyword: impl Into<String>) -> Contains<F>
where
    F: Fn(&T) -> &str + Send + Sync,
{
    Contains {
        field,
        keyword: keyword.into(),
    }
}
