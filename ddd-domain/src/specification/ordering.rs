//! 排序与分页
//!
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// 排序键：比较两行的先后
pub type SortKey<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// 单一排序槽：升序或降序，二者互斥
pub enum OrderBy<T> {
    Ascending(SortKey<T>),
    Descending(SortKey<T>),
}

impl<T> OrderBy<T> {
    /// 按键升序
    pub fn ascending<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::Ascending(Arc::new(move |a: &T, b: &T| key(a).cmp(&key(b))))
    }

    /// 按键降序
    pub fn descending<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::Descending(Arc::new(move |a: &T, b: &T| key(a).cmp(&key(b))))
    }

    pub fn is_descending(&self) -> bool {
        matches!(self, Self::Descending(_))
    }

    /// 按方向比较两行
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        match self {
            Self::Ascending(key) => key(a, b),
            Self::Descending(key) => key(a, b).reverse(),
        }
    }
}

impl<T> Clone for OrderBy<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Ascending(key) => Self::Ascending(key.clone()),
            Self::Descending(key) => Self::Descending(key.clone()),
        }
    }
}

impl<T> fmt::Debug for OrderBy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending(_) => f.write_str("Ascending"),
            Self::Descending(_) => f.write_str("Descending"),
        }
    }
}

/// 分页窗口；存在即表示启用分页
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Paging {
    pub skip: usize,
    pub take: usize,
}

impl Paging {
    pub const fn new(skip: usize, take: usize) -> Self {
        Self { skip, take }
    }

    /// 第 `index` 页（从 0 开始），每页 `size` 行
    pub const fn page(index: usize, size: usize) -> Self {
        Self {
            skip: index.saturating_mul(size),
            take: size,
        }
    }
}
