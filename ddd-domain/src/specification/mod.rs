//! 规约（Specification）
//!
//! 对一次查询的声明式描述：筛选条件、预加载（带类型与字符串路径两条独立轴）、
//! 单一排序槽（升序/降序互斥，后设置者生效）以及可选的分页窗口。
//! 通过构建器一次性构造，之后只读，由持久化层的求值器编译为查询计划。
//!
mod criteria;
mod include;
mod ordering;

pub use criteria::{
    Composite, Contains, Criteria, FnCriteria, OneOf, SharedCriteria, contains, criteria, one_of,
};
pub use include::Include;
pub use ordering::{OrderBy, Paging, SortKey};

use std::fmt;

/// 查询规约
pub struct Specification<T> {
    filter: Option<SharedCriteria<T>>,
    includes: Vec<Include<T>>,
    include_paths: Vec<String>,
    order: Option<OrderBy<T>>,
    paging: Option<Paging>,
}

impl<T> Specification<T> {
    /// 仅带筛选条件的规约
    pub fn new<C>(filter: C) -> Self
    where
        C: Criteria<T> + 'static,
    {
        Self::builder().filter(filter).build()
    }

    /// 不加任何限制的规约
    pub fn all() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> SpecificationBuilder<T> {
        SpecificationBuilder {
            spec: Specification {
                filter: None,
                includes: Vec::new(),
                include_paths: Vec::new(),
                order: None,
                paging: None,
            },
        }
    }

    pub fn filter(&self) -> Option<&SharedCriteria<T>> {
        self.filter.as_ref()
    }

    /// 带类型的预加载，按声明顺序
    pub fn includes(&self) -> &[Include<T>] {
        &self.includes
    }

    /// 字符串路径预加载，按声明顺序
    pub fn include_paths(&self) -> &[String] {
        &self.include_paths
    }

    pub fn order(&self) -> Option<&OrderBy<T>> {
        self.order.as_ref()
    }

    pub fn paging(&self) -> Option<Paging> {
        self.paging
    }

    pub fn is_paging_enabled(&self) -> bool {
        self.paging.is_some()
    }

    /// 候选对象是否满足筛选条件（无条件时恒为真）
    pub fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|f| f.is_satisfied_by(candidate))
    }
}

impl<T> Clone for Specification<T> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            includes: self.includes.clone(),
            include_paths: self.include_paths.clone(),
            order: self.order.clone(),
            paging: self.paging,
        }
    }
}

impl<T> Default for Specification<T> {
    fn default() -> Self {
        Self::all()
    }
}

impl<T> fmt::Debug for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("filtered", &self.filter.is_some())
            .field("includes", &self.includes)
            .field("include_paths", &self.include_paths)
            .field("order", &self.order)
            .field("paging", &self.paging)
            .finish()
    }
}

/// 规约构建器
pub struct SpecificationBuilder<T> {
    spec: Specification<T>,
}

impl<T> SpecificationBuilder<T> {
    /// 设置筛选条件（覆盖之前的设置）；已共享的条件直接复用
    pub fn filter<C>(mut self, filter: C) -> Self
    where
        C: Criteria<T> + 'static,
    {
        self.spec.filter = Some(filter.shared());
        self
    }

    /// 以闭包作为筛选条件
    pub fn filter_fn<F>(self, f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter(criteria(f))
    }

    /// 追加带类型的预加载
    pub fn include<N>(mut self, path: &'static str, selector: fn(&T) -> &N) -> Self
    where
        N: ?Sized,
    {
        self.spec.includes.push(Include::of(path, selector));
        self
    }

    /// 追加字符串路径预加载（可表达多级路径，如 `"lines.product"`）
    pub fn include_path(mut self, path: impl Into<String>) -> Self {
        self.spec.include_paths.push(path.into());
        self
    }

    /// 升序排序；覆盖之前的任一排序
    pub fn order_by<K, F>(mut self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.spec.order = Some(OrderBy::ascending(key));
        self
    }

    /// 降序排序；覆盖之前的任一排序
    pub fn order_by_descending<K, F>(mut self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.spec.order = Some(OrderBy::descending(key));
        self
    }

    /// 启用分页：跳过 `skip` 行后取 `take` 行
    pub fn paging(mut self, skip: usize, take: usize) -> Self {
        self.spec.paging = Some(Paging::new(skip, take));
        self
    }

    /// 启用分页：第 `index` 页（从 0 开始），每页 `size` 行
    pub fn page(mut self, index: usize, size: usize) -> Self {
        self.spec.paging = Some(Paging::page(index, size));
        self
    }

    pub fn build(self) -> Specification<T> {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Order {
        total: u32,
        lines: Vec<u32>,
        customer: Customer,
    }

    #[derive(Debug)]
    struct Customer;

    fn order(total: u32) -> Order {
        Order {
            total,
            lines: vec![total],
            customer: Customer,
        }
    }

    #[test]
    fn empty_specification_accepts_everything() {
        let spec = Specification::<Order>::all();
        assert!(spec.filter().is_none());
        assert!(spec.order().is_none());
        assert!(!spec.is_paging_enabled());
        assert!(spec.is_satisfied_by(&order(0)));
    }

    #[test]
    fn builder_keeps_includes_in_declaration_order() {
        let spec = Specification::<Order>::builder()
            .include("lines", |o: &Order| &o.lines)
            .include_path("lines.product")
            .include("customer", |o: &Order| &o.customer)
            .include_path("customer.address")
            .build();

        let typed: Vec<_> = spec.includes().iter().map(Include::path).collect();
        assert_eq!(typed, ["lines", "customer"]);
        assert_eq!(spec.include_paths(), ["lines.product", "customer.address"]);
        assert!(spec.includes()[1].target().ends_with("Customer"));
    }

    #[test]
    fn last_order_wins() {
        let spec = Specification::<Order>::builder()
            .order_by(|o| o.total)
            .order_by_descending(|o| o.total)
            .build();

        let order_by = spec.order().unwrap();
        assert!(order_by.is_descending());
        assert_eq!(order_by.compare(&order(1), &order(2)), Ordering::Greater);
    }

    #[test]
    fn paging_presence_is_the_enabled_flag() {
        let spec = Specification::<Order>::builder().page(2, 10).build();
        assert!(spec.is_paging_enabled());
        assert_eq!(spec.paging(), Some(Paging::new(20, 10)));
    }

    #[test]
    fn new_wraps_filter() {
        let spec = Specification::new(criteria(|o: &Order| o.total > 100));
        assert!(spec.is_satisfied_by(&order(150)));
        assert!(!spec.is_satisfied_by(&order(50)));

        let cloned = spec.clone();
        assert!(cloned.filter().is_some());
    }

    #[test]
    fn shared_filter_is_reused_not_rewrapped() {
        let big: SharedCriteria<Order> = criteria(|o: &Order| o.total > 100).shared();
        let spec = Specification::builder().filter(big.clone()).build();

        assert!(spec.filter().is_some_and(|f| Arc::ptr_eq(f, &big)));

        let narrowed = Specification::builder()
            .filter(big.clone().and(criteria(|o: &Order| o.lines.len() == 1)))
            .build();
        assert!(narrowed.is_satisfied_by(&order(150)));
        assert!(!narrowed.is_satisfied_by(&order(50)));
    }
}
