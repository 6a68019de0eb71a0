//! 规约求值器
//!
//! 将规约按固定顺序编译到基础查询之上：
//! 1. 筛选条件；
//! 2. 带类型的预加载（声明顺序），再是字符串路径预加载（声明顺序），两条轴互不合并；
//! 3. 排序（升序或降序）；
//! 4. 启用分页时先跳过再截取。
//!
//! 先排序后分页保证分页结果稳定。
//!
use crate::query::Query;
use ddd_domain::specification::Specification;

/// 无状态的规约求值器
pub struct SpecificationEvaluator;

impl SpecificationEvaluator {
    pub fn evaluate<T>(base: Query<T>, spec: &Specification<T>) -> Query<T> {
        let mut query = base;

        if let Some(filter) = spec.filter() {
            query = query.filter_shared(filter.clone());
        }

        query = spec
            .includes()
            .iter()
            .fold(query, |q, include| q.include(include.path()));

        query = spec
            .include_paths()
            .iter()
            .fold(query, |q, path| q.include_path(path.clone()));

        if let Some(order) = spec.order() {
            query = query.order_by(order.clone());
        }

        if let Some(paging) = spec.paging() {
            query = query.skip(paging.skip).take(paging.take);
        }

        query
    }
}
