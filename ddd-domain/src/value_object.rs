//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象。相等性由类型声明的“相等分量”序列决定：
//! - 同一具体类型的两个值，分量逐一相等即视为相等；
//! - 哈希为各分量哈希的异或。
//!
//! 通常配合 `#[value_object]` 宏使用，由宏按字段声明顺序生成分量列表与
//! `PartialEq`/`Eq`/`Hash` 实现。
//!
use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 单个相等分量：可与另一分量比较，并提供稳定哈希
pub trait EqualityComponent: Any + fmt::Debug {
    /// 与另一分量比较（类型不同视为不等）
    fn component_eq(&self, other: &dyn EqualityComponent) -> bool;

    /// 分量哈希
    fn component_hash(&self) -> u64;

    fn as_any(&self) -> &dyn Any;
}

impl<T> EqualityComponent for T
where
    T: Any + PartialEq + Hash + fmt::Debug,
{
    fn component_eq(&self, other: &dyn EqualityComponent) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn component_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 值对象抽象
///
/// # 示例
///
/// ```
/// use ddd_domain::value_object::{EqualityComponent, ValueObject, value_objects_equal};
///
/// struct Money {
///     amount: i64,
///     currency: String,
/// }
///
/// impl ValueObject for Money {
///     fn equality_components(&self) -> Vec<&dyn EqualityComponent> {
///         vec![
///             &self.amount as &dyn EqualityComponent,
///             &self.currency as &dyn EqualityComponent,
///         ]
///     }
/// }
///
/// let a = Money { amount: 10, currency: "EUR".into() };
/// let b = Money { amount: 10, currency: "EUR".into() };
/// assert!(value_objects_equal(&a, &b));
/// ```
pub trait ValueObject {
    /// 按声明顺序返回参与相等比较的分量
    fn equality_components(&self) -> Vec<&dyn EqualityComponent>;
}

/// 分量序列逐一相等
pub fn value_objects_equal<V>(left: &V, right: &V) -> bool
where
    V: ValueObject + ?Sized,
{
    let left = left.equality_components();
    let right = right.equality_components();

    left.len() == right.len()
        && left
            .iter()
            .zip(right.iter())
            .all(|(l, r)| l.component_eq(*r))
}

/// 分量哈希的异或
pub fn value_object_hash<V>(value: &V) -> u64
where
    V: ValueObject + ?Sized,
{
    value
        .equality_components()
        .iter()
        .fold(0, |acc, component| acc ^ component.component_hash())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity_id::EntityId;
    use std::collections::HashSet;

    // 手写实现，不依赖宏
    #[derive(Debug)]
    struct Address {
        street: String,
        city: String,
        zip: u32,
    }

    impl ValueObject for Address {
        fn equality_components(&self) -> Vec<&dyn EqualityComponent> {
            vec![
                &self.street as &dyn EqualityComponent,
                &self.city as &dyn EqualityComponent,
                &self.zip as &dyn EqualityComponent,
            ]
        }
    }

    impl PartialEq for Address {
        fn eq(&self, other: &Self) -> bool {
            value_objects_equal(self, other)
        }
    }

    impl Eq for Address {}

    impl Hash for Address {
        fn hash<H: Hasher>(&self, state: &mut H) {
            state.write_u64(value_object_hash(self));
        }
    }

    fn address(street: &str, city: &str, zip: u32) -> Address {
        Address {
            street: street.into(),
            city: city.into(),
            zip,
        }
    }

    #[test]
    fn equal_components_mean_equal_values() {
        let a = address("Main St 1", "Berlin", 10115);
        let b = address("Main St 1", "Berlin", 10115);

        assert_eq!(a, b);
        assert_eq!(value_object_hash(&a), value_object_hash(&b));

        let set: HashSet<Address> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn any_component_change_breaks_equality() {
        let base = address("Main St 1", "Berlin", 10115);
        assert_ne!(base, address("Main St 2", "Berlin", 10115));
        assert_ne!(base, address("Main St 1", "Hamburg", 10115));
        assert_ne!(base, address("Main St 1", "Berlin", 20095));
    }

    #[test]
    fn hash_is_xor_of_component_hashes() {
        let a = address("Main St 1", "Berlin", 10115);
        let expected = a.street.component_hash() ^ a.city.component_hash() ^ a.zip.component_hash();
        assert_eq!(value_object_hash(&a), expected);
    }

    #[test]
    fn components_of_different_types_are_unequal() {
        let n: u32 = 7;
        let m: u64 = 7;
        assert!(!n.component_eq(&m));
        assert!(n.component_eq(&7u32));
    }

    #[test]
    fn entity_id_component_compares_by_value() {
        let id = EntityId::create_unique();
        let same = EntityId::create(id.value());
        assert!(id.component_eq(&same));
    }
}
