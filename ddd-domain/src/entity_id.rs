//! 实体标识（EntityId）
//!
//! 对 UUID 的强类型封装：身份比较与结构相等分离，
//! 并允许直接与原始 `Uuid` 比较。
//!
use crate::error::DomainError;
use crate::value_object::{EqualityComponent, ValueObject};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 全局唯一的实体标识
///
/// # 示例
///
/// ```
/// use ddd_domain::entity_id::EntityId;
/// use uuid::Uuid;
///
/// let raw = Uuid::new_v4();
/// let id = EntityId::create(raw);
/// assert_eq!(id, raw);
/// assert_eq!(id, EntityId::create(raw));
/// assert_ne!(id, EntityId::create_unique());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// 包装已有的 UUID
    pub const fn create(value: Uuid) -> Self {
        Self(value)
    }

    /// 生成新的唯一标识
    pub fn create_unique() -> Self {
        Self(Uuid::new_v4())
    }

    /// 获取底层 UUID
    pub const fn value(&self) -> Uuid {
        self.0
    }
}

impl ValueObject for EntityId {
    fn equality_components(&self) -> Vec<&dyn EqualityComponent> {
        vec![&self.0 as &dyn EqualityComponent]
    }
}

impl PartialEq<Uuid> for EntityId {
    fn eq(&self, other: &Uuid) -> bool {
        self.0 == *other
    }
}

impl PartialEq<EntityId> for Uuid {
    fn eq(&self, other: &EntityId) -> bool {
        *self == other.0
    }
}

impl From<Uuid> for EntityId {
    fn from(value: Uuid) -> Self {
        Self::create(value)
    }
}

impl From<EntityId> for Uuid {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for EntityId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_object::{value_object_hash, value_objects_equal};

    #[test]
    fn equality_follows_underlying_value() {
        let raw = Uuid::new_v4();
        let a = EntityId::create(raw);
        let b = EntityId::create(raw);

        assert_eq!(a, b);
        assert_eq!(a, raw);
        assert_eq!(raw, a);
        assert_ne!(a, EntityId::create(Uuid::new_v4()));
    }

    #[test]
    fn unique_ids_differ() {
        let ids: Vec<EntityId> = (0..16).map(|_| EntityId::create_unique()).collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn optional_creation_maps_none_to_none() {
        let none: Option<Uuid> = None;
        assert_eq!(none.map(EntityId::create), None);

        let raw = Uuid::new_v4();
        assert_eq!(Some(raw).map(EntityId::create), Some(EntityId::create(raw)));
    }

    #[test]
    fn conversions_and_text_form() {
        let raw = Uuid::new_v4();
        let id: EntityId = raw.into();
        let back: Uuid = id.into();
        assert_eq!(back, raw);

        let text = id.to_string();
        assert_eq!(text, raw.to_string());
        assert_eq!(text.parse::<EntityId>().unwrap(), id);
        assert!(matches!(
            "nope".parse::<EntityId>(),
            Err(DomainError::Parse { .. })
        ));
    }

    #[test]
    fn acts_as_single_component_value_object() {
        let raw = Uuid::new_v4();
        let a = EntityId::create(raw);
        let b = EntityId::create(raw);
        assert!(value_objects_equal(&a, &b));
        assert_eq!(value_object_hash(&a), value_object_hash(&b));
    }

    #[test]
    fn serde_is_transparent() {
        let id = EntityId::create_unique();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.value()));
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
