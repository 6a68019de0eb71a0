//! 仓储保存策略
//!
//! - `LocalSave`（默认）：每次变更后立即落库，受影响行数大于 0 视为成功；
//! - `PartOfUnitOfWork`：仓储只登记变更，落库交由工作单元，`save` 直接返回成功。
//!
use crate::cancellation::cancellable;
use crate::session::Session;
use ddd_domain::error::DomainResult;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    #[default]
    LocalSave,
    PartOfUnitOfWork,
}

impl SaveState {
    pub fn is_part_of_unit_of_work(&self) -> bool {
        matches!(self, SaveState::PartOfUnitOfWork)
    }

    /// 按策略落库
    pub async fn save<S>(&self, session: &S, cancel: &CancellationToken) -> DomainResult<bool>
    where
        S: Session,
    {
        match self {
            SaveState::LocalSave => {
                let rows = cancellable(cancel, session.save_changes(cancel)).await?;
                Ok(rows > 0)
            }
            SaveState::PartOfUnitOfWork => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_save() {
        assert_eq!(SaveState::default(), SaveState::LocalSave);
        assert!(!SaveState::default().is_part_of_unit_of_work());
    }

    #[test]
    fn reads_from_config_values() {
        let state: SaveState = serde_json::from_str("\"part_of_unit_of_work\"").unwrap();
        assert_eq!(state, SaveState::PartOfUnitOfWork);
        assert_eq!(
            serde_json::to_string(&SaveState::LocalSave).unwrap(),
            "\"local_save\""
        );
    }
}
