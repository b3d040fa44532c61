use glam::Vec2;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use super::protocol::{PacketError, aligned_copy};

/// Every replicated mutation a node can perform on the shared unit world.
///
/// Declaration order is the dispatch order: `index()` is used to look up the
/// handler table in [`crate::sim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum ActionKind {
    ToggleAnimAll,
    ToggleAnimSingle,
    CreateUnit,
    CreateUnitRandomSpawn,
    CreateUnitRandomDirection,
    DestroyUnit,
}

impl ActionKind {
    pub const COUNT: usize = 6;

    pub const ALL: [ActionKind; Self::COUNT] = [
        ActionKind::ToggleAnimAll,
        ActionKind::ToggleAnimSingle,
        ActionKind::CreateUnit,
        ActionKind::CreateUnitRandomSpawn,
        ActionKind::CreateUnitRandomDirection,
        ActionKind::DestroyUnit,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::ToggleAnimAll => "toggle-anim-all",
            ActionKind::ToggleAnimSingle => "toggle-anim-single",
            ActionKind::CreateUnit => "create-unit",
            ActionKind::CreateUnitRandomSpawn => "create-unit-random-spawn",
            ActionKind::CreateUnitRandomDirection => "create-unit-random-direction",
            ActionKind::DestroyUnit => "destroy-unit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub position: Vec2,
}

impl Action {
    pub fn new(kind: ActionKind, position: Vec2) -> Self {
        Self { kind, position }
    }

    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        rkyv::to_bytes::<rancor::Error>(&ActionRecord::from(*self))
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)
    }

    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        let aligned = aligned_copy(data);
        rkyv::from_bytes::<ActionRecord, rancor::Error>(&aligned)
            .map(Action::from)
            .map_err(PacketError::Deserialize)
    }
}

/// Wire form of an [`Action`]; positions travel as plain floats.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub position: [f32; 2],
}

impl From<Action> for ActionRecord {
    fn from(action: Action) -> Self {
        Self {
            kind: action.kind,
            position: action.position.to_array(),
        }
    }
}

impl From<ActionRecord> for Action {
    fn from(record: ActionRecord) -> Self {
        Self {
            kind: record.kind,
            position: Vec2::from_array(record.position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips() {
        for (i, kind) in ActionKind::ALL.into_iter().enumerate() {
            let action = Action::new(kind, Vec2::new(i as f32 * 10.5, -3.25));
            let bytes = action.encode().unwrap();
            assert_eq!(Action::decode(&bytes).unwrap(), action);
        }
    }

    #[test]
    fn kind_index_matches_declaration_order() {
        for (i, kind) in ActionKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn truncated_bytes_are_rejected() {
        let bytes = Action::new(ActionKind::CreateUnit, Vec2::new(100.0, 200.0))
            .encode()
            .unwrap();

        assert!(Action::decode(&bytes[..bytes.len() - 1]).is_err());
        assert!(Action::decode(&[]).is_err());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let bytes = Action::new(ActionKind::DestroyUnit, Vec2::ZERO)
            .encode()
            .unwrap();
        let garbage = vec![0xFF; bytes.len()];

        assert!(Action::decode(&garbage).is_err());
    }
}
