use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use super::action::ActionRecord;

pub const MAX_PACKET_SIZE: usize = 1200;
pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x554E_5359;
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_NAME: &str = "Harris";

/// Upper bound on actions carried by one `Actions` packet so that an encoded
/// batch always stays under [`MAX_PACKET_SIZE`].
pub const MAX_ACTIONS_PER_PACKET: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
    pub sequence: u32,
    /// Player id of the sender, 0 until the master has assigned one.
    pub sender: u32,
}

impl PacketHeader {
    pub fn new(sequence: u32, sender: u32) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            sequence,
            sender,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PeerInfo {
    pub player_id: u32,
    pub name: String,
    pub addr: String,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ActionBatch {
    /// Flush counter of the sender; chunks of one flush share it.
    pub batch: u32,
    pub actions: Vec<ActionRecord>,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum PacketType {
    Hello {
        name: String,
    },
    Welcome {
        player_id: u32,
        master_name: String,
        peers: Vec<PeerInfo>,
    },
    Introduce(PeerInfo),
    NotMaster,
    Denied {
        reason: String,
    },
    /// Rescue signal: moves a delayed peer into the active session.
    Start {
        peer_count: u32,
    },
    Actions(ActionBatch),
}

impl PacketType {
    pub fn name(&self) -> &'static str {
        match self {
            PacketType::Hello { .. } => "hello",
            PacketType::Welcome { .. } => "welcome",
            PacketType::Introduce(_) => "introduce",
            PacketType::NotMaster => "not-master",
            PacketType::Denied { .. } => "denied",
            PacketType::Start { .. } => "start",
            PacketType::Actions(_) => "actions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: PacketType,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("bad header (magic {magic:#010x}, version {version})")]
    InvalidHeader { magic: u32, version: u32 },
    #[error("packet of {0} bytes exceeds MTU")]
    Oversize(usize),
    #[error("invalid peer address `{0}`")]
    InvalidAddress(String),
}

impl Packet {
    pub fn new(header: PacketHeader, payload: PacketType) -> Self {
        Self { header, payload }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        let data = rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)?;

        if data.len() > MAX_PACKET_SIZE {
            return Err(PacketError::Oversize(data.len()));
        }
        Ok(data)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        let aligned = aligned_copy(data);
        let packet = rkyv::from_bytes::<Self, rancor::Error>(&aligned)
            .map_err(PacketError::Deserialize)?;

        if !packet.header.is_valid() {
            return Err(PacketError::InvalidHeader {
                magic: packet.header.magic,
                version: packet.header.version,
            });
        }
        Ok(packet)
    }
}

/// rkyv validates alignment, and datagram buffers carry none.
pub(crate) fn aligned_copy(data: &[u8]) -> AlignedVec<16> {
    let mut aligned = AlignedVec::<16>::with_capacity(data.len());
    aligned.extend_from_slice(data);
    aligned
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::net::{Action, ActionKind};

    #[test]
    fn packet_serialization() {
        let header = PacketHeader::new(7, 2);
        let payload = PacketType::Hello {
            name: "Guest".to_string(),
        };
        let packet = Packet::new(header, payload);

        let serialized = packet.serialize().unwrap();
        let deserialized = Packet::deserialize(&serialized).unwrap();

        assert_eq!(packet, deserialized);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut header = PacketHeader::new(0, 1);
        header.magic = 0xDEAD_BEEF;
        let data = Packet::new(header, PacketType::NotMaster)
            .serialize()
            .unwrap();

        assert!(matches!(
            Packet::deserialize(&data),
            Err(PacketError::InvalidHeader { magic: 0xDEAD_BEEF, .. })
        ));
    }

    #[test]
    fn full_batch_fits_mtu() {
        let action = Action::new(ActionKind::CreateUnitRandomSpawn, Vec2::new(799.0, 599.0));
        let batch = ActionBatch {
            batch: u32::MAX,
            actions: vec![action.into(); MAX_ACTIONS_PER_PACKET],
        };
        let packet = Packet::new(PacketHeader::new(u32::MAX, u32::MAX), PacketType::Actions(batch));

        assert!(packet.serialize().is_ok());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Packet::deserialize(b"definitely not a packet").is_err());
        assert!(Packet::deserialize(&[]).is_err());
    }
}
