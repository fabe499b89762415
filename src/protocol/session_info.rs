//! The 50-byte session-info sub-record: a nation/version/type/access
//! quadruple guarded by magic sentinels and zero padding.

use crate::codec::{Reader, ReaderError, Writer};
use crate::protocol::nation::{InvalidNation, Nation};

/// Wire size of a session-info record, in bytes.
pub const WIRE_LEN: usize = 50;

const CRC1: u32 = 0x1717_1717;
const CRC2: u32 = 0x0201_0101;
const ALWAYS_ONE: u8 = 1;
const ALWAYS_ZERO: u8 = 0;
const PADDING_LEN: usize = 35;

/// The game version this server advertises in session-info records it
/// constructs, and rewrites incoming records to on successful validation.
pub const GAME_VERSION: u8 = 49;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionType {
    Room = 1,
    Game = 4,
    User = 5,
}

impl SessionType {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Room),
            4 => Some(Self::Game),
            5 => Some(Self::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionAccess {
    Public = 1,
    Protected = 2,
}

impl SessionAccess {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Public),
            2 => Some(Self::Protected),
            _ => None,
        }
    }
}

/// A validated session-info record.
///
/// Construction always goes through [`SessionInfo::read_from`] (wire input)
/// or [`SessionInfo::new`] (server-constructed); both guarantee the
/// sentinel fields hold, so a live `SessionInfo` is always writable as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    pub nation: Nation,
    pub game_version: u8,
    pub game_release: u8,
    pub session_type: SessionType,
    pub access: SessionAccess,
}

impl SessionInfo {
    /// Builds a server-constructed record, e.g. for a freshly created room
    /// or game whose entry is re-advertised to other clients.
    #[must_use]
    pub fn new(nation: Nation, session_type: SessionType, access: SessionAccess) -> Self {
        Self {
            nation,
            game_version: GAME_VERSION,
            game_release: GAME_VERSION,
            session_type,
            access,
        }
    }

    pub fn read_from(reader: &mut Reader<'_>) -> Result<Self, SessionInfoError> {
        let crc1 = reader.read_u32_le()?;
        let crc2 = reader.read_u32_le()?;
        let nation = reader.read_u8()?;
        let game_version = reader.read_u8()?;
        let game_release = reader.read_u8()?;
        let session_type = reader.read_u8()?;
        let access = reader.read_u8()?;
        let always_one = reader.read_u8()?;
        let always_zero = reader.read_u8()?;
        let padding = reader.read_bytes(PADDING_LEN)?;

        if crc1 != CRC1 || crc2 != CRC2 {
            return Err(SessionInfoError::BadSentinel);
        }
        if always_one != ALWAYS_ONE || always_zero != ALWAYS_ZERO {
            return Err(SessionInfoError::BadSentinel);
        }
        if padding.iter().any(|&b| b != 0) {
            return Err(SessionInfoError::BadSentinel);
        }

        let nation = Nation::new(nation)?;
        let session_type = SessionType::from_u8(session_type).ok_or(SessionInfoError::BadEnum)?;
        let access = SessionAccess::from_u8(access).ok_or(SessionInfoError::BadEnum)?;

        Ok(Self {
            nation,
            game_version,
            // Rewritten on ingress regardless of what the client sent.
            game_release: GAME_VERSION,
            session_type,
            access,
        })
    }

    pub fn write_to(&self, writer: &mut Writer) {
        writer.write_u32_le(CRC1);
        writer.write_u32_le(CRC2);
        writer.write_u8(self.nation.get());
        writer.write_u8(self.game_version);
        writer.write_u8(self.game_release);
        writer.write_u8(self.session_type as u8);
        writer.write_u8(self.access as u8);
        writer.write_u8(ALWAYS_ONE);
        writer.write_u8(ALWAYS_ZERO);
        writer.write_bytes(&[0u8; PADDING_LEN]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionInfoError {
    #[error("short read while parsing session-info")]
    ShortRead,
    #[error("session-info sentinel mismatch")]
    BadSentinel,
    #[error("session-info carries an unrecognised type/access/nation value")]
    BadEnum,
}

impl From<ReaderError> for SessionInfoError {
    fn from(_: ReaderError) -> Self {
        Self::ShortRead
    }
}

impl From<InvalidNation> for SessionInfoError {
    fn from(_: InvalidNation) -> Self {
        Self::BadEnum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionInfo {
        SessionInfo::new(
            Nation::new(1).unwrap(),
            SessionType::User,
            SessionAccess::Public,
        )
    }

    #[test]
    fn round_trips_byte_identical() {
        let info = sample();
        let mut w = Writer::new();
        info.write_to(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), WIRE_LEN);

        let mut r = Reader::new(&bytes);
        let parsed = SessionInfo::read_from(&mut r).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn rejects_altered_crc() {
        let info = sample();
        let mut w = Writer::new();
        info.write_to(&mut w);
        let mut bytes = w.into_bytes();
        bytes[0] ^= 0xFF;

        let mut r = Reader::new(&bytes);
        assert_eq!(
            SessionInfo::read_from(&mut r).unwrap_err(),
            SessionInfoError::BadSentinel
        );
    }

    #[test]
    fn rejects_nonzero_padding() {
        let info = sample();
        let mut w = Writer::new();
        info.write_to(&mut w);
        let mut bytes = w.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] = 1;

        let mut r = Reader::new(&bytes);
        assert_eq!(
            SessionInfo::read_from(&mut r).unwrap_err(),
            SessionInfoError::BadSentinel
        );
    }

    #[test]
    fn rejects_out_of_range_nation() {
        let info = sample();
        let mut w = Writer::new();
        info.write_to(&mut w);
        let mut bytes = w.into_bytes();
        bytes[8] = 200; // nation byte

        let mut r = Reader::new(&bytes);
        assert_eq!(
            SessionInfo::read_from(&mut r).unwrap_err(),
            SessionInfoError::BadEnum
        );
    }
}
