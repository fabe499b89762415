//! Flag-directed packet codec: a `code`/`flags` header followed by optional
//! fields in a fixed serialisation order, regardless of bit index order.

use crate::codec::{CodePage, Reader, Writer};
use crate::protocol::session_info::{SessionInfo, SessionInfoError};

/// Maximum encoded length of the `data` field, including its trailing NUL.
pub const MAX_DATA_LENGTH: usize = 0x200;
/// Fixed wire width of the `name` field.
pub const MAX_NAME_LENGTH: usize = 20;

const FLAG_VALUE0: u32 = 1 << 0;
const FLAG_VALUE1: u32 = 1 << 1;
const FLAG_VALUE2: u32 = 1 << 2;
const FLAG_VALUE3: u32 = 1 << 3;
const FLAG_VALUE4: u32 = 1 << 4;
const FLAG_DATA_LENGTH: u32 = 1 << 5;
const FLAG_DATA: u32 = 1 << 6;
const FLAG_ERROR: u32 = 1 << 7;
const FLAG_NAME: u32 = 1 << 8;
const FLAG_SESSION_INFO: u32 = 1 << 9;
const FLAG_VALUE10: u32 = 1 << 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PacketCode {
    ListRooms = 200,
    ListItem = 350,
    ListEnd = 351,
    ListUsers = 400,
    ListGames = 500,
    Login = 600,
    LoginReply = 601,
    CreateRoom = 700,
    CreateRoomReply = 701,
    Join = 800,
    JoinReply = 801,
    Leave = 900,
    LeaveReply = 901,
    DisconnectUser = 1000,
    Close = 1100,
    CloseReply = 1101,
    CreateGame = 1200,
    CreateGameReply = 1201,
    ChatRoom = 1300,
    ChatRoomReply = 1301,
    ConnectGame = 1326,
    ConnectGameReply = 1327,
}

impl PacketCode {
    fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            200 => Self::ListRooms,
            350 => Self::ListItem,
            351 => Self::ListEnd,
            400 => Self::ListUsers,
            500 => Self::ListGames,
            600 => Self::Login,
            601 => Self::LoginReply,
            700 => Self::CreateRoom,
            701 => Self::CreateRoomReply,
            800 => Self::Join,
            801 => Self::JoinReply,
            900 => Self::Leave,
            901 => Self::LeaveReply,
            1000 => Self::DisconnectUser,
            1100 => Self::Close,
            1101 => Self::CloseReply,
            1200 => Self::CreateGame,
            1201 => Self::CreateGameReply,
            1300 => Self::ChatRoom,
            1301 => Self::ChatRoomReply,
            1326 => Self::ConnectGame,
            1327 => Self::ConnectGameReply,
            _ => return None,
        })
    }
}

/// The optional fields a packet may carry. `data_length` is tracked
/// separately from `data` so a packet may in principle carry one without
/// the other, matching the source's field layout; in practice every
/// constructor in this crate sets them together through [`Fields::data`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub value0: Option<u32>,
    pub value1: Option<u32>,
    pub value2: Option<u32>,
    pub value3: Option<u32>,
    pub value4: Option<u32>,
    pub value10: Option<u32>,
    pub data_length: Option<u32>,
    pub data: Option<String>,
    pub error: Option<u32>,
    pub name: Option<String>,
    pub session_info: Option<SessionInfo>,
}

impl Fields {
    #[must_use]
    pub fn value0(mut self, v: u32) -> Self {
        self.value0 = Some(v);
        self
    }
    #[must_use]
    pub fn value1(mut self, v: u32) -> Self {
        self.value1 = Some(v);
        self
    }
    #[must_use]
    pub fn value2(mut self, v: u32) -> Self {
        self.value2 = Some(v);
        self
    }
    #[must_use]
    pub fn value3(mut self, v: u32) -> Self {
        self.value3 = Some(v);
        self
    }
    #[must_use]
    pub fn value4(mut self, v: u32) -> Self {
        self.value4 = Some(v);
        self
    }
    #[must_use]
    pub fn value10(mut self, v: u32) -> Self {
        self.value10 = Some(v);
        self
    }
    #[must_use]
    pub fn error(mut self, v: u32) -> Self {
        self.error = Some(v);
        self
    }
    #[must_use]
    pub fn name(mut self, v: impl Into<String>) -> Self {
        self.name = Some(v.into());
        self
    }
    #[must_use]
    pub fn data(mut self, v: impl Into<String>) -> Self {
        self.data = Some(v.into());
        self
    }
    #[must_use]
    pub fn session_info(mut self, v: SessionInfo) -> Self {
        self.session_info = Some(v);
        self
    }

    fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.value0.is_some() {
            flags |= FLAG_VALUE0;
        }
        if self.value1.is_some() {
            flags |= FLAG_VALUE1;
        }
        if self.value2.is_some() {
            flags |= FLAG_VALUE2;
        }
        if self.value3.is_some() {
            flags |= FLAG_VALUE3;
        }
        if self.value4.is_some() {
            flags |= FLAG_VALUE4;
        }
        if self.value10.is_some() {
            flags |= FLAG_VALUE10;
        }
        if self.data_length.is_some() || self.data.is_some() {
            flags |= FLAG_DATA_LENGTH;
        }
        if self.data.is_some() {
            flags |= FLAG_DATA;
        }
        if self.error.is_some() {
            flags |= FLAG_ERROR;
        }
        if self.name.is_some() {
            flags |= FLAG_NAME;
        }
        if self.session_info.is_some() {
            flags |= FLAG_SESSION_INFO;
        }
        flags
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub code: PacketCode,
    pub fields: Fields,
}

impl Packet {
    #[must_use]
    pub fn new(code: PacketCode, fields: Fields) -> Self {
        Self { code, fields }
    }

    #[must_use]
    pub fn list_end() -> Self {
        Self::new(PacketCode::ListEnd, Fields::default())
    }

    pub fn encode(&self, page: CodePage) -> Result<Vec<u8>, PacketError> {
        let flags = self.fields.flags();
        let mut w = Writer::with_capacity(64);
        w.write_u32_le(self.code as u32);
        w.write_u32_le(flags);

        if let Some(v) = self.fields.value0 {
            w.write_u32_le(v);
        }
        if let Some(v) = self.fields.value1 {
            w.write_u32_le(v);
        }
        if let Some(v) = self.fields.value2 {
            w.write_u32_le(v);
        }
        if let Some(v) = self.fields.value3 {
            w.write_u32_le(v);
        }
        if let Some(v) = self.fields.value4 {
            w.write_u32_le(v);
        }
        if let Some(v) = self.fields.value10 {
            w.write_u32_le(v);
        }

        if flags & FLAG_DATA_LENGTH != 0 {
            let encoded = self.fields.data.as_deref().map(|s| page.encode(s));
            let data_length = match &encoded {
                Some(bytes) => bytes.len() + 1,
                None => self.fields.data_length.unwrap_or(0) as usize,
            };
            if data_length > MAX_DATA_LENGTH {
                return Err(PacketError::OversizedField);
            }
            w.write_u32_le(data_length as u32);
            if let Some(bytes) = encoded {
                w.write_bytes(&bytes);
                w.write_u8(0);
            }
        }

        if let Some(v) = self.fields.error {
            w.write_u32_le(v);
        }

        if let Some(name) = &self.fields.name {
            let encoded = page.encode(name);
            if encoded.len() > MAX_NAME_LENGTH {
                return Err(PacketError::OversizedField);
            }
            w.write_fixed_bytes(&encoded, MAX_NAME_LENGTH);
        }

        if let Some(info) = &self.fields.session_info {
            info.write_to(&mut w);
        }

        Ok(w.into_bytes())
    }

    /// Parses one packet from the front of `buf`. Never consumes bytes on
    /// `Partial` or `Error`; the caller (the frame reader) decides.
    pub fn parse(buf: &[u8], page: CodePage) -> ParseResult {
        let mut r = Reader::new(buf);
        match Self::try_parse(&mut r, page) {
            Ok(Some(packet)) => ParseResult::Complete {
                packet,
                consumed: r.position(),
            },
            Ok(None) => ParseResult::Partial,
            Err(e) => ParseResult::Error(e),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn try_parse(r: &mut Reader<'_>, page: CodePage) -> Result<Option<Self>, PacketError> {
        macro_rules! need {
            ($e:expr) => {
                match $e {
                    Ok(v) => v,
                    Err(_) => return Ok(None),
                }
            };
        }

        let code_raw = need!(r.read_u32_le());
        let code = PacketCode::from_u32(code_raw).ok_or(PacketError::UnknownCode(code_raw))?;
        let flags = need!(r.read_u32_le());

        let mut fields = Fields::default();
        if flags & FLAG_VALUE0 != 0 {
            fields.value0 = Some(need!(r.read_u32_le()));
        }
        if flags & FLAG_VALUE1 != 0 {
            fields.value1 = Some(need!(r.read_u32_le()));
        }
        if flags & FLAG_VALUE2 != 0 {
            fields.value2 = Some(need!(r.read_u32_le()));
        }
        if flags & FLAG_VALUE3 != 0 {
            fields.value3 = Some(need!(r.read_u32_le()));
        }
        if flags & FLAG_VALUE4 != 0 {
            fields.value4 = Some(need!(r.read_u32_le()));
        }
        if flags & FLAG_VALUE10 != 0 {
            fields.value10 = Some(need!(r.read_u32_le()));
        }

        if flags & FLAG_DATA_LENGTH != 0 {
            let data_length = need!(r.read_u32_le());
            if data_length as usize > MAX_DATA_LENGTH {
                return Err(PacketError::OversizedField);
            }
            fields.data_length = Some(data_length);

            if flags & FLAG_DATA != 0 {
                let span = need!(r.read_bytes(data_length as usize));
                if data_length == 0 || span[span.len() - 1] != 0 {
                    return Err(PacketError::Malformed);
                }
                fields.data = Some(page.decode(&span[..span.len() - 1]));
            }
        }

        if flags & FLAG_ERROR != 0 {
            fields.error = Some(need!(r.read_u32_le()));
        }

        if flags & FLAG_NAME != 0 {
            fields.name = Some(need!(r.read_fixed_string(MAX_NAME_LENGTH, |b| page.decode(b))));
        }

        if flags & FLAG_SESSION_INFO != 0 {
            let info = match SessionInfo::read_from(r) {
                Ok(info) => info,
                Err(SessionInfoError::ShortRead) => return Ok(None),
                Err(_) => return Err(PacketError::InvalidSessionInfo),
            };
            fields.session_info = Some(info);
        }

        Ok(Some(Self { code, fields }))
    }
}

#[derive(Debug)]
pub enum ParseResult {
    Complete { packet: Packet, consumed: usize },
    Partial,
    Error(PacketError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("unrecognised packet code {0}")]
    UnknownCode(u32),
    #[error("field exceeds its maximum wire length")]
    OversizedField,
    #[error("session-info failed validation")]
    InvalidSessionInfo,
    #[error("malformed field contents")]
    Malformed,
}
