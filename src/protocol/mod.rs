//! The framed binary wire protocol: packet codes and flags, the 50-byte
//! session-info sub-record, and the incremental frame reader.

pub mod frame_reader;
pub mod nation;
pub mod packet;
pub mod session_info;

pub use frame_reader::FrameReader;
pub use nation::Nation;
pub use packet::{Fields, Packet, PacketCode, PacketError, ParseResult};
pub use session_info::{SessionAccess, SessionInfo, SessionType};
