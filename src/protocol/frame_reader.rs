//! Incremental per-connection byte accumulator sitting between the socket
//! and the packet codec.

use crate::codec::CodePage;
use crate::protocol::packet::{Packet, PacketError, ParseResult};

const SHRINK_CAPACITY_THRESHOLD: usize = 16 * 1024;
const SHRINK_OCCUPANCY_DIVISOR: usize = 4;

/// Owns a growable byte buffer and repeatedly hands complete packets to the
/// caller. Strictly owned by its session; there are never concurrent
/// readers over the same buffer.
pub struct FrameReader {
    buf: Vec<u8>,
    page: CodePage,
    shrink_capacity_threshold: usize,
    shrink_occupancy_divisor: usize,
}

impl FrameReader {
    #[must_use]
    pub fn new(page: CodePage) -> Self {
        Self {
            buf: Vec::new(),
            page,
            shrink_capacity_threshold: SHRINK_CAPACITY_THRESHOLD,
            shrink_occupancy_divisor: SHRINK_OCCUPANCY_DIVISOR,
        }
    }

    /// Overrides the shrink thresholds configured server-wide, in place of
    /// the built-in defaults `new` uses.
    #[must_use]
    pub fn with_shrink_thresholds(mut self, capacity_threshold: usize, occupancy_divisor: usize) -> Self {
        self.shrink_capacity_threshold = capacity_threshold;
        self.shrink_occupancy_divisor = occupancy_divisor;
        self
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Attempts to parse one packet out of the buffered bytes.
    ///
    /// - `Ok(Some(packet))`: a full packet was parsed and consumed.
    /// - `Ok(None)`: not enough bytes yet; nothing was consumed.
    /// - `Err(e)`: a fatal parse error; the session must close.
    pub fn try_read(&mut self) -> Result<Option<Packet>, PacketError> {
        match Packet::parse(&self.buf, self.page) {
            ParseResult::Complete { packet, consumed } => {
                self.buf.drain(..consumed);
                self.maybe_shrink();
                Ok(Some(packet))
            }
            ParseResult::Partial => Ok(None),
            ParseResult::Error(e) => Err(e),
        }
    }

    fn maybe_shrink(&mut self) {
        if self.buf.capacity() > self.shrink_capacity_threshold
            && self.buf.len() < self.buf.capacity() / self.shrink_occupancy_divisor
        {
            self.buf.shrink_to_fit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::packet::Fields;
    use crate::protocol::packet::PacketCode;

    #[test]
    fn reassembles_a_packet_delivered_in_two_chunks() {
        let packet = Packet::new(PacketCode::Close, Fields::default().value10(5));
        let bytes = packet.encode(CodePage::Windows1251).unwrap();
        let (first, second) = bytes.split_at(bytes.len() / 2);

        let mut reader = FrameReader::new(CodePage::Windows1251);
        reader.append(first);
        assert!(reader.try_read().unwrap().is_none());

        reader.append(second);
        let parsed = reader.try_read().unwrap().unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn splitting_a_stream_at_any_offset_yields_the_same_sequence() {
        let a = Packet::new(PacketCode::Close, Fields::default().value10(1));
        let b = Packet::new(PacketCode::Leave, Fields::default().value10(2).value2(3));
        let mut stream = a.encode(CodePage::Windows1251).unwrap();
        stream.extend(b.encode(CodePage::Windows1251).unwrap());

        for split in 0..=stream.len() {
            let (first, second) = stream.split_at(split);
            let mut reader = FrameReader::new(CodePage::Windows1251);
            reader.append(first);
            reader.append(second);

            let mut got = Vec::new();
            while let Some(p) = reader.try_read().unwrap() {
                got.push(p);
            }
            assert_eq!(got, vec![a.clone(), b.clone()], "split at {split}");
        }
    }

    #[test]
    fn unknown_trailing_byte_is_partial_until_it_completes_an_unknown_code() {
        let mut reader = FrameReader::new(CodePage::Windows1251);
        reader.append(&[1, 2, 3]);
        assert!(reader.try_read().unwrap().is_none());

        // Complete an 8-byte header with an unrecognised code.
        reader.append(&[0, 0, 0, 0, 0]);
        assert!(reader.try_read().is_err());
    }

    #[test]
    fn shrinks_buffer_once_idle_past_threshold() {
        let mut reader = FrameReader::new(CodePage::Windows1251);
        reader.append(&vec![0u8; 20 * 1024]);
        // Not a valid packet stream; this just forces growth for the shrink check.
        let _ = reader.try_read();
        reader.buf.clear();
        reader.maybe_shrink();
        assert_eq!(reader.buf.capacity(), 0);
    }
}
