//! Legacy 8-bit code page transcoding.
//!
//! The original client population is overwhelmingly Cyrillic Windows-1251;
//! a Windows-1252 table ships alongside it for deployments that need it.
//! Unmappable code points on encode map to `?` (`0x3F`), matching the
//! source's lossy behaviour.

use encoding_rs::{Encoding, WINDOWS_1251, WINDOWS_1252};

/// Selects which legacy code page this server transcodes wire text through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodePage {
    #[default]
    Windows1251,
    Windows1252,
}

impl CodePage {
    fn encoding(self) -> &'static Encoding {
        match self {
            Self::Windows1251 => WINDOWS_1251,
            Self::Windows1252 => WINDOWS_1252,
        }
    }

    /// Decodes legacy code-page bytes to UTF-8. Never fails: unmappable
    /// bytes are replaced per `encoding_rs`'s standard replacement policy.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        let (text, _, _) = self.encoding().decode(bytes);
        text.into_owned()
    }

    /// Encodes UTF-8 text to legacy code-page bytes. Code points with no
    /// representation in the table are replaced with `?` (`0x3F`).
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = self.encoding().encode(text);
        if !had_errors {
            return bytes.into_owned();
        }
        // encoding_rs's encoder already substitutes HTML numeric character
        // references on unmappable input; the wire protocol wants a bare `?`.
        let mut out = Vec::with_capacity(text.len());
        for ch in text.chars() {
            let mut buf = [0u8; 4];
            let s = ch.encode_utf8(&mut buf);
            let (enc, _, errored) = self.encoding().encode(s);
            if errored {
                out.push(b'?');
            } else {
                out.extend_from_slice(&enc);
            }
        }
        out
    }
}
