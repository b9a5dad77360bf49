//! Base64 data blocks used by `format="binary"` and base64 `AppendedData`.
//!
//! An uncompressed block is a byte-count header (`UInt32` or `UInt64`,
//! file byte order) followed by the payload. Writers disagree on whether the
//! header and payload are base64-encoded as one stream or as two separately
//! padded streams; both layouts are accepted. A separately encoded header
//! always ends in `=` padding and decodes to exactly the header width,
//! because neither header width is a multiple of 3.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// Width of the byte-count header in front of every block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeaderType {
    #[default]
    UInt32,
    UInt64,
}

impl HeaderType {
    pub fn from_vtk_name(name: &str) -> Option<Self> {
        match name {
            "UInt32" => Some(HeaderType::UInt32),
            "UInt64" => Some(HeaderType::UInt64),
            _ => None,
        }
    }

    pub fn vtk_name(self) -> &'static str {
        match self {
            HeaderType::UInt32 => "UInt32",
            HeaderType::UInt64 => "UInt64",
        }
    }

    pub fn size(self) -> usize {
        match self {
            HeaderType::UInt32 => 4,
            HeaderType::UInt64 => 8,
        }
    }

    fn encode(self, len: usize) -> Vec<u8> {
        match self {
            HeaderType::UInt32 => (len as u32).to_ne_bytes().to_vec(),
            HeaderType::UInt64 => (len as u64).to_ne_bytes().to_vec(),
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<usize, String> {
        let value = match self {
            HeaderType::UInt32 => bytes
                .get(..4)
                .and_then(|b| b.try_into().ok())
                .map(|b| u32::from_ne_bytes(b) as u64),
            HeaderType::UInt64 => bytes
                .get(..8)
                .and_then(|b| b.try_into().ok())
                .map(u64::from_ne_bytes),
        };
        let value = value.ok_or_else(|| "truncated block header".to_string())?;
        usize::try_from(value).map_err(|_| format!("block length {value} does not fit in memory"))
    }
}

/// Number of base64 characters needed for `bytes` bytes, padding included.
fn encoded_len(bytes: usize) -> Option<usize> {
    bytes.div_ceil(3).checked_mul(4)
}

fn decode(chars: &str) -> Result<Vec<u8>, String> {
    BASE64
        .decode(chars)
        .map_err(|e| format!("invalid base64 data: {e}"))
}

/// Encode `payload` as one block, header and payload in a single stream.
pub fn encode_block(payload: &[u8], header: HeaderType) -> String {
    let mut raw = header.encode(payload.len());
    raw.extend_from_slice(payload);
    BASE64.encode(raw)
}

/// Decode the block that starts at character `offset` of `stream`.
///
/// `stream` must not contain whitespace between blocks; callers strip it.
pub fn decode_block(stream: &str, offset: usize, header: HeaderType) -> Result<Vec<u8>, String> {
    let stream = stream
        .get(offset..)
        .ok_or_else(|| format!("block offset {offset} is past the end of the data"))?;
    let header_chars = encoded_len(header.size()).unwrap_or(usize::MAX);
    let head = stream
        .get(..header_chars)
        .ok_or_else(|| "truncated block header".to_string())?;
    let head_bytes = decode(head)?;
    let count = header.decode(&head_bytes)?;
    // Base64 never has fewer characters than the bytes it encodes.
    let too_long = || format!("block length {count} exceeds the {} characters of data", stream.len());
    if count > stream.len() {
        return Err(too_long());
    }

    let (start, chars, skip) = if head.ends_with('=') && head_bytes.len() == header.size() {
        (header_chars, encoded_len(count), 0)
    } else {
        let total = header.size().checked_add(count).and_then(encoded_len);
        (0, total, header.size())
    };
    let end = chars
        .and_then(|chars| start.checked_add(chars))
        .ok_or_else(too_long)?;
    let encoded = stream
        .get(start..end)
        .ok_or_else(|| format!("block shorter than its {count}-byte header"))?;
    let bytes = decode(encoded)?;
    bytes
        .get(skip..skip + count)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| format!("block shorter than its {count}-byte header"))
}

/// Strip all ASCII whitespace from inline or appended base64 text.
pub fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}
