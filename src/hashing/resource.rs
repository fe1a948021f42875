//! Framing of serialized hash resources.
//!
//! ```text
//! magic "PHHF" | version u8 | algorithm tag u8 | payload len u64 | payload | crc32 u32
//! ```
//!
//! All integers are little-endian. The payload is the bincode encoding of the
//! family parameters and is opaque to this module.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{PhalanxError, Result};

const MAGIC: &[u8; 4] = b"PHHF";
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1 + 1 + 8;

/// Wrap a payload in a resource frame.
pub(crate) fn write_resource(tag: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(HEADER_LEN + payload.len() + 4);
    output.extend_from_slice(MAGIC);
    output.write_u8(FORMAT_VERSION)?;
    output.write_u8(tag)?;
    output.write_u64::<LittleEndian>(payload.len() as u64)?;
    output.extend_from_slice(payload);
    output.write_u32::<LittleEndian>(crc32fast::hash(payload))?;
    Ok(output)
}

/// Unwrap a resource frame, returning the algorithm tag and the payload.
pub(crate) fn read_resource(bytes: &[u8]) -> Result<(u8, &[u8])> {
    let mut input = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    input.read_exact(&mut magic).map_err(truncated)?;
    if &magic != MAGIC {
        return Err(PhalanxError::initialization(
            "invalid hash resource: bad magic",
        ));
    }

    let version = input.read_u8().map_err(truncated)?;
    if version != FORMAT_VERSION {
        return Err(PhalanxError::initialization(format!(
            "unsupported hash resource version: {version}"
        )));
    }

    let tag = input.read_u8().map_err(truncated)?;
    let payload_len = input.read_u64::<LittleEndian>().map_err(truncated)?;

    let remaining = bytes.len() - HEADER_LEN;
    if payload_len > remaining.saturating_sub(4) as u64 {
        return Err(PhalanxError::initialization(format!(
            "hash resource truncated: payload of {payload_len} bytes, {remaining} bytes left"
        )));
    }
    let payload_len = payload_len as usize;
    let payload = &bytes[HEADER_LEN..HEADER_LEN + payload_len];

    input.set_position((HEADER_LEN + payload_len) as u64);
    let checksum = input.read_u32::<LittleEndian>().map_err(truncated)?;
    if checksum != crc32fast::hash(payload) {
        return Err(PhalanxError::initialization(
            "hash resource checksum mismatch",
        ));
    }
    if input.position() as usize != bytes.len() {
        return Err(PhalanxError::initialization(
            "trailing bytes after hash resource",
        ));
    }

    Ok((tag, payload))
}

fn truncated(e: std::io::Error) -> PhalanxError {
    PhalanxError::initialization(format!("hash resource truncated: {e}"))
}
