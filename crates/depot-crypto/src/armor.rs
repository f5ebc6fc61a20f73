//! OpenPGP ASCII armor (RFC 4880 §6).
//!
//! ```text
//! -----BEGIN PGP PUBLIC KEY BLOCK-----
//! Comment: optional headers
//!
//! <base64 lines>
//! =XXXX            optional CRC-24 of the decoded data
//! -----END PGP PUBLIC KEY BLOCK-----
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{KeyError, KeyResult};

pub const PUBLIC_KEY_BLOCK: &str = "PGP PUBLIC KEY BLOCK";

const BEGIN: &str = "-----BEGIN ";
const END: &str = "-----END ";
const DASHES: &str = "-----";

const CRC24_INIT: u32 = 0x00B7_04CE;
const CRC24_POLY: u32 = 0x0186_4CFB;

#[cfg(test)]
const LINE_WIDTH: usize = 64;

/// A decoded armored block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Armored {
    /// The label between `BEGIN` and the trailing dashes.
    pub block_type: String,
    pub headers: Vec<(String, String)>,
    pub data: Vec<u8>,
}

enum State {
    Headers,
    Body,
}

/// Decode the first armored block in `text`.
///
/// Text before the `BEGIN` line is ignored. The `END` label must match the
/// `BEGIN` label, and a checksum line, when present, must match the data.
pub fn decode(text: &str) -> KeyResult<Armored> {
    let mut lines = text.lines().map(str::trim);

    let block_type = lines
        .by_ref()
        .find_map(|line| line.strip_prefix(BEGIN)?.strip_suffix(DASHES))
        .ok_or_else(|| KeyError::Armor("missing BEGIN line".into()))?
        .to_string();

    let mut state = State::Headers;
    let mut headers = Vec::new();
    let mut body = String::new();
    let mut checksum = None;
    let mut terminated = false;

    for line in lines {
        if let State::Headers = state {
            if line.is_empty() {
                state = State::Body;
                continue;
            }
            if let Some((key, value)) = line.split_once(": ") {
                headers.push((key.to_string(), value.to_string()));
                continue;
            }
            // No blank separator: the body starts here.
            state = State::Body;
        }

        if let Some(rest) = line.strip_prefix(END) {
            let end_type = rest
                .strip_suffix(DASHES)
                .ok_or_else(|| KeyError::Armor("malformed END line".into()))?;
            if end_type != block_type {
                return Err(KeyError::Armor(format!(
                    "END label {end_type:?} does not match BEGIN label {block_type:?}"
                )));
            }
            terminated = true;
            break;
        }

        match line.strip_prefix('=') {
            Some(crc) if crc.len() == 4 => checksum = Some(crc.to_string()),
            _ => body.push_str(line),
        }
    }

    if !terminated {
        return Err(KeyError::Armor("missing END line".into()));
    }

    let data = STANDARD.decode(body.as_bytes())?;
    if data.is_empty() {
        return Err(KeyError::EmptyBody);
    }

    if let Some(crc) = checksum {
        let raw = STANDARD.decode(crc.as_bytes())?;
        let expected = match raw.as_slice() {
            [a, b, c] => u32::from_be_bytes([0, *a, *b, *c]),
            _ => return Err(KeyError::Armor("checksum must be three bytes".into())),
        };
        let actual = crc24(&data);
        if expected != actual {
            return Err(KeyError::ChecksumMismatch { expected, actual });
        }
    }

    Ok(Armored {
        block_type,
        headers,
        data,
    })
}

/// Armor `data` as a block of type `block_type`, with a checksum line.
#[cfg(test)]
pub(crate) fn encode(block_type: &str, data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let crc = crc24(data).to_be_bytes();

    let mut out = format!("{BEGIN}{block_type}{DASHES}\n\n");
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        // base64 output is ASCII
        let (line, tail) = rest.split_at(rest.len().min(LINE_WIDTH));
        out.push_str(line);
        out.push('\n');
        rest = tail;
    }
    out.push('=');
    out.push_str(&STANDARD.encode(&crc[1..]));
    out.push('\n');
    out.push_str(&format!("{END}{block_type}{DASHES}\n"));
    out
}

/// CRC-24 as defined for armor checksums.
pub fn crc24(data: &[u8]) -> u32 {
    let mut crc = CRC24_INIT;
    for &byte in data {
        crc ^= u32::from(byte) << 16;
        for _ in 0..8 {
            crc <<= 1;
            if crc & 0x0100_0000 != 0 {
                crc ^= CRC24_POLY;
            }
        }
    }
    crc & 0x00FF_FFFF
}
