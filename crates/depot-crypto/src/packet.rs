//! OpenPGP packet framing and public-key packet bodies.

use crate::error::{KeyError, KeyResult};

/// Public-Key Packet tag.
pub const TAG_PUBLIC_KEY: u8 = 6;

/// Framing of one packet: where its body starts and how long it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketHeader {
    pub tag: u8,
    pub header_len: usize,
    pub body_len: usize,
}

fn take(data: &[u8], needed: usize) -> KeyResult<&[u8]> {
    data.get(..needed).ok_or(KeyError::Truncated {
        needed,
        available: data.len(),
    })
}

fn be_u16(bytes: &[u8]) -> usize {
    usize::from(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Parse the header of the packet at the start of `data`, checking that the
/// whole body is present.
pub fn parse_header(data: &[u8]) -> KeyResult<PacketHeader> {
    let first = take(data, 1)?[0];
    if first & 0x80 == 0 {
        return Err(KeyError::Packet(format!(
            "invalid packet tag byte {first:#04x}"
        )));
    }

    let header = if first & 0x40 != 0 {
        // New format: tag in the low six bits, variable-length octets follow.
        let tag = first & 0x3f;
        let head = take(data, 2)?;
        match head[1] {
            len @ 0..=191 => PacketHeader {
                tag,
                header_len: 2,
                body_len: usize::from(len),
            },
            192..=223 => {
                let head = take(data, 3)?;
                PacketHeader {
                    tag,
                    header_len: 3,
                    body_len: ((usize::from(head[1]) - 192) << 8) + usize::from(head[2]) + 192,
                }
            }
            255 => {
                let head = take(data, 6)?;
                PacketHeader {
                    tag,
                    header_len: 6,
                    body_len: be_u32(&head[2..6]) as usize,
                }
            }
            _ => return Err(KeyError::PartialLength),
        }
    } else {
        // Old format: tag in bits 5..2, length type in bits 1..0.
        let tag = (first >> 2) & 0x0f;
        match first & 0x03 {
            0 => {
                let head = take(data, 2)?;
                PacketHeader {
                    tag,
                    header_len: 2,
                    body_len: usize::from(head[1]),
                }
            }
            1 => {
                let head = take(data, 3)?;
                PacketHeader {
                    tag,
                    header_len: 3,
                    body_len: be_u16(&head[1..3]),
                }
            }
            2 => {
                let head = take(data, 5)?;
                PacketHeader {
                    tag,
                    header_len: 5,
                    body_len: be_u32(&head[1..5]) as usize,
                }
            }
            // Indeterminate length: the packet runs to the end of the data.
            _ => PacketHeader {
                tag,
                header_len: 1,
                body_len: data.len() - 1,
            },
        }
    };

    take(data, header.header_len + header.body_len)?;
    Ok(header)
}

/// The fields of a public-key packet body the registry reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKeyPacket<'a> {
    pub version: u8,
    /// Creation time, seconds since the Unix epoch.
    pub created: u32,
    pub algorithm: u8,
    /// The full packet body, as hashed for fingerprints.
    pub body: &'a [u8],
    /// v3 only: the RSA modulus, whose low 64 bits are the key ID.
    pub rsa_modulus: Option<&'a [u8]>,
}

/// Parse a public-key packet body.
pub fn parse_public_key(body: &[u8]) -> KeyResult<PublicKeyPacket<'_>> {
    let version = take(body, 1)?[0];
    match version {
        2 | 3 => {
            // version, created(4), validity days(2), algorithm, MPI n, MPI e
            let fixed = take(body, 8)?;
            let algorithm = fixed[7];
            if !matches!(algorithm, 1..=3) {
                return Err(KeyError::Packet(format!(
                    "v{version} key with non-RSA algorithm {algorithm}"
                )));
            }
            let modulus = read_mpi(&body[8..])?;
            Ok(PublicKeyPacket {
                version,
                created: be_u32(&fixed[1..5]),
                algorithm,
                body,
                rsa_modulus: Some(modulus),
            })
        }
        4..=6 => {
            // version, created(4), algorithm, [v5/v6: key material length(4)]
            let fixed = take(body, 6)?;
            if version != 4 {
                let with_len = take(body, 10)?;
                let material = be_u32(&with_len[6..10]) as usize;
                take(&body[10..], material)?;
            }
            Ok(PublicKeyPacket {
                version,
                created: be_u32(&fixed[1..5]),
                algorithm: fixed[5],
                body,
                rsa_modulus: None,
            })
        }
        other => Err(KeyError::UnsupportedVersion(other)),
    }
}

/// Read one multiprecision integer and return its magnitude bytes.
fn read_mpi(data: &[u8]) -> KeyResult<&[u8]> {
    let bits = be_u16(take(data, 2)?);
    let len = bits.div_ceil(8);
    Ok(&take(data, 2 + len)?[2..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn old_format_one_octet_length() {
        let data = [0x98, 0x03, 1, 2, 3];
        let h = parse_header(&data).unwrap();
        assert_eq!(
            h,
            PacketHeader {
                tag: 6,
                header_len: 2,
                body_len: 3
            }
        );
    }

    #[test]
    fn old_format_two_octet_length() {
        let mut data = vec![0x99, 0x01, 0x0D];
        data.extend(std::iter::repeat(0).take(0x10D));
        let h = parse_header(&data).unwrap();
        assert_eq!((h.tag, h.header_len, h.body_len), (6, 3, 269));
    }

    #[test]
    fn old_format_indeterminate_length() {
        let data = [0x9B, 4, 0, 0, 0, 0];
        let h = parse_header(&data).unwrap();
        assert_eq!((h.tag, h.header_len, h.body_len), (6, 1, 5));
    }

    #[test]
    fn new_format_lengths() {
        let data = [0xC6, 0x02, 9, 9];
        assert_eq!(parse_header(&data).unwrap().body_len, 2);

        // 192..=223 first octet: two-octet length
        let mut data = vec![0xC6, 0xC0, 0x08];
        data.extend(std::iter::repeat(0).take(200));
        assert_eq!(parse_header(&data).unwrap().body_len, 200);

        let mut data = vec![0xC6, 0xFF, 0, 0, 0x01, 0x00];
        data.extend(std::iter::repeat(0).take(256));
        let h = parse_header(&data).unwrap();
        assert_eq!((h.header_len, h.body_len), (6, 256));
    }

    #[test]
    fn new_format_partial_length_rejected() {
        let data = [0xC6, 0xE1, 0, 0];
        assert!(matches!(parse_header(&data), Err(KeyError::PartialLength)));
    }

    #[test]
    fn rejects_non_packet_byte() {
        assert!(matches!(parse_header(&[0x06, 0x00]), Err(KeyError::Packet(_))));
    }

    #[test]
    fn truncated_body() {
        let data = [0x98, 0x10, 1, 2];
        assert!(matches!(
            parse_header(&data),
            Err(KeyError::Truncated {
                needed: 18,
                available: 4
            })
        ));
        assert!(matches!(parse_header(&[]), Err(KeyError::Truncated { .. })));
    }

    #[test]
    fn v4_body_fields() {
        let body = [4, 0x5F, 0x00, 0x00, 0x01, 22, 0xAA];
        let key = parse_public_key(&body).unwrap();
        assert_eq!(key.version, 4);
        assert_eq!(key.created, 0x5F00_0001);
        assert_eq!(key.algorithm, 22);
        assert!(key.rsa_modulus.is_none());
    }

    #[test]
    fn v3_reads_rsa_modulus() {
        // 16-bit modulus 0xBEEF, exponent 3
        let body = [3, 0, 0, 0, 1, 0, 0, 1, 0x00, 0x10, 0xBE, 0xEF, 0x00, 0x02, 0x03];
        let key = parse_public_key(&body).unwrap();
        assert_eq!(key.rsa_modulus, Some(&[0xBE, 0xEF][..]));
    }

    #[test]
    fn v3_requires_rsa() {
        let body = [3, 0, 0, 0, 1, 0, 0, 17, 0x00, 0x08, 0x01];
        assert!(matches!(parse_public_key(&body), Err(KeyError::Packet(_))));
    }

    #[test]
    fn v6_checks_material_length() {
        let body = [6, 0, 0, 0, 1, 27, 0, 0, 0, 4, 1, 2];
        assert!(matches!(
            parse_public_key(&body),
            Err(KeyError::Truncated { .. })
        ));
    }

    #[test]
    fn unknown_version() {
        assert!(matches!(
            parse_public_key(&[7, 0, 0, 0, 0, 1]),
            Err(KeyError::UnsupportedVersion(7))
        ));
    }
}
