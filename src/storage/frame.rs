//! Entry framing
//!
//! Wraps codec payloads with a magic, a version byte and a CRC32 so that
//! truncated or corrupted files are reported instead of half-decoded.

/// Magic bytes opening every entry file
pub const MAGIC: &[u8; 4] = b"PAPR";

/// Current frame version
pub const VERSION: u8 = 1;

/// Magic (4) + version (1) + crc32 (4)
pub const HEADER_SIZE: usize = 9;

/// Prepend the header to `payload`
pub fn seal(payload: &[u8]) -> Vec<u8> {
    let crc = crc32fast::hash(payload);

    let mut framed = Vec::with_capacity(HEADER_SIZE + payload.len());
    framed.extend_from_slice(MAGIC);
    framed.push(VERSION);
    framed.extend_from_slice(&crc.to_le_bytes());
    framed.extend_from_slice(payload);
    framed
}

/// Validate the header and return the payload it protects
pub fn open(bytes: &[u8]) -> Result<&[u8], String> {
    if bytes.len() < HEADER_SIZE {
        return Err(format!(
            "file too short: {} bytes, header needs {}",
            bytes.len(),
            HEADER_SIZE
        ));
    }

    let (header, payload) = bytes.split_at(HEADER_SIZE);

    if &header[0..4] != MAGIC {
        return Err(format!("invalid magic: {:?}", &header[0..4]));
    }

    if header[4] != VERSION {
        return Err(format!("unsupported entry version: {}", header[4]));
    }

    let stored = u32::from_le_bytes([header[5], header[6], header[7], header[8]]);
    let computed = crc32fast::hash(payload);
    if stored != computed {
        return Err(format!(
            "checksum mismatch: stored {:#010x}, computed {:#010x}",
            stored, computed
        ));
    }

    Ok(payload)
}
