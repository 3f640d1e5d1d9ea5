//! Binary cache for assembled catalogs.
//!
//! Parsing a large manifest on every start-up is avoidable: a [`Catalog`]
//! can be written once and loaded back. The format is a 32-byte fixed header
//! followed by a bincode-encoded payload of class declarations. Loading
//! re-assembles the catalog, so every invariant checked by
//! [`CatalogBuilder::build`](crate::CatalogBuilder::build) holds for cached
//! catalogs too.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"GHCT"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Reserved
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Catalog, CatalogError, ClassDecl};

const MAGIC: &[u8; 4] = b"GHCT";
const FORMAT_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

/// Errors that can occur when serializing a [`Catalog`] to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode catalog: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when loading a [`Catalog`] from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a catalog cache: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, supported is v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedCatalog {
    metadata: CatalogMetadata,
    classes: Vec<ClassDecl>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogMetadata {
    class_count: usize,
    rule_count: usize,
    source_digest: Option<[u8; 32]>,
}

fn count_rules(classes: &[ClassDecl]) -> usize {
    classes
        .iter()
        .map(|c| c.rules.len() + c.members.iter().map(|m| m.rules.len()).sum::<usize>())
        .sum()
}

fn validate(ser: &SerializedCatalog) -> Result<(), DeserializeError> {
    if ser.metadata.class_count != ser.classes.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} classes but payload has {}",
            ser.metadata.class_count,
            ser.classes.len()
        )));
    }
    let rules = count_rules(&ser.classes);
    if ser.metadata.rule_count != rules {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {rules}",
            ser.metadata.rule_count
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    #[allow(clippy::cast_possible_truncation)] // catalogs never approach 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash.as_bytes()[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }
    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

/// Check the header and checksum and decode the payload.
fn read_payload(bytes: &[u8]) -> Result<SerializedCatalog, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;
    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    if blake3::hash(payload).as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedCatalog, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    Ok(serialized)
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    catalog: &Catalog,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let classes = catalog.declarations.clone();
    let serialized = SerializedCatalog {
        metadata: CatalogMetadata {
            class_count: classes.len(),
            rule_count: count_rules(&classes),
            source_digest: source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes()),
        },
        classes,
    };
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Catalog, DeserializeError> {
    let serialized = read_payload(bytes)?;
    validate(&serialized)?;
    Ok(Catalog::assemble(serialized.classes)?)
}

/// Whether a cached catalog was produced from `source_text`.
///
/// Returns `false` for caches written without a source digest.
///
/// # Errors
///
/// Returns [`DeserializeError`] if `bytes` is not a valid catalog cache.
pub fn matches_source(bytes: &[u8], source_text: &str) -> Result<bool, DeserializeError> {
    let serialized = read_payload(bytes)?;
    let digest = blake3::hash(source_text.as_bytes());
    Ok(serialized.metadata.source_digest.as_ref() == Some(digest.as_bytes()))
}
