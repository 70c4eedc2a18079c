//! Binary container for documents.
//!
//! ```text
//! magic    5 bytes  "PFDOC"
//! version  1 byte   FORMAT_VERSION
//! encoding 1 byte   0 = CBOR, 1 = zstd-compressed CBOR
//! payload  rest     DocumentData
//! ```

use crate::model::DocumentData;
use std::io::{Read, Write};

pub const MAGIC: &[u8; 5] = b"PFDOC";
pub const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 2;

/// Errors from reading, decoding or validating a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is empty")]
    Empty,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a document: bad magic header")]
    BadMagic,
    #[error("unsupported format version {0}, expected {FORMAT_VERSION}")]
    UnsupportedVersion(u8),
    #[error("unknown payload encoding {0}")]
    UnknownEncoding(u8),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("invalid path data in shape \"{shape}\": {reason}")]
    PathData { shape: String, reason: String },
    #[error("document has no artboards")]
    NoArtboards,
    #[error("invalid document: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    Cbor,
    #[default]
    CborZstd,
}

impl Encoding {
    fn tag(self) -> u8 {
        match self {
            Encoding::Cbor => 0,
            Encoding::CborZstd => 1,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, DocumentError> {
        match tag {
            0 => Ok(Encoding::Cbor),
            1 => Ok(Encoding::CborZstd),
            other => Err(DocumentError::UnknownEncoding(other)),
        }
    }
}

pub fn encode(data: &DocumentData, encoding: Encoding) -> Result<Vec<u8>, DocumentError> {
    let cbor = cbor_serialize(data)?;
    let payload = match encoding {
        Encoding::Cbor => cbor,
        Encoding::CborZstd => zstd_compress(&cbor)?,
    };
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(MAGIC);
    out.push(FORMAT_VERSION);
    out.push(encoding.tag());
    out.extend_from_slice(&payload);
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<DocumentData, DocumentError> {
    if bytes.is_empty() {
        return Err(DocumentError::Empty);
    }
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(DocumentError::BadMagic);
    }
    let version = bytes[MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(DocumentError::UnsupportedVersion(version));
    }
    let payload = &bytes[HEADER_LEN..];
    match Encoding::from_tag(bytes[MAGIC.len() + 1])? {
        Encoding::Cbor => cbor_deserialize(payload),
        Encoding::CborZstd => cbor_deserialize(&zstd_decompress(payload)?),
    }
}

fn cbor_serialize(value: &DocumentData) -> Result<Vec<u8>, DocumentError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| DocumentError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize(data: &[u8]) -> Result<DocumentData, DocumentError> {
    ciborium::from_reader(data).map_err(|e| DocumentError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, DocumentError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, DocumentError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_document;

    #[test]
    fn compressed_and_raw_payloads_decode() {
        let data = sample_document();
        for encoding in [Encoding::Cbor, Encoding::CborZstd] {
            let bytes = encode(&data, encoding).unwrap();
            assert_eq!(&bytes[..5], MAGIC);
            assert_eq!(bytes[6], encoding.tag());
            assert_eq!(decode(&bytes).unwrap(), data);
        }
    }

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(decode(&[]), Err(DocumentError::Empty)));
    }

    #[test]
    fn bad_header_rejected() {
        assert!(matches!(decode(b"PNG\x89...."), Err(DocumentError::BadMagic)));
        assert!(matches!(decode(b"PFDO"), Err(DocumentError::BadMagic)));

        let mut bytes = encode(&sample_document(), Encoding::Cbor).unwrap();
        bytes[5] = 9;
        assert!(matches!(decode(&bytes), Err(DocumentError::UnsupportedVersion(9))));

        bytes[5] = FORMAT_VERSION;
        bytes[6] = 7;
        assert!(matches!(decode(&bytes), Err(DocumentError::UnknownEncoding(7))));
    }

    #[test]
    fn truncated_payload_rejected() {
        let bytes = encode(&sample_document(), Encoding::Cbor).unwrap();
        let cut = &bytes[..bytes.len() / 2];
        assert!(matches!(decode(cut), Err(DocumentError::CborDecode(_))));
    }
}
