//! # Anchor Instruction Payload
//!
//! The data carried by the single instruction sent to the anchor program:
//!
//! ```text
//! [opcode: 1 byte = 1][reserved: 32 zero bytes][digest: 32 bytes][cid: UTF-8]
//! ```
//!
//! The length is always `65 + len(cid)`. The CID is not length-prefixed;
//! it runs to the end of the data.

use baseroot_core::{ContentDigest, ContentId, Pubkey, DIGEST_LEN};
use serde::{Deserialize, Serialize};

use crate::error::PayloadError;

/// Opcode of the anchor instruction.
pub const ANCHOR_OPCODE: u8 = 1;

/// Width of the reserved field. Always zero.
pub const RESERVED_LEN: usize = 32;

/// Bytes before the CID.
pub const HEADER_LEN: usize = 1 + RESERVED_LEN + DIGEST_LEN;

/// What gets anchored for one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRecord {
    pub digest: ContentDigest,
    pub cid: ContentId,
    pub owner: Pubkey,
}

impl AnchorRecord {
    pub fn new(digest: ContentDigest, cid: ContentId, owner: Pubkey) -> Self {
        Self { digest, cid, owner }
    }

    /// Instruction data for this record.
    pub fn payload(&self) -> Vec<u8> {
        encode_payload(&self.digest, &self.cid)
    }
}

/// Build instruction data for `(digest, cid)`.
pub fn encode_payload(digest: &ContentDigest, cid: &ContentId) -> Vec<u8> {
    let mut data = Vec::with_capacity(HEADER_LEN + cid.as_bytes().len());
    data.push(ANCHOR_OPCODE);
    data.extend_from_slice(&[0u8; RESERVED_LEN]);
    data.extend_from_slice(digest.as_bytes());
    data.extend_from_slice(cid.as_bytes());
    data
}

/// Parsed instruction data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    pub digest: ContentDigest,
    pub cid: ContentId,
}

/// Parse instruction data produced by [`encode_payload`].
pub fn decode_payload(data: &[u8]) -> Result<DecodedPayload, PayloadError> {
    if data.len() <= HEADER_LEN {
        return Err(PayloadError::TooShort {
            len: data.len(),
            min: HEADER_LEN + 1,
        });
    }
    if data[0] != ANCHOR_OPCODE {
        return Err(PayloadError::WrongOpcode(data[0]));
    }
    if data[1..1 + RESERVED_LEN].iter().any(|b| *b != 0) {
        return Err(PayloadError::NonZeroReserved);
    }

    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&data[1 + RESERVED_LEN..HEADER_LEN]);

    let cid = std::str::from_utf8(&data[HEADER_LEN..])
        .map_err(|e| PayloadError::InvalidCid(e.to_string()))?;
    let cid = ContentId::new(cid).map_err(|e| PayloadError::InvalidCid(e.to_string()))?;

    Ok(DecodedPayload {
        digest: ContentDigest::from_bytes(digest),
        cid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use baseroot_core::sha256_digest;

    const CID: &str = "QmNRCQWfgze6AbBCaT1rkrkV5tJ2aP4oTNPb5JZcXYywve";

    #[test]
    fn layout_matches_wire_format() {
        let digest = sha256_digest(b"Hello, Pinata!");
        let cid = ContentId::new(CID).unwrap();
        let data = encode_payload(&digest, &cid);

        assert_eq!(data.len(), 65 + CID.len());
        assert_eq!(data[0], 1);
        assert!(data[1..33].iter().all(|b| *b == 0));
        assert_eq!(&data[33..65], digest.as_bytes());
        assert_eq!(&data[65..], CID.as_bytes());
    }

    #[test]
    fn decode_recovers_digest_and_cid() {
        let digest = sha256_digest(b"abc");
        let cid = ContentId::new(CID).unwrap();
        let decoded = decode_payload(&encode_payload(&digest, &cid)).unwrap();
        assert_eq!(decoded.digest, digest);
        assert_eq!(decoded.cid, cid);
    }

    #[test]
    fn decode_rejects_wrong_opcode() {
        let mut data = encode_payload(&sha256_digest(b""), &ContentId::new("Qm1").unwrap());
        data[0] = 2;
        assert_eq!(decode_payload(&data), Err(PayloadError::WrongOpcode(2)));
    }

    #[test]
    fn decode_rejects_short_payload() {
        assert!(matches!(
            decode_payload(&[1u8; HEADER_LEN]),
            Err(PayloadError::TooShort { len: 65, .. })
        ));
        assert!(matches!(decode_payload(&[]), Err(PayloadError::TooShort { .. })));
    }

    #[test]
    fn decode_rejects_nonzero_reserved() {
        let mut data = encode_payload(&sha256_digest(b""), &ContentId::new("Qm1").unwrap());
        data[10] = 0xff;
        assert_eq!(decode_payload(&data), Err(PayloadError::NonZeroReserved));
    }

    #[test]
    fn decode_rejects_non_utf8_cid() {
        let mut data = encode_payload(&sha256_digest(b""), &ContentId::new("Qm1").unwrap());
        data.push(0xff);
        assert!(matches!(decode_payload(&data), Err(PayloadError::InvalidCid(_))));
    }

    #[test]
    fn record_payload_ignores_owner() {
        let digest = sha256_digest(b"x");
        let cid = ContentId::new(CID).unwrap();
        let a = AnchorRecord::new(digest, cid.clone(), Pubkey::new([1; 32]));
        let b = AnchorRecord::new(digest, cid, Pubkey::new([2; 32]));
        assert_eq!(a.payload(), b.payload());
    }
}
