use thiserror::Error;

/// Magic byte opening every stored snapshot.
pub const MAGIC_BYTE: u8 = 0xD6;

/// Size of the envelope header in bytes.
pub const ENVELOPE_HEADER_SIZE: usize = 2;

/// A versioned wrapper around serialized snapshot bytes.
///
/// Binary format (2 bytes overhead):
/// ```text
/// [MAGIC: 0xD6][VERSION: u8][PAYLOAD: N bytes]
/// ```
///
/// # Example
///
/// ```
/// use collab_store::Envelope;
///
/// let envelope = Envelope::new(3, b"payload".to_vec());
/// let decoded = Envelope::from_bytes(&envelope.to_bytes()).unwrap();
///
/// assert_eq!(decoded.version, 3);
/// assert_eq!(decoded.payload, b"payload");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Schema version of the payload.
    pub version: u8,
    /// Serialized snapshot.
    pub payload: Vec<u8>,
}

/// Error parsing an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Fewer bytes than the header needs.
    #[error("data too short for snapshot envelope")]
    TooShort,
    /// First byte is not [`MAGIC_BYTE`].
    #[error("invalid magic byte: 0x{0:02X}, expected 0xD6")]
    InvalidMagic(u8),
}

impl Envelope {
    /// Wrap `payload` written with schema `version`.
    pub fn new(version: u8, payload: Vec<u8>) -> Self {
        Self { version, payload }
    }

    /// Encode header and payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ENVELOPE_HEADER_SIZE + self.payload.len());
        bytes.push(MAGIC_BYTE);
        bytes.push(self.version);
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Decode an envelope produced by [`Envelope::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        match bytes {
            [MAGIC_BYTE, version, payload @ ..] => Ok(Self {
                version: *version,
                payload: payload.to_vec(),
            }),
            [other, _, ..] => Err(EnvelopeError::InvalidMagic(*other)),
            _ => Err(EnvelopeError::TooShort),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let bytes = Envelope::new(7, vec![1, 2, 3]).to_bytes();
        assert_eq!(bytes, vec![MAGIC_BYTE, 7, 1, 2, 3]);
    }

    #[test]
    fn empty_payload_is_valid() {
        let decoded = Envelope::from_bytes(&[MAGIC_BYTE, 1]).unwrap();
        assert_eq!(decoded, Envelope::new(1, Vec::new()));
    }

    #[test]
    fn rejects_short_and_foreign_data() {
        assert_eq!(Envelope::from_bytes(&[]), Err(EnvelopeError::TooShort));
        assert_eq!(
            Envelope::from_bytes(&[MAGIC_BYTE]),
            Err(EnvelopeError::TooShort)
        );
        assert_eq!(
            Envelope::from_bytes(&[0xCF, 1, 0]),
            Err(EnvelopeError::InvalidMagic(0xCF))
        );
    }
}
