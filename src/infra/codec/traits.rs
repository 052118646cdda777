//! Public traits exposed by the codec. They decouple fixed-shape wire records
//! from the framing logic and provide a uniform API to upper layers.
use crate::error::{DeserializationError, SerializationError};

//==================================================================================WIRE_RECORD
/// Implemented by every fixed-layout record carried over the serial link.
///
/// Field order and widths are part of the wire contract: changing them is a
/// breaking change that both ends must pick up together.
pub trait WireRecord: Sized {
    /// Exact number of bytes produced by [`WireRecord::encode_into`].
    const ENCODED_LEN: usize;

    /// Deserialize a payload into an instance of the record.
    /// `payload` must be exactly [`WireRecord::ENCODED_LEN`] bytes long.
    fn decode_from(payload: &[u8]) -> Result<Self, DeserializationError>;

    /// Serialize the instance into the provided buffer, returning the
    /// number of bytes written.
    fn encode_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError>;
}
