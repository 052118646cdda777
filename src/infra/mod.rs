//! Infrastructure shared by the protocol layers: the byte codec, and
//! `embassy-time` backed implementations of the timing traits.
pub mod codec;
pub mod embassy;
