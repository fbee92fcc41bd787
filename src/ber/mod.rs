//! BER encoding and decoding (X.690 subset used by SNMPv1).

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::Decoder;
pub use encode::EncodeBuf;
pub use length::{MAX_LENGTH, decode_length, encode_length, length_encoded_len};
