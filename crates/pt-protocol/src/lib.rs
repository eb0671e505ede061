pub mod error;
pub mod frame;
pub mod obfuscate;
pub mod opcodes;
pub mod phtml;
pub mod records;
pub mod rtp;

pub use error::ProtocolError;
pub use frame::{BodyReader, BodyWriter, Frame, HEADER_LEN};
pub use obfuscate::{encode as obfuscate_encode, Variant as ObfuscateVariant};
pub use opcodes::{opcode_name, PROTOCOL_VERSION};
pub use records::{encode_records, parse_records, Record};
pub use rtp::RtpPacket;
