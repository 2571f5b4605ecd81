//! Wire protocol: framing primitives, the inbound frame reader and the command encoder.
//!
//! Every frame on the wire has the same shape:
//!
//! ```text
//! header(4) | type(1) | length(1 or 2) | payload | checksum(1) | footer(4)
//! ```
//!
//! ToF devices use a one-byte length and a verified XOR checksum. Thermal devices
//! use a two-byte big-endian length and leave the checksum unchecked. Outbound
//! commands always use the one-byte form.

mod checksum;
mod encoder;
mod reader;
mod sync;

pub use checksum::xor_checksum;
pub use encoder::{Command, CommandSink, encode_frame};
pub use reader::{FrameFault, FrameReader};
pub use sync::HeaderWindow;
