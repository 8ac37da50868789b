//! Bus transport: byte framing on the wire and the Slave role wrapper.

pub mod framing;
pub mod slave;

pub use framing::{FrameDecoder, encode_frame};
pub use slave::Slave;
