#![warn(rust_2018_idioms)]

pub mod application_defined;
pub mod error;
pub mod header;
pub mod packet;
pub mod raw_packet;
pub mod transport_feedbacks;
mod util;

pub use error::Error;
pub use packet::{marshal, unmarshal, Packet, RtcpPacket};
