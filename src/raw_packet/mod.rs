
use std::fmt;

use bytes::{Buf, BufMut, Bytes};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::Error;
use crate::header::*;
use crate::packet::*;

type Result<T> = std::result::Result<T, util::Error>;

/// RawPacket represents an unparsed RTCP packet. It's returned by Unmarshal when
/// a packet with an unknown type or feedback format is encountered.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct RawPacket(pub Bytes);

impl fmt::Display for RawPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawPacket: {:?}", self.0)
    }
}

impl RtcpPacket for RawPacket {
    /// header returns the Header associated with this packet.
    fn header(&self) -> Header {
        let mut raw = self.0.clone();
        Header::unmarshal(&mut raw).unwrap_or_default()
    }

    /// destination_ssrc returns an array of SSRC values that this packet refers to.
    fn destination_ssrc(&self) -> Vec<u32> {
        vec![]
    }

    fn raw_size(&self) -> usize {
        self.0.len()
    }
}

impl MarshalSize for RawPacket {
    fn marshal_size(&self) -> usize {
        self.raw_size()
    }
}

impl Marshal for RawPacket {
    /// marshal_to encodes the packet in binary.
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < self.0.len() {
            return Err(Error::BufferTooShort.into());
        }
        buf.put_slice(&self.0);
        Ok(self.0.len())
    }
}

impl Unmarshal for RawPacket {
    /// unmarshal keeps the remaining bytes as they are, after checking
    /// that they start with a valid header.
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let raw_packet_len = raw_packet.remaining();
        if raw_packet_len < HEADER_LENGTH {
            return Err(Error::PacketTooShort.into());
        }

        let raw = raw_packet.copy_to_bytes(raw_packet_len);
        Header::unmarshal(&mut raw.clone())?;

        Ok(RawPacket(raw))
    }
}
