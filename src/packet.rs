use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::application_defined::*;
use crate::error::Error;
use crate::header::*;
use crate::raw_packet::*;
use crate::transport_feedbacks::congestion_control_feedback::*;

type Result<T> = std::result::Result<T, util::Error>;

/// RtcpPacket is the contract shared by every RTCP packet, a protocol used for
/// out-of-band statistics and control information for an RTP session
pub trait RtcpPacket: Marshal + Unmarshal + fmt::Display + fmt::Debug {
    fn header(&self) -> Header;
    fn destination_ssrc(&self) -> Vec<u32>;
    fn raw_size(&self) -> usize;
}

/// Packet is any RTCP packet this crate knows how to carry. Packet types and
/// feedback formats without a dedicated codec are kept as Raw.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Packet {
    ApplicationDefined(ApplicationDefined),
    CongestionControlFeedback(CcFeedbackReport),
    Raw(RawPacket),
}

impl From<ApplicationDefined> for Packet {
    fn from(p: ApplicationDefined) -> Self {
        Packet::ApplicationDefined(p)
    }
}

impl From<CcFeedbackReport> for Packet {
    fn from(p: CcFeedbackReport) -> Self {
        Packet::CongestionControlFeedback(p)
    }
}

impl From<RawPacket> for Packet {
    fn from(p: RawPacket) -> Self {
        Packet::Raw(p)
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packet::ApplicationDefined(p) => fmt::Display::fmt(p, f),
            Packet::CongestionControlFeedback(p) => fmt::Display::fmt(p, f),
            Packet::Raw(p) => fmt::Display::fmt(p, f),
        }
    }
}

impl RtcpPacket for Packet {
    fn header(&self) -> Header {
        match self {
            Packet::ApplicationDefined(p) => p.header(),
            Packet::CongestionControlFeedback(p) => p.header(),
            Packet::Raw(p) => p.header(),
        }
    }

    fn destination_ssrc(&self) -> Vec<u32> {
        match self {
            Packet::ApplicationDefined(p) => p.destination_ssrc(),
            Packet::CongestionControlFeedback(p) => p.destination_ssrc(),
            Packet::Raw(p) => p.destination_ssrc(),
        }
    }

    fn raw_size(&self) -> usize {
        match self {
            Packet::ApplicationDefined(p) => p.raw_size(),
            Packet::CongestionControlFeedback(p) => p.raw_size(),
            Packet::Raw(p) => p.raw_size(),
        }
    }
}

impl MarshalSize for Packet {
    fn marshal_size(&self) -> usize {
        match self {
            Packet::ApplicationDefined(p) => p.marshal_size(),
            Packet::CongestionControlFeedback(p) => p.marshal_size(),
            Packet::Raw(p) => p.marshal_size(),
        }
    }
}

impl Marshal for Packet {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Packet::ApplicationDefined(p) => p.marshal_to(buf),
            Packet::CongestionControlFeedback(p) => p.marshal_to(buf),
            Packet::Raw(p) => p.marshal_to(buf),
        }
    }
}

impl Unmarshal for Packet {
    /// unmarshal pulls the first RTCP packet from a bytestream and returns
    /// its parsed representation, leaving any following packets in place.
    fn unmarshal<B>(raw_data: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let h = Header::unmarshal(raw_data)?;

        let length = (h.length as usize) * 4;
        if length > raw_data.remaining() {
            return Err(Error::PacketTooShort.into());
        }

        let mut in_packet = h.marshal()?.chain(raw_data.take(length));

        let p = match h.packet_type {
            PacketType::ApplicationDefined => {
                Packet::ApplicationDefined(ApplicationDefined::unmarshal(&mut in_packet)?)
            }
            PacketType::TransportSpecificFeedback if h.count == FORMAT_CCFB => {
                Packet::CongestionControlFeedback(CcFeedbackReport::unmarshal(&mut in_packet)?)
            }
            _ => {
                log::trace!(
                    "keeping {} packet with count/format {} as raw",
                    h.packet_type,
                    h.count
                );
                Packet::Raw(RawPacket::unmarshal(&mut in_packet)?)
            }
        };

        Ok(p)
    }
}

/// marshal takes an array of Packets and serializes them to a single buffer
pub fn marshal(packets: &[Packet]) -> Result<Bytes> {
    let mut out = BytesMut::new();
    for p in packets {
        let data = p.marshal()?;
        out.put(data);
    }
    Ok(out.freeze())
}

/// unmarshal takes an entire udp datagram (which may consist of multiple RTCP packets) and
/// returns the unmarshaled packets it contains. Any malformed packet fails the whole datagram.
pub fn unmarshal<B>(raw_data: &mut B) -> Result<Vec<Packet>>
where
    B: Buf,
{
    let mut packets = vec![];

    while raw_data.has_remaining() {
        let p = Packet::unmarshal(raw_data).map_err(|err| {
            log::debug!("failed to unmarshal rtcp packet #{}: {}", packets.len(), err);
            err
        })?;
        packets.push(p);
    }

    if packets.is_empty() {
        return Err(Error::InvalidHeader.into());
    }

    Ok(packets)
}
