
use std::fmt;

use bytes::{Buf, BufMut, Bytes};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::Error;
use crate::header::*;
use crate::packet::*;
use crate::util::*;

type Result<T> = std::result::Result<T, util::Error>;

pub const APP_NAME_LENGTH: usize = 4;
const APP_FIXED_LENGTH: usize = HEADER_LENGTH + SSRC_LENGTH + APP_NAME_LENGTH;
/// Largest payload that still fits a single packet, before padding.
pub const APP_MAX_DATA_LENGTH: usize = 0xFFFF - APP_FIXED_LENGTH;

/// ApplicationDefined is an APP packet, intended for experimental use
/// by applications without a registered packet type.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P| subtype |   PT=APP=204  |             length            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           SSRC/CSRC                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                          name (ASCII)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                   application-dependent data                ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///
/// ## Specifications
///
/// * [RFC 3550 §6.7]
///
/// [RFC 3550 §6.7]: https://tools.ietf.org/html/rfc3550#section-6.7
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct ApplicationDefined {
    /// Application-specific subtype, carried in the header count field
    pub sub_type: u8,
    /// SSRC of the sender, which is also the source this packet concerns
    pub ssrc: u32,
    /// Four ASCII characters naming the application
    pub name: [u8; APP_NAME_LENGTH],
    /// Opaque application data, without padding
    pub data: Bytes,
}

impl fmt::Display for ApplicationDefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = format!("ApplicationDefined from {:x}\n", self.ssrc);
        out += format!("\tSubType {}\n", self.sub_type).as_str();
        out += format!("\tName {}\n", String::from_utf8_lossy(&self.name)).as_str();
        out += format!("\tData {:?}\n", self.data).as_str();
        write!(f, "{out}")
    }
}

impl ApplicationDefined {
    /// new builds an APP packet from a textual name, which must be exactly 4 bytes.
    pub fn new(
        sub_type: u8,
        ssrc: u32,
        name: &str,
        data: Bytes,
    ) -> std::result::Result<Self, Error> {
        let name: [u8; APP_NAME_LENGTH] = name
            .as_bytes()
            .try_into()
            .map_err(|_| Error::InvalidName)?;

        Ok(ApplicationDefined {
            sub_type,
            ssrc,
            name,
            data,
        })
    }

    /// name_str returns the name as text, if it is valid UTF-8.
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.name).ok()
    }
}

impl RtcpPacket for ApplicationDefined {
    /// header returns the Header associated with this packet.
    fn header(&self) -> Header {
        Header {
            padding: get_padding_size(self.raw_size()) != 0,
            count: self.sub_type,
            packet_type: PacketType::ApplicationDefined,
            length: Header::length_for(self.marshal_size()),
        }
    }

    /// destination_ssrc returns an array of SSRC values that this packet refers to.
    fn destination_ssrc(&self) -> Vec<u32> {
        vec![self.ssrc]
    }

    fn raw_size(&self) -> usize {
        APP_FIXED_LENGTH + self.data.len()
    }
}

impl MarshalSize for ApplicationDefined {
    fn marshal_size(&self) -> usize {
        let l = self.raw_size();
        // align to 32-bit boundary
        l + get_padding_size(l)
    }
}

impl Marshal for ApplicationDefined {
    /// marshal_to encodes the packet in binary.
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if self.sub_type as usize > COUNT_MAX {
            return Err(Error::InvalidHeader.into());
        }
        if self.data.len() > APP_MAX_DATA_LENGTH {
            return Err(Error::DataTooLarge.into());
        }
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort.into());
        }

        let h = self.header();
        let n = h.marshal_to(buf)?;
        buf = &mut buf[n..];

        buf.put_u32(self.ssrc);
        buf.put_slice(&self.name);
        buf.put_slice(&self.data);

        if h.padding {
            put_padding(buf, self.raw_size());
        }

        Ok(self.marshal_size())
    }
}

impl Unmarshal for ApplicationDefined {
    /// unmarshal decodes the ApplicationDefined from binary. The buffer must
    /// hold exactly one packet, as sized by the header length field.
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let raw_packet_len = raw_packet.remaining();

        let h = Header::unmarshal(raw_packet)?;
        if raw_packet_len < APP_FIXED_LENGTH {
            return Err(Error::PacketTooShort.into());
        }
        if h.packet_type != PacketType::ApplicationDefined {
            return Err(Error::WrongType.into());
        }
        h.check_length(raw_packet_len)?;

        let ssrc = raw_packet.get_u32();
        let mut name = [0u8; APP_NAME_LENGTH];
        raw_packet.copy_to_slice(&mut name);

        let mut data = raw_packet.copy_to_bytes(raw_packet.remaining());
        if h.padding {
            // the last octet counts the padding octets, itself included
            let padding_size = data.last().copied().unwrap_or(0) as usize;
            if padding_size == 0 || padding_size > data.len() {
                return Err(Error::WrongPadding.into());
            }
            data.truncate(data.len() - padding_size);
        }

        Ok(ApplicationDefined {
            sub_type: h.count,
            ssrc,
            name,
            data,
        })
    }
}
