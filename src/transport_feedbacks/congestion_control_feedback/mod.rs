
use std::fmt;

use bytes::{Buf, BufMut};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::Error;
use crate::header::*;
use crate::packet::*;
use crate::util::*;

type Result<T> = std::result::Result<T, util::Error>;

///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P| FMT=11  |   PT = 205    |          length               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 SSRC of RTCP packet sender                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                   SSRC of 1st RTP Stream                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          begin_seq            |          num_reports          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |R|ECN|  Arrival time offset    | ...                           .
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// .                                                               .
/// .                                                               .
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                   SSRC of nth RTP Stream                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          begin_seq            |          num_reports          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |R|ECN|  Arrival time offset    | ...                           |
/// .                                                               .
/// .                                                               .
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 Report Timestamp (32 bits)                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
const REPORT_TIMESTAMP_LENGTH: usize = 4;
const REPORT_BLOCK_OFFSET: usize = HEADER_LENGTH + SSRC_LENGTH;

const REPORTS_OFFSET: usize = 8;
const METRIC_BLOCK_LENGTH: usize = 2;

/// Upper bound on metric blocks in a single report block.
pub const MAX_METRIC_BLOCKS: usize = 16384;

const RECEIVED_BITS: u16 = 1;
const RECEIVED_INDEX: u16 = 0;
const ECN_BITS: u16 = 2;
const ECN_INDEX: u16 = 1;
const ARRIVAL_TIME_OFFSET_BITS: u16 = 13;
const ARRIVAL_TIME_OFFSET_INDEX: u16 = 3;

/// Ecn is the two-bit Explicit Congestion Notification codepoint
/// https://www.rfc-editor.org/rfc/rfc3168#section-5
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
#[repr(u8)]
pub enum Ecn {
    /// Non ECN-Capable Transport, Non-ECT
    #[default]
    NonEct = 0b00,
    /// ECN Capable Transport, ECT(1)
    Ect1 = 0b01,
    /// ECN Capable Transport, ECT(0)
    Ect0 = 0b10,
    /// Congestion Experienced, CE
    Ce = 0b11,
}

impl From<u8> for Ecn {
    fn from(val: u8) -> Self {
        match val & 0b11 {
            0b00 => Ecn::NonEct,
            0b01 => Ecn::Ect1,
            0b10 => Ecn::Ect0,
            _ => Ecn::Ce,
        }
    }
}

impl fmt::Display for Ecn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Ecn::NonEct => "Non-ECT",
            Ecn::Ect1 => "ECT(1)",
            Ecn::Ect0 => "ECT(0)",
            Ecn::Ce => "CE",
        };
        write!(f, "{s}")
    }
}

/// CcFeedbackMetricBlock reports on a single RTP sequence number
#[derive(Debug, PartialEq, Eq, Default, Clone, Copy)]
pub struct CcFeedbackMetricBlock {
    pub received: bool,
    pub ecn: Ecn,
    /// Offset in 1/1024 seconds before the report timestamp
    pub arrival_time_offset: u16,
}

impl MarshalSize for CcFeedbackMetricBlock {
    fn marshal_size(&self) -> usize {
        METRIC_BLOCK_LENGTH
    }
}

impl Marshal for CcFeedbackMetricBlock {
    /// marshal_to encodes the metric block in binary. ECN and arrival time
    /// offset are only written for received packets.
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < METRIC_BLOCK_LENGTH {
            return Err(Error::BufferTooShort.into());
        }

        let mut dst =
            set_nbits_of_uint16(0, RECEIVED_BITS, RECEIVED_INDEX, self.received as u16)?;
        if self.received {
            dst = set_nbits_of_uint16(dst, ECN_BITS, ECN_INDEX, self.ecn as u16)?;
            dst = set_nbits_of_uint16(
                dst,
                ARRIVAL_TIME_OFFSET_BITS,
                ARRIVAL_TIME_OFFSET_INDEX,
                self.arrival_time_offset,
            )?;
        }

        buf.put_u16(dst);

        Ok(METRIC_BLOCK_LENGTH)
    }
}

impl Unmarshal for CcFeedbackMetricBlock {
    /// unmarshal decodes the metric block from exactly 2 bytes
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() != METRIC_BLOCK_LENGTH {
            return Err(Error::MetricBlockLength.into());
        }

        let word = raw_packet.get_u16();
        let received = get_nbits_of_uint16(word, RECEIVED_BITS, RECEIVED_INDEX)? == 1;
        if !received {
            // the remaining bits carry no meaning for lost packets
            return Ok(CcFeedbackMetricBlock::default());
        }

        let ecn = Ecn::from(get_nbits_of_uint16(word, ECN_BITS, ECN_INDEX)? as u8);
        let arrival_time_offset =
            get_nbits_of_uint16(word, ARRIVAL_TIME_OFFSET_BITS, ARRIVAL_TIME_OFFSET_INDEX)?;

        Ok(CcFeedbackMetricBlock {
            received,
            ecn,
            arrival_time_offset,
        })
    }
}

/// CcFeedbackReportBlock reports on a range of sequence numbers of one RTP stream
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct CcFeedbackReportBlock {
    /// SSRC of the RTP stream on which this block is reporting
    pub media_ssrc: u32,
    /// First sequence number covered by this block
    pub begin_sequence: u16,
    pub metric_blocks: Vec<CcFeedbackMetricBlock>,
}

impl fmt::Display for CcFeedbackReportBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = format!("\tMedia Ssrc {:x}\n", self.media_ssrc);
        out += format!("\tBegin Sequence {}\n", self.begin_sequence).as_str();
        out += "\tSeq\tReceived\tECN\tArrival Offset\n";
        for (i, block) in self.metric_blocks.iter().enumerate() {
            out += format!(
                "\t{}\t{}\t{}\t{}\n",
                self.begin_sequence.wrapping_add(i as u16),
                block.received,
                block.ecn,
                block.arrival_time_offset
            )
            .as_str();
        }
        write!(f, "{out}")
    }
}

impl MarshalSize for CcFeedbackReportBlock {
    fn marshal_size(&self) -> usize {
        // an odd number of metric blocks is padded to a 32-bit boundary
        let n = self.metric_blocks.len() + self.metric_blocks.len() % 2;
        REPORTS_OFFSET + n * METRIC_BLOCK_LENGTH
    }
}

impl Marshal for CcFeedbackReportBlock {
    /// marshal_to encodes the report block in binary
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if self.metric_blocks.len() > MAX_METRIC_BLOCKS {
            return Err(Error::TooManyReports.into());
        }
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort.into());
        }

        buf.put_u32(self.media_ssrc);
        buf.put_u16(self.begin_sequence);
        buf.put_u16(self.metric_blocks.len() as u16);

        for block in &self.metric_blocks {
            let n = block.marshal_to(buf)?;
            buf = &mut buf[n..];
        }

        if self.metric_blocks.len() % 2 != 0 {
            buf.put_u16(0);
        }

        Ok(self.marshal_size())
    }
}

impl Unmarshal for CcFeedbackReportBlock {
    /// unmarshal decodes one report block, consuming its padding slot if any
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < REPORTS_OFFSET {
            return Err(Error::ReportBlockTooShort.into());
        }

        let media_ssrc = raw_packet.get_u32();
        let begin_sequence = raw_packet.get_u16();
        let num_reports = raw_packet.get_u16() as usize;

        if num_reports > MAX_METRIC_BLOCKS {
            return Err(Error::TooManyReports.into());
        }
        if raw_packet.remaining() < num_reports * METRIC_BLOCK_LENGTH {
            return Err(Error::IncorrectNumReports.into());
        }

        let mut raw_metrics = raw_packet.copy_to_bytes(num_reports * METRIC_BLOCK_LENGTH);
        let mut metric_blocks = Vec::with_capacity(num_reports);
        for _ in 0..num_reports {
            let mut raw_metric = raw_metrics.split_to(METRIC_BLOCK_LENGTH);
            metric_blocks.push(CcFeedbackMetricBlock::unmarshal(&mut raw_metric)?);
        }

        if num_reports % 2 != 0 {
            if raw_packet.remaining() < METRIC_BLOCK_LENGTH {
                return Err(Error::IncorrectNumReports.into());
            }
            raw_packet.advance(METRIC_BLOCK_LENGTH);
        }

        Ok(CcFeedbackReportBlock {
            media_ssrc,
            begin_sequence,
            metric_blocks,
        })
    }
}

/// CcFeedbackReport is a Congestion Control Feedback Report
///
/// ## Specifications
///
/// * [RFC 8888 §3.1]
///
/// [RFC 8888 §3.1]: https://www.rfc-editor.org/rfc/rfc8888.html#section-3.1
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct CcFeedbackReport {
    /// SSRC of sender
    pub sender_ssrc: u32,
    pub report_blocks: Vec<CcFeedbackReportBlock>,
    /// Middle 32 bits of the NTP time at which the report was sent
    pub report_timestamp: u32,
}

impl fmt::Display for CcFeedbackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = format!("CcFeedbackReport from {:x}\n", self.sender_ssrc);
        out += format!("\tReport Timestamp {}\n", self.report_timestamp).as_str();
        for block in &self.report_blocks {
            out += block.to_string().as_str();
        }
        write!(f, "{out}")
    }
}

impl RtcpPacket for CcFeedbackReport {
    /// header returns the Header associated with this packet.
    fn header(&self) -> Header {
        Header {
            padding: false,
            count: FORMAT_CCFB,
            packet_type: PacketType::TransportSpecificFeedback,
            length: Header::length_for(self.marshal_size()),
        }
    }

    /// destination_ssrc returns an array of SSRC values that this packet refers to.
    fn destination_ssrc(&self) -> Vec<u32> {
        self.report_blocks.iter().map(|b| b.media_ssrc).collect()
    }

    fn raw_size(&self) -> usize {
        let blocks: usize = self.report_blocks.iter().map(|b| b.marshal_size()).sum();
        REPORT_BLOCK_OFFSET + blocks + REPORT_TIMESTAMP_LENGTH
    }
}

impl MarshalSize for CcFeedbackReport {
    fn marshal_size(&self) -> usize {
        // report blocks are word aligned, so no padding is ever needed
        self.raw_size()
    }
}

impl Marshal for CcFeedbackReport {
    /// marshal_to encodes the packet in binary.
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        let size = self.marshal_size();
        if size / 4 - 1 > u16::MAX as usize {
            return Err(Error::PacketTooLarge.into());
        }
        if buf.remaining_mut() < size {
            return Err(Error::BufferTooShort.into());
        }

        let h = self.header();
        let n = h.marshal_to(buf)?;
        buf = &mut buf[n..];

        buf.put_u32(self.sender_ssrc);

        for block in &self.report_blocks {
            let n = block.marshal_to(buf)?;
            buf = &mut buf[n..];
        }

        buf.put_u32(self.report_timestamp);

        Ok(size)
    }
}

impl Unmarshal for CcFeedbackReport {
    /// unmarshal decodes the CcFeedbackReport from binary. The whole buffer is
    /// taken as the packet: the timestamp is its last 4 bytes and report blocks
    /// fill everything between the sender SSRC and the timestamp.
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let raw_packet_len = raw_packet.remaining();
        if raw_packet_len < REPORT_BLOCK_OFFSET + REPORT_TIMESTAMP_LENGTH {
            return Err(Error::PacketTooShort.into());
        }

        let h = Header::unmarshal(raw_packet)?;
        if h.packet_type != PacketType::TransportSpecificFeedback || h.count != FORMAT_CCFB {
            return Err(Error::WrongType.into());
        }
        h.check_length(raw_packet_len)?;

        let sender_ssrc = raw_packet.get_u32();

        let mut raw_blocks =
            raw_packet.copy_to_bytes(raw_packet.remaining() - REPORT_TIMESTAMP_LENGTH);
        let mut report_blocks = vec![];
        while raw_blocks.has_remaining() {
            report_blocks.push(CcFeedbackReportBlock::unmarshal(&mut raw_blocks)?);
        }

        let report_timestamp = raw_packet.get_u32();

        Ok(CcFeedbackReport {
            sender_ssrc,
            report_blocks,
            report_timestamp,
        })
    }
}
