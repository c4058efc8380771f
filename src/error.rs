use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Packet received is too short.
    #[error("Packet too short to be read")]
    PacketTooShort,
    /// Buffer is too short.
    #[error("Buffer too short to be written")]
    BufferTooShort,
    /// Packet contains an invalid header.
    #[error("Invalid header")]
    InvalidHeader,
    /// Invalid packet version.
    #[error("Invalid packet version")]
    BadVersion,
    /// Wrong packet type.
    #[error("Wrong packet type")]
    WrongType,
    /// Header length field does not match the packet size.
    #[error("Invalid packet length field")]
    InvalidLengthField,
    /// Invalid padding value.
    #[error("Invalid padding value")]
    WrongPadding,
    /// Application-defined name is not 4 octets.
    #[error("Application-defined name must be exactly 4 octets")]
    InvalidName,
    /// Application-defined payload does not fit a single packet.
    #[error("Application-defined data too large")]
    DataTooLarge,
    /// Encoded packet does not fit the 16-bit length field.
    #[error("Packet too large for the length field")]
    PacketTooLarge,
    /// Feedback report block is shorter than its fixed part.
    #[error("Feedback report blocks must be at least 8 bytes")]
    ReportBlockTooShort,
    /// Feedback report block holds fewer metric blocks than declared.
    #[error("Feedback report block contains less reports than num_reports")]
    IncorrectNumReports,
    /// Metric block is not 2 bytes.
    #[error("Feedback report metric blocks must be exactly 2 bytes")]
    MetricBlockLength,
    /// Too many reports.
    #[error("Too many reports")]
    TooManyReports,
    /// Invalid size or start index.
    #[error("Invalid size or startIndex")]
    InvalidSizeOrStartIndex,
    /// Value does not fit its bit field.
    #[error("Value exceeds bit field width")]
    BitFieldOverflow,

    #[error("{0}")]
    Util(#[from] util::Error),
}

impl From<Error> for util::Error {
    fn from(e: Error) -> Self {
        util::Error::from_std(e)
    }
}

impl PartialEq<util::Error> for Error {
    fn eq(&self, other: &util::Error) -> bool {
        if let Some(down) = other.downcast_ref::<Error>() {
            return self == down;
        }
        false
    }
}
