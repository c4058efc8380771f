use bytes::BufMut;

use crate::error::{Error, Result};

/// returns the padding required to make the length a multiple of 4
pub(crate) fn get_padding_size(len: usize) -> usize {
    if len % 4 == 0 {
        0
    } else {
        4 - (len % 4)
    }
}

/// writes the padding for `len` bytes of content; every padding octet
/// carries the padding count, so the last one does as well.
pub(crate) fn put_padding(mut buf: &mut [u8], len: usize) {
    let padding_size = get_padding_size(len);
    for _ in 0..padding_size {
        buf.put_u8(padding_size as u8);
    }
}

/// set_nbits_of_uint16 writes `val` into the `size` bits starting `start_index`
/// bits from the most significant end of `src`. Other bits are left untouched.
pub(crate) fn set_nbits_of_uint16(src: u16, size: u16, start_index: u16, val: u16) -> Result<u16> {
    if size == 0 || size > 16 || start_index > 16 - size {
        return Err(Error::InvalidSizeOrStartIndex);
    }

    let mask = (u32::MAX >> (32 - size)) as u16;
    if val > mask {
        return Err(Error::BitFieldOverflow);
    }

    let shift = 16 - size - start_index;
    Ok((src & !(mask << shift)) | (val << shift))
}

/// get_nbits_of_uint16 reads the `size` bits starting `start_index` bits
/// from the most significant end of `src`.
pub(crate) fn get_nbits_of_uint16(src: u16, size: u16, start_index: u16) -> Result<u16> {
    if size == 0 || size > 16 || start_index > 16 - size {
        return Err(Error::InvalidSizeOrStartIndex);
    }

    let mask = (u32::MAX >> (32 - size)) as u16;
    Ok((src >> (16 - size - start_index)) & mask)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_padding() {
        let tests = vec![(0, 0), (1, 3), (2, 2), (3, 1), (4, 0), (100, 0), (500, 0)];

        for (n, p) in tests {
            assert_eq!(
                get_padding_size(n),
                p,
                "Test case returned wrong value for input {n}"
            );
        }
    }

    #[test]
    fn test_put_padding() {
        let mut buf = [0u8; 3];
        put_padding(&mut buf[..], 5);
        assert_eq!(buf, [3, 3, 3]);

        let mut buf = [0xAAu8; 2];
        put_padding(&mut buf[..], 8);
        assert_eq!(buf, [0xAA, 0xAA], "aligned length must not write padding");
    }

    #[test]
    fn test_set_nbits_of_uint16() {
        let tests = vec![
            ("setOneBit", 0, 1, 8, 1, None, 128),
            ("setStatusVectorBit", 0, 1, 0, 1, None, 32768),
            ("setStatusVectorSecondBit", 32768, 1, 1, 1, None, 49152),
            ("setArrivalOffset", 0, 13, 3, 0x1FFF, None, 0x1FFF),
            ("setEcn", 0x8000, 2, 1, 3, None, 0xE000),
            ("overwriteSpan", 0xFFFF, 2, 1, 0, None, 0x9FFF),
            (
                "setStatusVectorInvalidBit",
                0,
                2,
                15,
                0,
                Some(Error::InvalidSizeOrStartIndex),
                0,
            ),
            ("zeroWidth", 0, 0, 0, 0, Some(Error::InvalidSizeOrStartIndex), 0),
            ("valueTooWide", 0, 2, 1, 4, Some(Error::BitFieldOverflow), 0),
            ("offsetTooWide", 0, 13, 3, 0x2000, Some(Error::BitFieldOverflow), 0),
        ];

        for (name, source, size, index, value, err, result) in tests {
            let res = set_nbits_of_uint16(source, size, index, value);
            if let Some(err) = err {
                assert_eq!(res, Err(err), "setNBitsOfUint16 {name} : should be error");
            } else {
                assert_eq!(res, Ok(result), "setNBitsOfUint16 {name}");
            }
        }
    }

    #[test]
    fn test_get_nbits_of_uint16() {
        assert_eq!(get_nbits_of_uint16(0xE000, 1, 0), Ok(1));
        assert_eq!(get_nbits_of_uint16(0xE000, 2, 1), Ok(3));
        assert_eq!(get_nbits_of_uint16(0xBFFF, 13, 3), Ok(0x1FFF));
        assert_eq!(
            get_nbits_of_uint16(0, 4, 13),
            Err(Error::InvalidSizeOrStartIndex)
        );

        for value in [0u16, 1, 1234, 0x1FFF] {
            let word = set_nbits_of_uint16(0, 13, 3, value).unwrap();
            assert_eq!(get_nbits_of_uint16(word, 13, 3), Ok(value));
        }
    }
}
