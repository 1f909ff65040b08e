pub mod stream;

use crate::error::{Error, Result};

/// A source of bytes that can be consumed sequentially.
///
/// Implemented for `&[u8]` (consumes a prefix, for reads that always walk
/// forward through a header) and for [`stream::ByteCursor`] (can also seek
/// to an absolute position, for the jumps the PE format requires: to
/// `e_lfanew`, to the security directory's file offset, to a
/// section-translated RVA).
pub trait Reader: Sized {
    fn read_slice(&mut self, size: usize) -> Result<&[u8]>;

    #[inline(always)]
    fn read<T: ReadData>(&mut self) -> Result<T> {
        T::read(self)
    }
}

impl<'a> Reader for &'a [u8] {
    #[inline(always)]
    fn read_slice(&mut self, size: usize) -> Result<&'a [u8]> {
        if self.len() < size {
            return Err(Error::truncated(size, self.len()));
        }
        let (data, remaining) = self.split_at(size);
        *self = remaining;
        Ok(data)
    }
}

/// A type that can be read off of a [`Reader`], little-endian, regardless of
/// host byte order. No raw pointer casts: every multi-byte scalar goes
/// through `from_le_bytes`.
pub trait ReadData: Sized {
    fn read(reader: &mut impl Reader) -> Result<Self>;
}

impl<const N: usize> ReadData for [u8; N] {
    fn read(reader: &mut impl Reader) -> Result<Self> {
        reader
            .read_slice(N)?
            .try_into()
            .map_err(|_| Error::truncated(N, 0))
    }
}

impl<const N: usize> ReadData for [u16; N] {
    fn read(reader: &mut impl Reader) -> Result<Self> {
        let mut out = [0u16; N];
        for slot in out.iter_mut() {
            *slot = u16::read(reader)?;
        }
        Ok(out)
    }
}

impl ReadData for u8 {
    fn read(reader: &mut impl Reader) -> Result<Self> {
        reader.read_slice(1).map(|b| b[0])
    }
}

macro_rules! impl_read_data {
    ($($t:ty),+) => {
        $(
            impl ReadData for $t {
                #[inline(always)]
                fn read(reader: &mut impl Reader) -> Result<$t> {
                    let bytes: [u8; core::mem::size_of::<$t>()] = reader.read()?;
                    Ok(<$t>::from_le_bytes(bytes))
                }
            }
        )*
    };
}

impl_read_data! {
    u16,
    u32,
    u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_scalars() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut reader = data.as_slice();
        assert_eq!(reader.read::<u16>().unwrap(), 0x1234);
        assert_eq!(reader.read::<u32>().unwrap(), 0x12345678);
        assert!(reader.is_empty());
    }

    #[test]
    fn slice_reader_fails_short() {
        let data = [0u8; 2];
        let mut reader = data.as_slice();
        assert!(reader.read::<u32>().is_err());
    }
}
