//! Positional binary codec used for contract call arguments.
//!
//! Every value is written in order with no tags:
//! - integers are little-endian
//! - strings are a `u32` little-endian byte length followed by UTF-8 bytes

mod reader;
mod writer;

pub use reader::*;
pub use writer::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    #[error("Invalid size")]
    InvalidSize,
    #[error("Invalid UTF-8 string")]
    InvalidUtf8,
    #[error("Exceeds max bytes size: {}", _0)]
    ExceedsMaxBytesSize(usize),
}

pub trait Serializer {
    fn write(&self, writer: &mut Writer);

    fn read(reader: &mut Reader) -> Result<Self, ReaderError>
    where
        Self: Sized;

    fn size(&self) -> usize;

    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::with_capacity(self.size());
        self.write(&mut writer);
        writer.into_bytes()
    }

    // Decode the value and require the whole buffer to be consumed
    fn from_bytes(bytes: &[u8]) -> Result<Self, ReaderError>
    where
        Self: Sized,
    {
        let mut reader = Reader::new(bytes);
        let value = Self::read(&mut reader)?;
        if reader.size() != 0 {
            return Err(ReaderError::InvalidSize);
        }
        Ok(value)
    }
}

impl Serializer for u64 {
    fn write(&self, writer: &mut Writer) {
        writer.write_u64(*self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_u64()
    }

    fn size(&self) -> usize {
        8
    }
}

impl Serializer for String {
    fn write(&self, writer: &mut Writer) {
        writer.write_string(self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_string()
    }

    fn size(&self) -> usize {
        4 + self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u64_is_little_endian() {
        assert_eq!(1u64.to_bytes(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(u64::from_bytes(&[0, 1, 0, 0, 0, 0, 0, 0]), Ok(256));
    }

    #[test]
    fn test_string_is_length_prefixed() {
        let bytes = String::from("hi").to_bytes();
        assert_eq!(bytes, vec![2, 0, 0, 0, b'h', b'i']);
        assert_eq!(String::from("hi").size(), bytes.len());
    }

    #[test]
    fn test_from_bytes_rejects_trailing_data() {
        assert_eq!(
            u64::from_bytes(&[0; 9]),
            Err(ReaderError::InvalidSize)
        );
    }
}
