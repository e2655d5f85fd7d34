use super::ReaderError;

// Upper bound for a single string argument
pub const MAX_STRING_SIZE: usize = 1024 * 1024;

pub struct Reader<'a> {
    bytes: &'a [u8],
    total: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, total: 0 }
    }

    pub fn read_bytes_ref(&mut self, n: usize) -> Result<&'a [u8], ReaderError> {
        if n > self.size() {
            return Err(ReaderError::InvalidSize);
        }

        let bytes = &self.bytes[self.total..self.total + n];
        self.total += n;
        Ok(bytes)
    }

    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], ReaderError> {
        let bytes = self.read_bytes_ref(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReaderError> {
        let [byte] = self.read_bytes::<1>()?;
        Ok(byte)
    }

    pub fn read_u32(&mut self) -> Result<u32, ReaderError> {
        Ok(u32::from_le_bytes(self.read_bytes()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ReaderError> {
        Ok(u64::from_le_bytes(self.read_bytes()?))
    }

    pub fn read_string_with_size(&mut self, size: usize) -> Result<String, ReaderError> {
        if size > MAX_STRING_SIZE {
            return Err(ReaderError::ExceedsMaxBytesSize(size));
        }

        let bytes = self.read_bytes_ref(size)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| ReaderError::InvalidUtf8)
    }

    pub fn read_string(&mut self) -> Result<String, ReaderError> {
        let size = self.read_u32()? as usize;
        self.read_string_with_size(size)
    }

    // Remaining bytes to read
    pub fn size(&self) -> usize {
        self.bytes.len() - self.total
    }

    pub fn total_read(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_past_end() {
        let mut reader = Reader::new(&[1, 2, 3]);
        assert_eq!(reader.read_u64(), Err(ReaderError::InvalidSize));
        // failed read does not consume
        assert_eq!(reader.size(), 3);
        assert_eq!(reader.read_u8(), Ok(1));
        assert_eq!(reader.total_read(), 1);
    }

    #[test]
    fn test_string_length_larger_than_buffer() {
        let mut reader = Reader::new(&[10, 0, 0, 0, b'a']);
        assert_eq!(reader.read_string(), Err(ReaderError::InvalidSize));
    }

    #[test]
    fn test_string_invalid_utf8() {
        let mut reader = Reader::new(&[2, 0, 0, 0, 0xff, 0xfe]);
        assert_eq!(reader.read_string(), Err(ReaderError::InvalidUtf8));
    }

    #[test]
    fn test_string_too_large() {
        let size = (MAX_STRING_SIZE as u32 + 1).to_le_bytes();
        let mut reader = Reader::new(&size);
        assert_eq!(
            reader.read_string(),
            Err(ReaderError::ExceedsMaxBytesSize(MAX_STRING_SIZE + 1))
        );
    }
}
