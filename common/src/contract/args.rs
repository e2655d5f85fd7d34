use crate::serializer::{Reader, ReaderError, Serializer, Writer};

/// Builder for a contract call argument buffer
#[derive(Default)]
pub struct Args {
    writer: Writer,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<T: Serializer>(mut self, value: &T) -> Self {
        value.write(&mut self.writer);
        self
    }

    pub fn add_u64(self, value: u64) -> Self {
        self.add(&value)
    }

    pub fn add_string(mut self, value: &str) -> Self {
        self.writer.write_string(value);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_bytes()
    }
}

/// Positional reader over a contract call argument buffer.
/// Trailing bytes after the expected arguments are ignored.
pub struct ArgsReader<'a> {
    reader: Reader<'a>,
}

impl<'a> ArgsReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(bytes),
        }
    }

    pub fn next_value<T: Serializer>(&mut self) -> Result<T, ReaderError> {
        T::read(&mut self.reader)
    }

    pub fn next_u64(&mut self) -> Result<u64, ReaderError> {
        self.next_value()
    }

    pub fn next_string(&mut self) -> Result<String, ReaderError> {
        self.next_value()
    }

    pub fn remaining(&self) -> usize {
        self.reader.size()
    }
}

/// Arguments of `save_script`
pub fn save_script_args(index: u64, script: &str) -> Vec<u8> {
    Args::new().add_u64(index).add_string(script).into_bytes()
}

/// Arguments of `get_saved_script`
pub fn get_saved_script_args(index: u64) -> Vec<u8> {
    Args::new().add_u64(index).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_script_layout() {
        let bytes = save_script_args(3, "ab");
        assert_eq!(bytes, vec![3, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, b'a', b'b']);

        let mut args = ArgsReader::new(&bytes);
        assert_eq!(args.next_u64(), Ok(3));
        assert_eq!(args.next_string(), Ok("ab".to_owned()));
        assert_eq!(args.remaining(), 0);
    }

    #[test]
    fn test_missing_argument() {
        let bytes = get_saved_script_args(1);
        let mut args = ArgsReader::new(&bytes);
        assert_eq!(args.next_u64(), Ok(1));
        assert_eq!(args.next_string(), Err(ReaderError::InvalidSize));
    }
}
