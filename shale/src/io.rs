//! Little-endian primitives over a byte stream.
use crate::error::{ErrorKind, Result};
use crate::options::DEFAULT_MAX_DEPTH;
use std::io::{Read, Write};

pub struct ByteReader<'a> {
    inner: &'a mut dyn Read,
    position: u64,
    max_depth: usize,
}

macro_rules! read_le {
    ($($name:ident: $ty:ty),*) => {
        $(
            pub fn $name(&mut self) -> Result<$ty> {
                Ok(<$ty>::from_le_bytes(self.array()?))
            }
        )*
    };
}

impl<'a> ByteReader<'a> {
    pub fn new(inner: &'a mut dyn Read) -> Self {
        ByteReader {
            inner,
            position: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Bytes consumed so far by this reader.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Deepest tag nesting accepted by [`read_tag`](Self::read_tag).
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    read_le!(
        read_u8: u8,
        read_i8: i8,
        read_i16: i16,
        read_u16: u16,
        read_i32: i32,
        read_u32: u32,
        read_i64: i64,
        read_u64: u64,
        read_f32: f32,
        read_f64: f64
    );

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(ErrorKind::InvalidBool(byte).into()),
        }
    }

    /// One UTF-8 encoded scalar value.
    pub fn read_char(&mut self) -> Result<char> {
        let lead = self.read_u8()?;
        let len = match lead {
            0x00..=0x7F => 1,
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Err(ErrorKind::InvalidChar(lead).into()),
        };
        let mut buf = [lead, 0, 0, 0];
        self.fill(&mut buf[1..len])?;
        std::str::from_utf8(&buf[..len])
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or_else(|| ErrorKind::InvalidChar(lead).into())
    }

    /// Length written 7 bits per byte, low group first.
    pub fn read_7bit_len(&mut self) -> Result<usize> {
        let mut value = 0u32;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            if shift == 28 && byte & 0x70 != 0 {
                return Err(ErrorKind::InvalidLength(i64::MAX).into());
            }
            value |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return i32::try_from(value)
                    .map(|v| v as usize)
                    .map_err(|_| ErrorKind::InvalidLength(i64::from(value)).into());
            }
        }
        Err(ErrorKind::InvalidLength(i64::from(value)).into())
    }

    /// Length prefixed string without the null flag, used for names.
    pub fn read_str(&mut self) -> Result<String> {
        let len = self.read_7bit_len()?;
        let mut bytes = Vec::new();
        let read = Read::take(&mut *self.inner, len as u64).read_to_end(&mut bytes)?;
        self.position += read as u64;
        if read != len {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        Ok(String::from_utf8(bytes)?)
    }

    /// An empty string is followed by a flag telling it apart from null.
    pub fn read_nullable_str(&mut self) -> Result<Option<String>> {
        let s = self.read_str()?;
        if !s.is_empty() {
            return Ok(Some(s));
        }
        Ok(if self.read_bool()? { None } else { Some(s) })
    }

    /// Sequence or mapping length, `None` for null.
    pub fn read_len(&mut self) -> Result<Option<usize>> {
        match self.read_i32()? {
            -1 => Ok(None),
            len if len < 0 => Err(ErrorKind::InvalidLength(i64::from(len)).into()),
            len => Ok(Some(len as usize)),
        }
    }
}

pub struct ByteWriter<'a> {
    inner: &'a mut dyn Write,
    position: u64,
}

macro_rules! write_le {
    ($($name:ident: $ty:ty),*) => {
        $(
            pub fn $name(&mut self, v: $ty) -> Result<()> {
                self.put(&v.to_le_bytes())
            }
        )*
    };
}

impl<'a> ByteWriter<'a> {
    pub fn new(inner: &'a mut dyn Write) -> Self {
        ByteWriter { inner, position: 0 }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    write_le!(
        write_u8: u8,
        write_i8: i8,
        write_i16: i16,
        write_u16: u16,
        write_i32: i32,
        write_u32: u32,
        write_i64: i64,
        write_u64: u64,
        write_f32: f32,
        write_f64: f64
    );

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_u8(v as u8)
    }

    pub fn write_char(&mut self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.put(v.encode_utf8(&mut buf).as_bytes())
    }

    pub fn write_7bit_len(&mut self, len: usize) -> Result<()> {
        let mut value = u32::try_from(len)
            .ok()
            .filter(|v| *v <= i32::MAX as u32)
            .ok_or(ErrorKind::InvalidLength(len as i64))?;
        while value >= 0x80 {
            self.write_u8(value as u8 | 0x80)?;
            value >>= 7;
        }
        self.write_u8(value as u8)
    }

    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_7bit_len(s.len())?;
        self.put(s.as_bytes())
    }

    pub fn write_nullable_str(&mut self, s: Option<&str>) -> Result<()> {
        let text = s.unwrap_or_default();
        self.write_str(text)?;
        if text.is_empty() {
            self.write_bool(s.is_none())?;
        }
        Ok(())
    }

    pub fn write_len(&mut self, len: Option<usize>) -> Result<()> {
        match len {
            None => self.write_i32(-1),
            Some(len) => {
                let len = i32::try_from(len).map_err(|_| ErrorKind::InvalidLength(len as i64))?;
                self.write_i32(len)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut ByteWriter) -> Result<()>) -> Vec<u8> {
        let mut out = Vec::new();
        f(&mut ByteWriter::new(&mut out)).unwrap();
        out
    }

    #[test]
    fn seven_bit_lengths() {
        assert_eq!(written(|w| w.write_7bit_len(0x7F)), [0x7F]);
        assert_eq!(written(|w| w.write_7bit_len(300)), [0xAC, 0x02]);
        let mut bytes: &[u8] = &[0xAC, 0x02];
        assert_eq!(ByteReader::new(&mut bytes).read_7bit_len().unwrap(), 300);
    }

    #[test]
    fn too_long_length() {
        let mut bytes: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        let e = ByteReader::new(&mut bytes).read_7bit_len().unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::InvalidLength(_)));
    }

    #[test]
    fn nullable_strings() {
        assert_eq!(written(|w| w.write_nullable_str(None)), [0, 1]);
        assert_eq!(written(|w| w.write_nullable_str(Some(""))), [0, 0]);
        assert_eq!(written(|w| w.write_nullable_str(Some("ab"))), [2, b'a', b'b']);

        let mut bytes: &[u8] = &[0, 1, 0, 0, 1, b'x'];
        let mut r = ByteReader::new(&mut bytes);
        assert_eq!(r.read_nullable_str().unwrap(), None);
        assert_eq!(r.read_nullable_str().unwrap(), Some(String::new()));
        assert_eq!(r.read_nullable_str().unwrap(), Some("x".into()));
        assert_eq!(r.position(), 6);
    }

    #[test]
    fn chars_are_utf8() {
        assert_eq!(written(|w| w.write_char('é')), "é".as_bytes());
        let mut bytes: &[u8] = "€a".as_bytes();
        let mut r = ByteReader::new(&mut bytes);
        assert_eq!(r.read_char().unwrap(), '€');
        assert_eq!(r.read_char().unwrap(), 'a');

        let mut bad: &[u8] = &[0xFF];
        let e = ByteReader::new(&mut bad).read_char().unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::InvalidChar(0xFF)));
    }

    #[test]
    fn bools_are_strict() {
        let mut bytes: &[u8] = &[1, 2];
        let mut r = ByteReader::new(&mut bytes);
        assert!(r.read_bool().unwrap());
        assert!(matches!(
            r.read_bool().unwrap_err().kind(),
            ErrorKind::InvalidBool(2)
        ));
    }

    #[test]
    fn truncated_string() {
        let mut bytes: &[u8] = &[3, b'a'];
        let e = ByteReader::new(&mut bytes).read_str().unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::Io(_)));
    }
}
