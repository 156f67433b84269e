use crate::error::{ErrorKind, Result};
use crate::io::{ByteReader, ByteWriter};
use shale_base::RoughType;

impl ByteReader<'_> {
    /// Reads a tag byte followed by the nested tags of sequences and mappings.
    pub fn read_tag(&mut self) -> Result<RoughType> {
        self.read_nested_tag(0)
    }

    fn read_nested_tag(&mut self, depth: usize) -> Result<RoughType> {
        if depth > self.max_depth() {
            return Err(ErrorKind::TooDeep(self.max_depth()).into());
        }
        match self.read_u8()? {
            RoughType::SEQUENCE => Ok(RoughType::Sequence(Box::new(
                self.read_nested_tag(depth + 1)?,
            ))),
            RoughType::MAPPING => {
                let key = self.read_nested_tag(depth + 1)?;
                let value = self.read_nested_tag(depth + 1)?;
                Ok(RoughType::Mapping(Box::new(key), Box::new(value)))
            }
            code => RoughType::leaf(code).ok_or_else(|| ErrorKind::UnknownRoughType(code).into()),
        }
    }
}

impl ByteWriter<'_> {
    pub fn write_tag(&mut self, tag: &RoughType) -> Result<()> {
        self.write_u8(tag.code())?;
        match tag {
            RoughType::Sequence(element) => self.write_tag(element),
            RoughType::Mapping(key, value) => {
                self.write_tag(key)?;
                self.write_tag(value)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_tags() {
        let tag = RoughType::Mapping(
            Box::new(RoughType::String),
            Box::new(RoughType::Sequence(Box::new(RoughType::Record))),
        );
        let mut out = Vec::new();
        ByteWriter::new(&mut out).write_tag(&tag).unwrap();
        assert_eq!(out, [34, 16, 33, 32]);

        let mut bytes = out.as_slice();
        assert_eq!(ByteReader::new(&mut bytes).read_tag().unwrap(), tag);
    }

    #[test]
    fn nesting_is_capped() {
        let mut deep = vec![RoughType::SEQUENCE; 4];
        deep.push(RoughType::INT);
        let mut bytes = deep.as_slice();
        let mut r = ByteReader::new(&mut bytes).with_max_depth(3);
        assert!(matches!(r.read_tag().unwrap_err().kind(), ErrorKind::TooDeep(3)));

        let mut bytes = deep.as_slice();
        let mut r = ByteReader::new(&mut bytes).with_max_depth(4);
        assert!(r.read_tag().is_ok());
    }

    #[test]
    fn unknown_tag() {
        let mut bytes: &[u8] = &[33, 13];
        let e = ByteReader::new(&mut bytes).read_tag().unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::UnknownRoughType(13)));
    }
}
