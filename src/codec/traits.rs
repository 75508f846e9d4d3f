use std::io::{Read, Result, Write};

/// Big-endian SOME/IP wire encoding.
pub trait SomeIpSerialize {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()>;

    /// Encode into a fresh buffer.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.serialize(&mut buf)?;
        Ok(buf)
    }
}

/// Big-endian SOME/IP wire decoding.
pub trait SomeIpDeserialize: Sized {
    fn deserialize<R: Read>(reader: &mut R) -> Result<Self>;

    fn from_bytes(mut bytes: &[u8]) -> Result<Self> {
        Self::deserialize(&mut bytes)
    }
}
