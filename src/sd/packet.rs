use crate::codec::{SomeIpSerialize, SomeIpDeserialize};
use crate::sd::entries::SdEntry;
use std::io::{self, Result, Write, Read};

/// Set while the sender has not yet wrapped its session counter since startup.
pub const FLAG_REBOOT: u8 = 0x80;
/// Sender can receive unicast SD messages.
pub const FLAG_UNICAST: u8 = 0x40;

/// SD payload: header flags, entries array and (empty) options array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdPacket {
    pub flags: u8,
    pub entries: Vec<SdEntry>,
}

impl SdPacket {
    pub fn new(entries: Vec<SdEntry>, reboot: bool) -> Self {
        let mut flags = FLAG_UNICAST;
        if reboot {
            flags |= FLAG_REBOOT;
        }
        SdPacket { flags, entries }
    }

    pub fn reboot(&self) -> bool {
        self.flags & FLAG_REBOOT != 0
    }

    /// Encoded size: flags/reserved (4), entries length (4), entries, options length (4).
    pub fn encoded_len(&self) -> usize {
        12 + self.entries.len() * SdEntry::LENGTH
    }
}

impl SomeIpSerialize for SdPacket {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.flags, 0x00, 0x00, 0x00])?;

        let entries_len = (self.entries.len() * SdEntry::LENGTH) as u32;
        writer.write_all(&entries_len.to_be_bytes())?;
        for entry in &self.entries {
            entry.serialize(writer)?;
        }

        // Options array is always empty
        writer.write_all(&0u32.to_be_bytes())?;
        Ok(())
    }
}

impl SomeIpDeserialize for SdPacket {
    fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let mut header_buf = [0u8; 4]; // Flags(1) + Res(3)
        reader.read_exact(&mut header_buf)?;
        let flags = header_buf[0];

        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let entries_len = u32::from_be_bytes(len_buf) as usize;
        if entries_len % SdEntry::LENGTH != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("entries array length {} is not a multiple of {}", entries_len, SdEntry::LENGTH),
            ));
        }

        let mut entries = Vec::with_capacity(entries_len / SdEntry::LENGTH);
        for _ in 0..entries_len / SdEntry::LENGTH {
            entries.push(SdEntry::deserialize(reader)?);
        }

        // Options are skipped; this side never interprets them
        reader.read_exact(&mut len_buf)?;
        let options_len = u32::from_be_bytes(len_buf) as u64;
        let skipped = io::copy(&mut reader.take(options_len), &mut io::sink())?;
        if skipped != options_len {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated options array"));
        }

        Ok(SdPacket { flags, entries })
    }
}
