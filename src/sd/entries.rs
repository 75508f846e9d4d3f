use crate::codec::{SomeIpSerialize, SomeIpDeserialize};
use std::io::{Result, Write, Read};

/// TTL announcing "valid until further notice" (24-bit maximum).
pub const TTL_INFINITE: u32 = 0x00FF_FFFF;

/// Service entry types (Type 1 entries) of SOME/IP-SD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntryType {
    FindService = 0x00,
    /// Offer Service; with TTL 0 it is a Stop Offer Service
    OfferService = 0x01,
    Unknown = 0xFF,
}

impl From<u8> for EntryType {
    fn from(v: u8) -> Self {
        match v {
            0x00 => EntryType::FindService,
            0x01 => EntryType::OfferService,
            _ => EntryType::Unknown,
        }
    }
}

/// A 16-byte service entry without option references.
///
/// The server announces identity only, so both option runs are always empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdEntry {
    pub entry_type: EntryType,
    pub service_id: u16,
    pub instance_id: u16,
    pub major_version: u8,
    pub ttl: u32, // 24 bits
    pub minor_version: u32,
}

impl SdEntry {
    pub const LENGTH: usize = 16;

    pub fn is_offer(&self) -> bool {
        self.entry_type == EntryType::OfferService && self.ttl != 0
    }

    pub fn is_stop_offer(&self) -> bool {
        self.entry_type == EntryType::OfferService && self.ttl == 0
    }
}

impl SomeIpSerialize for SdEntry {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        // type, index 1st run, index 2nd run, number of options (both runs)
        writer.write_all(&[self.entry_type as u8, 0, 0, 0])?;

        writer.write_all(&self.service_id.to_be_bytes())?;
        writer.write_all(&self.instance_id.to_be_bytes())?;
        writer.write_all(&[self.major_version])?;

        let ttl_bytes = (self.ttl & TTL_INFINITE).to_be_bytes();
        writer.write_all(&ttl_bytes[1..4])?;

        writer.write_all(&self.minor_version.to_be_bytes())?;
        Ok(())
    }
}

impl SomeIpDeserialize for SdEntry {
    fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; Self::LENGTH];
        reader.read_exact(&mut buf)?;

        Ok(SdEntry {
            entry_type: buf[0].into(),
            service_id: u16::from_be_bytes([buf[4], buf[5]]),
            instance_id: u16::from_be_bytes([buf[6], buf[7]]),
            major_version: buf[8],
            ttl: u32::from_be_bytes([0, buf[9], buf[10], buf[11]]),
            minor_version: u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_truncated_to_24_bits() {
        let entry = SdEntry {
            entry_type: EntryType::OfferService,
            service_id: 0x1234,
            instance_id: 1,
            major_version: 1,
            ttl: 0xFFFF_FFFF,
            minor_version: 0,
        };
        let bytes = entry.to_bytes().unwrap();
        assert_eq!(bytes[9..12], [0xFF, 0xFF, 0xFF]);
        assert_eq!(SdEntry::from_bytes(&bytes).unwrap().ttl, TTL_INFINITE);
    }

    #[test]
    fn test_stop_offer_classification() {
        let mut entry = SdEntry {
            entry_type: EntryType::OfferService,
            service_id: 0x1234,
            instance_id: 1,
            major_version: 1,
            ttl: 0,
            minor_version: 0,
        };
        assert!(entry.is_stop_offer());
        assert!(!entry.is_offer());

        entry.ttl = 3;
        assert!(entry.is_offer());
        assert!(!entry.is_stop_offer());
    }

    #[test]
    fn test_unknown_entry_type() {
        assert_eq!(EntryType::from(0x06), EntryType::Unknown);
    }
}
