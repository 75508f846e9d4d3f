#[cfg(test)]
mod tests {
    use crate::codec::{SomeIpDeserialize, SomeIpSerialize};
    use crate::sd::entries::{EntryType, SdEntry, TTL_INFINITE};
    use crate::sd::packet::{SdPacket, FLAG_REBOOT, FLAG_UNICAST};

    fn offer_entry(ttl: u32) -> SdEntry {
        SdEntry {
            entry_type: EntryType::OfferService,
            service_id: 0x1234,
            instance_id: 0x5678,
            major_version: 1,
            ttl,
            minor_version: 2,
        }
    }

    #[test]
    fn test_sd_packet_serialization() {
        let packet = SdPacket::new(vec![offer_entry(TTL_INFINITE)], true);

        let mut buf = Vec::new();
        packet.serialize(&mut buf).unwrap();

        // Flags(1) + Res(3) + EntLen(4) + Entry(16) + OptLen(4) = 28 bytes
        assert_eq!(buf.len(), 28);
        assert_eq!(buf.len(), packet.encoded_len());
        assert_eq!(buf[0], FLAG_REBOOT | FLAG_UNICAST);
        assert_eq!(buf[4..8], [0, 0, 0, 16]);
        assert_eq!(buf[24..28], [0, 0, 0, 0]);
    }

    #[test]
    fn test_sd_packet_decode() {
        let mut buf = SdPacket::new(vec![offer_entry(0x00ABCDEF), offer_entry(0)], false)
            .to_bytes()
            .unwrap();
        let decoded = SdPacket::from_bytes(&buf).unwrap();

        assert!(!decoded.reboot());
        assert_eq!(decoded.entries.len(), 2);
        assert_eq!(decoded.entries[0].ttl, 0x00ABCDEF);
        assert!(decoded.entries[1].is_stop_offer());

        // A foreign sender may attach options; they are skipped
        let opts_at = buf.len() - 4;
        buf[opts_at..].copy_from_slice(&4u32.to_be_bytes());
        buf.extend_from_slice(&[0, 1, 0x77, 0]);
        assert_eq!(SdPacket::from_bytes(&buf).unwrap().entries.len(), 2);
    }

    #[test]
    fn test_sd_packet_rejects_bad_lengths() {
        let mut buf = SdPacket::new(vec![offer_entry(1)], false).to_bytes().unwrap();
        buf[7] = 15;
        assert!(SdPacket::from_bytes(&buf).is_err());

        let mut buf = SdPacket::new(vec![offer_entry(1)], false).to_bytes().unwrap();
        buf[27] = 8; // claims options that are not there
        assert!(SdPacket::from_bytes(&buf).is_err());
    }
}
