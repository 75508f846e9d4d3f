/// Service ID reserved for SOME/IP-SD messages.
pub const SD_SERVICE_ID: u16 = 0xFFFF;
/// Method ID reserved for SOME/IP-SD messages.
pub const SD_METHOD_ID: u16 = 0x8100;
/// SD messages are always sent with client ID 0.
pub const SD_CLIENT_ID: u16 = 0x0000;
pub const MESSAGE_TYPE_NOTIFICATION: u8 = 0x02;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SomeIpHeader {
    pub service_id: u16,
    pub method_id: u16,
    pub length: u32,
    pub client_id: u16,
    pub session_id: u16,
    pub protocol_version: u8,
    pub interface_version: u8,
    pub message_type: u8,
    pub return_code: u8,
}

impl SomeIpHeader {
    pub const HEADER_LENGTH: usize = 16;
    pub const SOMEIP_PROTOCOL_VERSION: u8 = 0x01;

    pub fn new(service_id: u16, method_id: u16, client_id: u16, session_id: u16, message_type: u8, payload_len: u32) -> Self {
        SomeIpHeader {
            service_id,
            method_id,
            length: payload_len + 8, // Request ID (4) + versions/type/return code (4)
            client_id,
            session_id,
            protocol_version: Self::SOMEIP_PROTOCOL_VERSION,
            interface_version: 0x01,
            message_type,
            return_code: 0x00,
        }
    }

    /// Header for an SD notification carrying `payload_len` bytes of SD payload.
    pub fn sd(session_id: u16, payload_len: u32) -> Self {
        Self::new(SD_SERVICE_ID, SD_METHOD_ID, SD_CLIENT_ID, session_id, MESSAGE_TYPE_NOTIFICATION, payload_len)
    }

    pub fn is_sd(&self) -> bool {
        self.service_id == SD_SERVICE_ID && self.method_id == SD_METHOD_ID
    }

    /// Payload bytes following the header, derived from the length field.
    pub fn payload_len(&self) -> usize {
        self.length.saturating_sub(8) as usize
    }

    pub fn serialize(&self) -> [u8; 16] {
        let mut buffer = [0u8; 16];

        // Message ID (Service ID + Method ID)
        buffer[0..2].copy_from_slice(&self.service_id.to_be_bytes());
        buffer[2..4].copy_from_slice(&self.method_id.to_be_bytes());

        buffer[4..8].copy_from_slice(&self.length.to_be_bytes());

        // Request ID (Client ID + Session ID)
        buffer[8..10].copy_from_slice(&self.client_id.to_be_bytes());
        buffer[10..12].copy_from_slice(&self.session_id.to_be_bytes());

        buffer[12] = self.protocol_version;
        buffer[13] = self.interface_version;
        buffer[14] = self.message_type;
        buffer[15] = self.return_code;

        buffer
    }

    pub fn deserialize(buffer: &[u8]) -> Result<Self, &'static str> {
        if buffer.len() < Self::HEADER_LENGTH {
            return Err("Buffer too small for SOME/IP header");
        }

        Ok(SomeIpHeader {
            service_id: u16::from_be_bytes([buffer[0], buffer[1]]),
            method_id: u16::from_be_bytes([buffer[2], buffer[3]]),
            length: u32::from_be_bytes([buffer[4], buffer[5], buffer[6], buffer[7]]),
            client_id: u16::from_be_bytes([buffer[8], buffer[9]]),
            session_id: u16::from_be_bytes([buffer[10], buffer[11]]),
            protocol_version: buffer[12],
            interface_version: buffer[13],
            message_type: buffer[14],
            return_code: buffer[15],
        })
    }
}
