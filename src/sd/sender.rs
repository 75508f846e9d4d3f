use crate::codec::{SdSessionCounter, SomeIpHeader, SomeIpSerialize};
use crate::sd::buffer::MessageBuffer;
use crate::sd::descriptor::ServiceInstanceDescriptor;
use crate::sd::message::SdMessage;
use crate::sd::packet::SdPacket;
use crate::transport::SomeIpTransport;
use std::io;
use std::net::SocketAddr;

/// Puts queued SD messages on the wire, one SOME/IP-SD datagram per message.
pub struct SdSender<T: SomeIpTransport> {
    transport: T,
    destination: SocketAddr,
    ttl: u32,
    session: SdSessionCounter,
}

impl<T: SomeIpTransport> SdSender<T> {
    pub fn new(transport: T, destination: SocketAddr, ttl: u32) -> Self {
        SdSender {
            transport,
            destination,
            ttl,
            session: SdSessionCounter::new(),
        }
    }

    /// Sender addressing the descriptor's SD endpoint.
    pub fn for_descriptor(transport: T, descriptor: &ServiceInstanceDescriptor, ttl: u32) -> Self {
        Self::new(transport, descriptor.sd_endpoint(), ttl)
    }

    /// Encode header and SD payload, consuming one session ID.
    pub fn encode(&mut self, message: &SdMessage) -> Vec<u8> {
        let (session_id, reboot) = self.session.next_session();
        self.build(message, session_id, reboot)
    }

    /// The session ID is consumed only once the transport accepted the datagram, so
    /// dropped messages leave no gap in the sequence.
    pub fn send(&mut self, message: &SdMessage) -> io::Result<usize> {
        let (session_id, reboot) = self.session.peek();
        let datagram = self.build(message, session_id, reboot);
        let sent = self.transport.send(&datagram, Some(self.destination))?;
        self.session.next_session();
        Ok(sent)
    }

    fn build(&self, message: &SdMessage, session_id: u16, reboot: bool) -> Vec<u8> {
        let packet = SdPacket::new(vec![message.to_entry(self.ttl)], reboot);

        let mut payload = Vec::with_capacity(packet.encoded_len());
        // Writing into a Vec cannot fail
        let _ = packet.serialize(&mut payload);

        let header = SomeIpHeader::sd(session_id, payload.len() as u32);
        let mut datagram = Vec::with_capacity(SomeIpHeader::HEADER_LENGTH + payload.len());
        datagram.extend_from_slice(&header.serialize());
        datagram.extend_from_slice(&payload);
        datagram
    }

    /// Send everything queued, oldest first. Returns the number of messages sent.
    ///
    /// Stops at the first send error; the failed message and all later ones stay queued.
    pub fn flush(&mut self, buffer: &mut MessageBuffer) -> io::Result<usize> {
        let mut sent = 0;
        while let Some(message) = buffer.pop() {
            if let Err(e) = self.send(&message) {
                buffer.push_front(message);
                return Err(e);
            }
            sent += 1;
        }
        Ok(sent)
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SomeIpDeserialize;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(Vec<u8>, Option<SocketAddr>)>>,
        fail_after: Option<usize>,
        // Reject this many sends before accepting again
        failures: Mutex<usize>,
    }

    impl SomeIpTransport for RecordingTransport {
        fn send(&self, data: &[u8], destination: Option<SocketAddr>) -> io::Result<usize> {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(io::Error::new(io::ErrorKind::Other, "no buffer space"));
            }
            let mut sent = self.sent.lock().unwrap();
            if self.fail_after.is_some_and(|n| sent.len() >= n) {
                return Err(io::Error::new(io::ErrorKind::Other, "link down"));
            }
            sent.push((data.to_vec(), destination));
            Ok(data.len())
        }

        fn receive(&self, _buffer: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
            Err(io::ErrorKind::WouldBlock.into())
        }

        fn local_addr(&self) -> io::Result<SocketAddr> {
            Ok("127.0.0.1:30490".parse().unwrap())
        }
    }

    fn descriptor() -> ServiceInstanceDescriptor {
        ServiceInstanceDescriptor::new(0x1234, 0x0001, 1, 0, Ipv4Addr::new(224, 224, 224, 245))
    }

    #[test]
    fn test_session_ids_increase_per_message() {
        let mut sender = SdSender::for_descriptor(RecordingTransport::default(), &descriptor(), 3);
        let first = sender.encode(&SdMessage::offer(&descriptor()));
        let second = sender.encode(&SdMessage::offer(&descriptor()));

        assert_eq!(SomeIpHeader::deserialize(&first).unwrap().session_id, 1);
        assert_eq!(SomeIpHeader::deserialize(&second).unwrap().session_id, 2);
    }

    #[test]
    fn test_stop_offer_goes_out_with_zero_ttl() {
        let mut sender = SdSender::for_descriptor(RecordingTransport::default(), &descriptor(), 3);
        let datagram = sender.encode(&SdMessage::stop_offer(&descriptor()));
        let packet = SdPacket::from_bytes(&datagram[16..]).unwrap();
        assert!(packet.entries[0].is_stop_offer());
        assert!(packet.reboot());
    }

    #[test]
    fn test_flush_keeps_unsent_messages() {
        let transport = RecordingTransport { fail_after: Some(1), ..Default::default() };
        let mut sender = SdSender::for_descriptor(transport, &descriptor(), 3);
        let mut buffer = MessageBuffer::new();
        buffer.push(SdMessage::offer(&descriptor()));
        buffer.push(SdMessage::offer(&descriptor()));
        buffer.push(SdMessage::stop_offer(&descriptor()));

        assert!(sender.flush(&mut buffer).is_err());
        assert_eq!(buffer.len(), 2);
        assert!(buffer.front().unwrap().is_offer());

        let sent = sender.transport().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, Some("224.224.224.245:30490".parse().unwrap()));
    }

    #[test]
    fn test_failed_send_keeps_session_id() {
        let transport = RecordingTransport { failures: Mutex::new(2), ..Default::default() };
        let mut sender = SdSender::for_descriptor(transport, &descriptor(), 3);

        assert!(sender.send(&SdMessage::offer(&descriptor())).is_err());
        assert!(sender.send(&SdMessage::offer(&descriptor())).is_err());
        sender.send(&SdMessage::offer(&descriptor())).unwrap();
        sender.send(&SdMessage::stop_offer(&descriptor())).unwrap();

        let sent = sender.transport().sent.lock().unwrap();
        let sessions: Vec<u16> = sent
            .iter()
            .map(|(bytes, _)| SomeIpHeader::deserialize(bytes).unwrap().session_id)
            .collect();
        assert_eq!(sessions, vec![1, 2]);
    }
}
