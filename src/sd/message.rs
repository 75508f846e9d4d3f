use crate::sd::descriptor::ServiceInstanceDescriptor;
use crate::sd::entries::{EntryType, SdEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdMessageKind {
    Offer,
    StopOffer,
}

/// An announcement waiting in the [`MessageBuffer`](crate::sd::MessageBuffer).
///
/// Carries identity only; TTL and session data are stamped on by the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdMessage {
    pub kind: SdMessageKind,
    pub service_id: u16,
    pub instance_id: u16,
    pub major_version: u8,
    pub minor_version: u32,
}

impl SdMessage {
    pub fn offer(descriptor: &ServiceInstanceDescriptor) -> Self {
        Self::with_kind(SdMessageKind::Offer, descriptor)
    }

    pub fn stop_offer(descriptor: &ServiceInstanceDescriptor) -> Self {
        Self::with_kind(SdMessageKind::StopOffer, descriptor)
    }

    fn with_kind(kind: SdMessageKind, descriptor: &ServiceInstanceDescriptor) -> Self {
        SdMessage {
            kind,
            service_id: descriptor.service_id(),
            instance_id: descriptor.instance_id(),
            major_version: descriptor.major_version(),
            minor_version: descriptor.minor_version(),
        }
    }

    pub fn is_offer(&self) -> bool {
        self.kind == SdMessageKind::Offer
    }

    pub fn is_stop_offer(&self) -> bool {
        self.kind == SdMessageKind::StopOffer
    }

    /// Service entry for this message. A stop offer always goes out with TTL 0.
    pub fn to_entry(&self, ttl: u32) -> SdEntry {
        SdEntry {
            entry_type: EntryType::OfferService,
            service_id: self.service_id,
            instance_id: self.instance_id,
            major_version: self.major_version,
            ttl: match self.kind {
                SdMessageKind::Offer => ttl,
                SdMessageKind::StopOffer => 0,
            },
            minor_version: self.minor_version,
        }
    }
}
