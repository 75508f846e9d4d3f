use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Well-known SOME/IP-SD port.
pub const DEFAULT_SD_PORT: u16 = 30490;

/// Identity of the announced service instance and where SD traffic goes.
///
/// Fixed for the lifetime of a server; there are no setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceInstanceDescriptor {
    service_id: u16,
    instance_id: u16,
    major_version: u8,
    minor_version: u32,
    sd_address: Ipv4Addr,
    sd_port: u16,
}

impl ServiceInstanceDescriptor {
    pub fn new(service_id: u16, instance_id: u16, major_version: u8, minor_version: u32, sd_address: Ipv4Addr) -> Self {
        ServiceInstanceDescriptor {
            service_id,
            instance_id,
            major_version,
            minor_version,
            sd_address,
            sd_port: DEFAULT_SD_PORT,
        }
    }

    pub fn with_sd_port(mut self, sd_port: u16) -> Self {
        self.sd_port = sd_port;
        self
    }

    pub fn service_id(&self) -> u16 {
        self.service_id
    }

    pub fn instance_id(&self) -> u16 {
        self.instance_id
    }

    pub fn major_version(&self) -> u8 {
        self.major_version
    }

    pub fn minor_version(&self) -> u32 {
        self.minor_version
    }

    pub fn sd_address(&self) -> Ipv4Addr {
        self.sd_address
    }

    pub fn sd_port(&self) -> u16 {
        self.sd_port
    }

    pub fn sd_endpoint(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.sd_address, self.sd_port))
    }
}

impl std::fmt::Display for ServiceInstanceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "0x{:04x}.0x{:04x} v{}.{}",
            self.service_id, self.instance_id, self.major_version, self.minor_version
        )
    }
}
