use crate::error::{ConfigError, Result};
use crate::sd::{
    SdServer, ServiceInstanceDescriptor, StartPolicy, TimerFacility, TimingConfig, DEFAULT_SD_PORT, TTL_INFINITE,
};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::net::Ipv4Addr;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub service_id: u16,
    pub instance_id: u16,
    pub major_version: u8,
    #[serde(default)]
    pub minor_version: u32,
}

/// Service Discovery Configuration
/// All timing values are in milliseconds unless otherwise specified
#[derive(Debug, Deserialize, Clone)]
pub struct SdConfig {
    /// SD destination address (default: 224.224.224.245)
    #[serde(default = "default_address")]
    pub address: Ipv4Addr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Local interface for outgoing multicast
    #[serde(default)]
    pub interface: Option<Ipv4Addr>,
    /// Minimum initial delay before first offer (ms, default: 10)
    #[serde(default = "default_initial_delay_min")]
    pub initial_delay_min_ms: u64,
    /// Maximum initial delay before first offer (ms, default: 100)
    #[serde(default = "default_initial_delay_max")]
    pub initial_delay_max_ms: u64,
    /// Base delay for repetition phase (ms, default: 100)
    #[serde(default = "default_repetition_base_delay")]
    pub repetition_base_delay_ms: u64,
    /// Maximum repetitions before entering main phase (default: 3)
    #[serde(default = "default_repetition_max")]
    pub repetition_max: u32,
    /// Cyclic announcement delay in main phase (ms, default: 1000)
    #[serde(default = "default_cycle_offer_delay")]
    pub cycle_offer_delay_ms: u64,
    /// Time-to-live for service offers (seconds, default: 0xFFFFFF = ~194 days)
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl Default for SdConfig {
    fn default() -> Self {
        SdConfig {
            address: default_address(),
            port: default_port(),
            interface: None,
            initial_delay_min_ms: default_initial_delay_min(),
            initial_delay_max_ms: default_initial_delay_max(),
            repetition_base_delay_ms: default_repetition_base_delay(),
            repetition_max: default_repetition_max(),
            cycle_offer_delay_ms: default_cycle_offer_delay(),
            ttl: default_ttl(),
        }
    }
}

fn default_address() -> Ipv4Addr { Ipv4Addr::new(224, 224, 224, 245) }
fn default_port() -> u16 { DEFAULT_SD_PORT }
fn default_initial_delay_min() -> u64 { 10 }
fn default_initial_delay_max() -> u64 { 100 }
fn default_repetition_base_delay() -> u64 { 100 }
fn default_repetition_max() -> u32 { 3 }
fn default_cycle_offer_delay() -> u64 { 1000 }
fn default_ttl() -> u32 { TTL_INFINITE }
fn default_true() -> bool { true }

/// Everything needed to run one SD server instance.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub sd: SdConfig,
    #[serde(default = "default_true")]
    pub service_available: bool,
    #[serde(default = "default_true")]
    pub link_available: bool,
    #[serde(default)]
    pub start_policy: StartPolicy,
    /// Fixed seed for the initial-delay jitter
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl ServerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e).into())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|e| ConfigError::Parse(e).into())
    }

    pub fn descriptor(&self) -> ServiceInstanceDescriptor {
        ServiceInstanceDescriptor::new(
            self.service.service_id,
            self.service.instance_id,
            self.service.major_version,
            self.service.minor_version,
            self.sd.address,
        )
        .with_sd_port(self.sd.port)
    }

    pub fn timing(&self) -> Result<TimingConfig> {
        Ok(TimingConfig::from_millis(
            self.sd.initial_delay_min_ms,
            self.sd.initial_delay_max_ms,
            self.sd.repetition_base_delay_ms,
            self.sd.cycle_offer_delay_ms,
            self.sd.repetition_max,
        )?)
    }

    /// Offer TTL in seconds. Must fit the 24-bit wire field and be non-zero.
    pub fn ttl(&self) -> Result<u32> {
        match self.sd.ttl {
            1..=TTL_INFINITE => Ok(self.sd.ttl),
            ttl => Err(ConfigError::InvalidTtl(ttl).into()),
        }
    }

    pub fn build_server<T: TimerFacility>(&self, timer: T) -> Result<SdServer<T>> {
        self.ttl()?;
        let server = SdServer::new(self.descriptor(), self.timing()?, timer)?
            .with_service_available(self.service_available)
            .with_link_available(self.link_available)
            .with_start_policy(self.start_policy);
        Ok(match self.rng_seed {
            Some(seed) => server.with_rng_seed(seed),
            None => server,
        })
    }
}
