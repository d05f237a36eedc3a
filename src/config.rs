use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::{Result, SparrowError};

/// Port a worker listens on when none is given.
pub const DEFAULT_WORKER_PORT: u16 = 9100;

/// Address of a worker the scheduler talks to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WorkerEndpoint {
    pub host: String,
    pub port: u16,
}

impl WorkerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse a comma-separated list such as `"10.0.0.1:9100,10.0.0.2"`.
    /// Empty entries are skipped.
    pub fn parse_list(s: &str) -> Result<Vec<WorkerEndpoint>> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl From<SocketAddr> for WorkerEndpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

impl FromStr for WorkerEndpoint {
    type Err = SparrowError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || SparrowError::InvalidWorkerAddr(s.to_string());

        // Literal addresses first, so IPv6 colons are not mistaken for a port
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(Self::from(addr));
        }
        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::new(ip.to_string(), DEFAULT_WORKER_PORT));
        }
        if let Some(inner) = s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            let ip = inner.parse::<Ipv6Addr>().map_err(|_| invalid())?;
            return Ok(Self::new(ip.to_string(), DEFAULT_WORKER_PORT));
        }

        match s.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && !host.contains(':') => {
                let port = port.parse::<u16>().map_err(|_| invalid())?;
                Ok(Self::new(host, port))
            }
            Some(_) => Err(invalid()),
            None if s.is_empty() => Err(invalid()),
            None => Ok(Self::new(s, DEFAULT_WORKER_PORT)),
        }
    }
}

impl fmt::Display for WorkerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub listen_addr: SocketAddr,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::with_port(DEFAULT_WORKER_PORT)
    }
}

impl WorkerConfig {
    /// Listen on every interface at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], port)),
        }
    }
}

/// Shape of the synthetic job durations.
///
/// The default reproduces the experiment's mix: 90% light jobs of 30ms and
/// 10% heavy jobs of 400ms.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationConfig {
    pub light_ms: u64,
    pub heavy_ms: u64,
    /// Probability in `[0, 1]` that a job is heavy.
    pub heavy_ratio: f64,
    /// Seed for reproducible runs; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            light_ms: 30,
            heavy_ms: 400,
            heavy_ratio: 0.1,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Probe every worker, assign to the least loaded
    Batch,
    /// Request on every worker, then cancel on every worker
    #[value(name = "latepro")]
    LatePro,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Batch => write!(f, "batch"),
            PolicyKind::LatePro => write!(f, "latepro"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub workers: Vec<WorkerEndpoint>,
    pub policy: PolicyKind,
    pub jobs: usize,
    /// Tasks placed per job under batch sampling. Late binding always places one.
    pub tasks_per_job: usize,
    /// Sent as the origin field of every `ASSIGN`.
    pub scheduler_addr: String,
    pub durations: DurationConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: Vec::new(),
            policy: PolicyKind::Batch,
            jobs: 100,
            tasks_per_job: 3,
            scheduler_addr: "127.0.0.1".to_string(),
            durations: DurationConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn new(workers: Vec<WorkerEndpoint>, policy: PolicyKind) -> Self {
        Self {
            workers,
            policy,
            ..Default::default()
        }
    }

    pub fn with_worker(mut self, endpoint: WorkerEndpoint) -> Self {
        self.workers.push(endpoint);
        self
    }

    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers.is_empty() {
            return Err(SparrowError::NoWorkersAvailable);
        }
        if self.tasks_per_job == 0 {
            return Err(SparrowError::InvalidConfig(
                "tasks per job must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.durations.heavy_ratio) {
            return Err(SparrowError::InvalidConfig(format!(
                "heavy ratio {} is outside [0, 1]",
                self.durations.heavy_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_parses_host_and_port() {
        let ep: WorkerEndpoint = "10.96.1.135:9101".parse().unwrap();
        assert_eq!(ep.host, "10.96.1.135");
        assert_eq!(ep.port, 9101);
        assert_eq!(ep.to_string(), "10.96.1.135:9101");
    }

    #[test]
    fn endpoint_without_port_uses_default() {
        let ep: WorkerEndpoint = "worker-1".parse().unwrap();
        assert_eq!(ep, WorkerEndpoint::new("worker-1", DEFAULT_WORKER_PORT));
    }

    #[test]
    fn endpoint_rejects_bad_port() {
        assert!(matches!(
            "host:abc".parse::<WorkerEndpoint>(),
            Err(SparrowError::InvalidWorkerAddr(_))
        ));
        assert!(":9100".parse::<WorkerEndpoint>().is_err());
        assert!("".parse::<WorkerEndpoint>().is_err());
    }

    #[test]
    fn endpoint_parses_ipv6() {
        let bare: WorkerEndpoint = "::1".parse().unwrap();
        assert_eq!(bare, WorkerEndpoint::new("::1", DEFAULT_WORKER_PORT));

        let bracketed: WorkerEndpoint = "[::1]".parse().unwrap();
        assert_eq!(bracketed, bare);

        let with_port: WorkerEndpoint = "[fe80::2]:9101".parse().unwrap();
        assert_eq!(with_port.host, "fe80::2");
        assert_eq!(with_port.port, 9101);

        assert!("[::1".parse::<WorkerEndpoint>().is_err());
        assert!("[nope]".parse::<WorkerEndpoint>().is_err());
    }

    #[test]
    fn ipv6_endpoint_display_parses_back() {
        let addr: SocketAddr = "[::1]:9102".parse().unwrap();
        let ep = WorkerEndpoint::from(addr);
        assert_eq!(ep.to_string(), "[::1]:9102");
        assert_eq!(ep.to_string().parse::<WorkerEndpoint>().unwrap(), ep);

        let v4 = WorkerEndpoint::from(SocketAddr::from(([127, 0, 0, 1], 9100)));
        assert_eq!(v4.to_string().parse::<WorkerEndpoint>().unwrap(), v4);
    }

    #[test]
    fn endpoint_list_skips_empty_entries() {
        let list = WorkerEndpoint::parse_list("127.0.0.1:9100, ,127.0.0.1:9101,").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].port, 9101);
        assert!(WorkerEndpoint::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn worker_config_default() {
        let cfg = WorkerConfig::default();
        assert_eq!(cfg.listen_addr.to_string(), "0.0.0.0:9100");
        assert_eq!(WorkerConfig::with_port(9200).listen_addr.port(), 9200);
    }

    #[test]
    fn duration_config_default() {
        let cfg = DurationConfig::default();
        assert_eq!(cfg.light_ms, 30);
        assert_eq!(cfg.heavy_ms, 400);
        assert_eq!(cfg.heavy_ratio, 0.1);
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn scheduler_config_default() {
        let cfg = SchedulerConfig::default();
        assert!(cfg.workers.is_empty());
        assert_eq!(cfg.policy, PolicyKind::Batch);
        assert_eq!(cfg.jobs, 100);
        assert_eq!(cfg.tasks_per_job, 3);
        assert_eq!(cfg.scheduler_addr, "127.0.0.1");
    }

    #[test]
    fn scheduler_config_builders() {
        let cfg = SchedulerConfig::default()
            .with_worker(WorkerEndpoint::new("127.0.0.1", 9100))
            .with_worker(WorkerEndpoint::new("127.0.0.1", 9101))
            .with_policy(PolicyKind::LatePro);
        assert_eq!(cfg.workers.len(), 2);
        assert_eq!(cfg.policy, PolicyKind::LatePro);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn scheduler_config_validate_rejects_empty_pool() {
        let cfg = SchedulerConfig::default();
        assert!(matches!(
            cfg.validate(),
            Err(SparrowError::NoWorkersAvailable)
        ));
    }

    #[test]
    fn scheduler_config_validate_rejects_zero_tasks() {
        let mut cfg = SchedulerConfig::default().with_worker(WorkerEndpoint::new("a", 1));
        cfg.tasks_per_job = 0;
        assert!(matches!(cfg.validate(), Err(SparrowError::InvalidConfig(_))));

        cfg.tasks_per_job = 1;
        cfg.durations.heavy_ratio = 1.5;
        assert!(matches!(cfg.validate(), Err(SparrowError::InvalidConfig(_))));
    }

    #[test]
    fn policy_kind_display() {
        assert_eq!(PolicyKind::Batch.to_string(), "batch");
        assert_eq!(PolicyKind::LatePro.to_string(), "latepro");
    }
}
