//! Host resolution through the system resolver.

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

use crate::ports::{HostResolver, ResolveError};

pub struct TokioHostResolver {
    timeout: Duration,
}

impl TokioHostResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl HostResolver for TokioHostResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        // Port is required by lookup_host but irrelevant here
        let lookup = tokio::net::lookup_host((host, 0));
        let addrs = tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_| ResolveError::Timeout)?
            .map_err(|e| ResolveError::Lookup(e.to_string()))?;

        let mut ips: Vec<IpAddr> = addrs.map(|addr| addr.ip()).collect();
        ips.sort();
        ips.dedup();
        Ok(ips)
    }
}
