use tracing::{debug, warn};

use crate::adapters::Resolver;
use crate::domain::Server;

/// Configured servers with their resolution and performance state.
#[derive(Clone, Debug, Default)]
pub struct ServerPool {
    servers: Vec<Server>,
}

impl ServerPool {
    pub fn new<I, S>(hostnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pool = Self::default();
        pool.configure(hostnames);
        pool
    }

    /// Build a pool from already populated entries.
    pub fn from_servers(servers: Vec<Server>) -> Self {
        Self { servers }
    }

    /// Replace the whole pool. Every entry starts unresolved and unranked.
    pub fn configure<I, S>(&mut self, hostnames: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.servers = hostnames.into_iter().map(Server::new).collect();
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub(crate) fn server_mut(&mut self, idx: usize) -> Option<&mut Server> {
        self.servers.get_mut(idx)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.servers.iter().filter(|s| s.is_resolved()).count()
    }

    /// Resolve every unresolved server. Returns true only when all servers
    /// end up resolved; failures stay unresolved until the next call.
    pub async fn resolve_all(&mut self, resolver: &dyn Resolver) -> bool {
        let mut all_resolved = true;
        for server in self.servers.iter_mut().filter(|s| !s.is_resolved()) {
            debug!(host = server.hostname(), "resolving");
            match resolver.resolve(server.hostname()).await {
                Ok(ip) => {
                    debug!(host = server.hostname(), %ip, "resolved");
                    server.mark_resolved(ip);
                }
                Err(e) => {
                    warn!(host = server.hostname(), error = %e, "resolution failed");
                    all_resolved = false;
                }
            }
        }
        all_resolved
    }

    /// Resolved servers first, then ascending response time. Stable.
    pub fn rank_by_performance(&mut self) {
        self.servers
            .sort_by_key(|s| (!s.is_resolved(), s.last_response_ms));
    }
}
