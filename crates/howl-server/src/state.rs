use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;

use crate::auth::{ApiAuth, SessionKeys};
use crate::config::ServerConfig;
use crate::registry::RoomRegistry;

pub type SharedRegistry = Arc<RwLock<RoomRegistry>>;

#[derive(Clone)]
pub struct AppState {
    pub registry: SharedRegistry,
    pub config: Arc<ServerConfig>,
    pub keys: SessionKeys,
    pub api_auth: ApiAuth,
    pub ws_connection_count: Arc<AtomicUsize>,
    pub ws_per_ip: Arc<Mutex<HashMap<IpAddr, usize>>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let keys = SessionKeys::new(config.auth.session_secret.as_deref());
        let api_auth = ApiAuth {
            bearer_token: config.auth.bearer_token.clone(),
        };
        Self {
            registry: Arc::new(RwLock::new(RoomRegistry::new())),
            config: Arc::new(config),
            keys,
            api_auth,
            ws_connection_count: Arc::new(AtomicUsize::new(0)),
            ws_per_ip: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// RAII guard for the global WebSocket connection count.
pub struct ConnectionGuard {
    count: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    pub fn new(count: Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::Relaxed);
        Self { count }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::Relaxed);
    }
}

/// RAII guard for the per-IP WebSocket connection count.
pub struct IpConnectionGuard {
    ip: IpAddr,
    map: Arc<Mutex<HashMap<IpAddr, usize>>>,
}

impl IpConnectionGuard {
    /// Acquire a slot for `ip`, or `None` when the per-IP cap is reached.
    pub fn try_acquire(
        ip: IpAddr,
        map: Arc<Mutex<HashMap<IpAddr, usize>>>,
        max_per_ip: usize,
    ) -> Option<Self> {
        {
            let mut slots = map.lock().ok()?;
            let count = slots.entry(ip).or_insert(0);
            if *count >= max_per_ip {
                return None;
            }
            *count += 1;
        }
        Some(Self { ip, map })
    }
}

impl Drop for IpConnectionGuard {
    fn drop(&mut self) {
        if let Ok(mut slots) = self.map.lock() {
            if let Some(count) = slots.get_mut(&self.ip) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    slots.remove(&self.ip);
                }
            }
        }
    }
}
