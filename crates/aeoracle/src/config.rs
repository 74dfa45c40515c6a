//! Connection configuration.

use std::time::Duration;

use aeoracle_http::HttpClientConfig;
use aeoracle_ws::WsClientConfig;

/// Default WebSocket port of an æternity node.
pub const DEFAULT_WS_PORT: u16 = 3013;
/// Default HTTP API port of an æternity node.
pub const DEFAULT_HTTP_PORT: u16 = 3023;
/// Default chain height polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Where to connect and as whom.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host: String,
    /// WebSocket port.
    pub port: u16,
    /// HTTP API port, used for height polling.
    pub http_port: u16,
    /// Account that registers the oracle.
    pub account: String,
    /// Height polling interval. Values below 1 ms are clamped to 1 ms.
    pub poll_interval: Duration,
    pub http: HttpClientConfig,
    pub ws: WsClientConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: DEFAULT_WS_PORT,
            http_port: DEFAULT_HTTP_PORT,
            account: String::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            http: HttpClientConfig::default(),
            ws: WsClientConfig::default(),
        }
    }
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            account: account.into(),
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_http_port(mut self, http_port: u16) -> Self {
        self.http_port = http_port;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// `ws://{host}:{port}/websocket`
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}/websocket", self.host, self.port)
    }

    /// `http://{host}:{http_port}`
    pub fn http_url(&self) -> String {
        format!("http://{}:{}", self.host, self.http_port)
    }
}
