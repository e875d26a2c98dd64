//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

use notes_service::config::{NotesConfig, UserConfig};
use notes_service::lifecycle::{init_services, Shutdown};
use notes_service::HttpServer;

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config with two users: `u1` (Ada, with avatar) and `u2` (no profile fields).
pub fn test_config() -> NotesConfig {
    let mut config = NotesConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.users = vec![
        UserConfig {
            token: "token-u1".into(),
            user_id: "u1".into(),
            name: Some("Ada".into()),
            image: Some("https://example.test/ada.png".into()),
        },
        UserConfig {
            token: "token-u2".into(),
            user_id: "u2".into(),
            name: None,
            image: None,
        },
    ];
    config
}

/// Boot the service and wait until it accepts connections.
pub async fn start_server(config: NotesConfig) -> TestServer {
    let services = init_services(&config).await.unwrap();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, &services);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    TestServer { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
