//! Shared utilities for integration testing.

use std::fs::{self, File};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use response_header_manager::config::ServerConfig;
use response_header_manager::{HeaderManager, HttpServer, Shutdown};
use tokio::net::TcpListener;

static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

/// A rules file in the temp directory, removed on drop.
pub struct RulesFile {
    path: PathBuf,
}

impl RulesFile {
    pub fn new(content: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "rhm-it-{}-{}.toml",
            std::process::id(),
            NEXT_FILE.fetch_add(1, Ordering::SeqCst)
        ));
        fs::write(&path, content).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the content and push the modification time into the future so the change is
    /// visible regardless of filesystem timestamp resolution.
    #[allow(dead_code)]
    pub fn rewrite(&self, content: &str) {
        fs::write(&self.path, content).unwrap();
        let file = File::options().write(true).open(&self.path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .unwrap();
    }
}

impl Drop for RulesFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Rules with a single default header on a single pattern.
#[allow(dead_code)]
pub fn single_rule(url: &str, name: &str, value: &str) -> String {
    format!("[[mapping]]\nurl = \"{url}\"\n[[mapping.default]]\nname = \"{name}\"\nvalue = \"{value}\"\n")
}

/// Serve `manager` on an ephemeral local port until `shutdown` fires.
pub async fn start_server(manager: Arc<HeaderManager>, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig {
        bind_address: addr.to_string(),
        ..Default::default()
    };

    let server = HttpServer::new(config, manager);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    addr
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Fetch `path` and return the value of `header`, if present.
#[allow(dead_code)]
pub async fn header_of(addr: SocketAddr, path: &str, header: &str) -> Option<String> {
    let res = client()
        .get(format!("http://{addr}{path}"))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    res.headers()
        .get(header)
        .map(|v| v.to_str().unwrap().to_owned())
}
