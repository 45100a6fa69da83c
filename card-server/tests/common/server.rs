//! Test server harness for integration tests.
//!
//! Provides a way to spin up the real Axum application on a random port
//! for integration testing with HTTP clients.

use std::net::SocketAddr;
use std::sync::Arc;

use card_renderer::fontdb;
use card_server::{AppState, ServerConfig, VerseClient};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Verse dataset root that refuses connections, forcing the fallback path.
pub const UNREACHABLE_VERSE_BASE: &str = "http://127.0.0.1:9/bibles";

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    state: AppState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server whose verse lookups always fall back.
    pub async fn start() -> Self {
        Self::start_with(ServerConfig {
            verse_base_url: UNREACHABLE_VERSE_BASE.to_string(),
            ..ServerConfig::default()
        })
        .await
    }

    /// Start a server with the given configuration and a seeded verse client.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start_with(mut config: ServerConfig) -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        config.port = port;
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let verses = VerseClient::with_seed(&config.verse_base_url, &config.bible_version, 42)
            .expect("verse client");
        // An empty font database keeps exports fast; text is simply not drawn.
        let state = AppState::with_parts(config, verses, Arc::new(fontdb::Database::new()))
            .expect("state");
        let app = card_server::app(state.clone());

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Absolute URL for a path on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// URL of a session-scoped endpoint.
    #[allow(dead_code)]
    pub fn session_url(&self, session_id: &str, rest: &str) -> String {
        self.url(&format!("/api/sessions/{session_id}{rest}"))
    }

    /// Shared state (for test assertions).
    #[allow(dead_code)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}

/// A 1x1 opaque red PNG.
#[allow(dead_code)]
pub const RED_PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0xFC, 0xCF, 0xC0, 0xF0,
    0x1F, 0x00, 0x05, 0x05, 0x02, 0x00, 0x5F, 0xC8, 0xF1, 0xD2, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45,
    0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];
