//! Server configuration from command-line flags and environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

/// Default port for the verse card server.
pub const DEFAULT_PORT: u16 = 9474;

/// Default root of the public verse dataset.
pub const DEFAULT_VERSE_BASE_URL: &str = "https://cdn.jsdelivr.net/gh/wldeh/bible-api/bibles";

/// Default translation identifier within the dataset.
pub const DEFAULT_BIBLE_VERSION: &str = "en-asv";

/// Default `User-Agent` sent by the image proxy.
pub const DEFAULT_PROXY_USER_AGENT: &str = "Mozilla/5.0";

/// Runtime configuration for the verse card server.
#[derive(Debug, Clone, Parser)]
#[command(name = "versecard", version, about = "Verse card composition server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(long, env = "VERSECARD_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind. Keep this on loopback unless fronted by a proxy.
    #[arg(long, env = "VERSECARD_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Root URL of the verse dataset.
    #[arg(long, env = "VERSECARD_VERSE_BASE_URL", default_value = DEFAULT_VERSE_BASE_URL)]
    pub verse_base_url: String,

    /// Translation to draw random verses from.
    #[arg(long, env = "VERSECARD_BIBLE_VERSION", default_value = DEFAULT_BIBLE_VERSION)]
    pub bible_version: String,

    /// `User-Agent` for outbound image fetches.
    #[arg(long, env = "VERSECARD_PROXY_USER_AGENT", default_value = DEFAULT_PROXY_USER_AGENT)]
    pub proxy_user_agent: String,

    /// Default upscale factor for exports.
    #[arg(long, env = "VERSECARD_EXPORT_SCALE", default_value_t = card_renderer::DEFAULT_EXPORT_SCALE)]
    pub export_scale: f32,

    /// Maximum accepted upload size in bytes.
    #[arg(long, env = "VERSECARD_MAX_UPLOAD_BYTES", default_value_t = card_core::MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            verse_base_url: DEFAULT_VERSE_BASE_URL.to_string(),
            bible_version: DEFAULT_BIBLE_VERSION.to_string(),
            proxy_user_agent: DEFAULT_PROXY_USER_AGENT.to_string(),
            export_scale: card_renderer::DEFAULT_EXPORT_SCALE,
            max_upload_bytes: card_core::MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Socket address to listen on.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
