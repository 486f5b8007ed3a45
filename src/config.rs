use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory the JSON-lines sink appends interaction and transaction rows to
    #[serde(default = "default_sink_dir")]
    pub sink_dir: PathBuf,

    /// Fixed seed for the synthesis endpoint; unseeded runs are not reproducible
    #[serde(default)]
    pub synthesis_seed: Option<u64>,

    /// Number of users handled per synthesis chunk
    #[serde(default = "default_synthesis_chunk_size")]
    pub synthesis_chunk_size: usize,

    /// Recommendations shown per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_sink_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_synthesis_chunk_size() -> usize {
    1000
}

fn default_page_size() -> usize {
    12
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            sink_dir: default_sink_dir(),
            synthesis_seed: None,
            synthesis_chunk_size: default_synthesis_chunk_size(),
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.synthesis_chunk_size == 0 {
            anyhow::bail!("SYNTHESIS_CHUNK_SIZE must be greater than zero");
        }
        if self.page_size == 0 {
            anyhow::bail!("PAGE_SIZE must be greater than zero");
        }
        Ok(())
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
