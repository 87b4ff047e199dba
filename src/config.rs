use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL for the book library; in-memory store when unset
    #[serde(default)]
    pub database_url: Option<String>,

    /// JSON file of owned books loaded into the in-memory store
    #[serde(default)]
    pub library_file: Option<String>,

    /// Redis connection URL for the catalog search cache
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Google Books volumes endpoint
    #[serde(default = "default_google_books_api_url")]
    pub google_books_api_url: String,

    /// Optional Google Books API key
    #[serde(default)]
    pub google_books_api_key: Option<String>,

    /// Open Library search endpoint
    #[serde(default = "default_open_library_api_url")]
    pub open_library_api_url: String,

    /// Gemini API key. Assisted analysis is disabled without it.
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Timeout applied to every outbound HTTP call
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// TTL of cached catalog searches
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_google_books_api_url() -> String {
    "https://www.googleapis.com/books/v1/volumes".to_string()
}

fn default_open_library_api_url() -> String {
    "https://openlibrary.org/search.json".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_http_timeout_secs() -> u64 {
    8
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Whether the language-model strategy can run at all
    pub fn assisted_analysis_enabled(&self) -> bool {
        self.gemini_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}
