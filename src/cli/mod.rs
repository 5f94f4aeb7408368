use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// API key for the Google Generative Language API. Also read from a local .env file.
    #[arg(long, env = "GOOGLE_API_KEY", default_value = "", hide_env_values = true)]
    pub google_api_key: String,

    /// Gemini model used for chat completion (e.g., gemini-1.5-pro, gemini-1.5-flash)
    #[arg(long, env = "CHAT_MODEL", default_value = "gemini-1.5-pro")]
    pub chat_model: String,

    /// Base URL of the Generative Language API
    #[arg(long, env = "CHAT_BASE_URL", default_value = "https://generativelanguage.googleapis.com")]
    pub chat_base_url: String,

    /// Sampling temperature sent with every request (0.7 when unset)
    #[arg(long, env = "CHAT_TEMPERATURE")]
    pub chat_temperature: Option<f32>,

    /// Upper bound on generated tokens per reply (2048 when unset)
    #[arg(long, env = "CHAT_MAX_OUTPUT_TOKENS")]
    pub chat_max_output_tokens: Option<u32>,

    /// Seconds to wait for the upstream before giving up on a request
    #[arg(long, env = "CHAT_TIMEOUT_SECS", default_value = "60")]
    pub chat_timeout_secs: u64,

    // --- General App Args ---
    /// Host address and port for the HTTP API to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:5000")]
    pub server_addr: String,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}
