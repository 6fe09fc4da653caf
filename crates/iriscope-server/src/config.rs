//! Server configuration from CLI flags and environment variables.

use clap::Parser;

/// Default CORS allowlist: the hosted frontend plus local development
/// origins.
const DEFAULT_ORIGINS: &str =
    "https://bosonian.github.io,http://localhost:8000,http://127.0.0.1:8000";

/// Runtime configuration for the detection service.
///
/// Every flag can also be set through its environment variable, which
/// is how container deployments configure the service.
#[derive(Debug, Parser)]
#[command(name = "iriscope-server", version, about)]
pub struct Config {
    /// Path to the ONNX segmentation model.
    #[arg(long, env = "MODEL_PATH", default_value = "./model/pupil_segnet.onnx")]
    pub model_path: String,

    /// TCP port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Comma-separated list of allowed CORS origins.
    #[arg(long, env = "ALLOWED_ORIGINS", default_value = DEFAULT_ORIGINS)]
    pub allowed_origins: String,
}

impl Config {
    /// The CORS allowlist as individual origins, trimmed, empty
    /// entries dropped.
    #[must_use]
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }
}
