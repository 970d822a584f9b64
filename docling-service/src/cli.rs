use clap::Parser;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "docling-service", version, about = "PDF to Markdown conversion service")]
pub struct CliArgs {
    /// Path to configuration file (TOML, YAML or JSON).
    #[arg(short = 'c', long = "config-path", env = "DOCLING_CONFIG_PATH")]
    pub config_path: Option<String>,
}
