pub mod cli;
pub mod lambda;
pub mod toml_config;

pub use toml_config::ScoutConfig;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "price-scout")]
#[command(about = "Second-hand marketplace price lookup and listing template tool")]
pub struct CliConfig {
    /// TOML 設定檔；未指定時使用預設值加環境變數
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// 覆寫每個來源的逾時秒數
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Look up second-hand prices on every marketplace
    Prices { query: String },

    /// Identify a product photo, then look up its prices
    Analyze {
        image: String,

        /// MIME type of the image; guessed from the extension when omitted
        #[arg(long)]
        mime: Option<String>,

        /// Only identify the product
        #[arg(long)]
        no_prices: bool,
    },

    /// Extract reference listings and synthesize a template
    Scrape {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Manage saved listing templates
    #[command(subcommand)]
    Templates(TemplateCommand),
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum TemplateCommand {
    List,
    Show {
        id: String,
    },
    Add {
        #[arg(long)]
        category: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
    Update {
        id: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
    Remove {
        id: String,
    },
    /// Learn a template from reference listings
    Learn {
        #[arg(long)]
        category: String,
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入設定檔並套用命令列覆寫
    pub fn load_scout_config(&self) -> crate::utils::error::Result<ScoutConfig> {
        let mut config = ScoutConfig::load(self.config.as_deref())?;
        if let Some(timeout) = self.timeout {
            config.http.timeout_seconds = timeout;
        }
        Ok(config)
    }
}
