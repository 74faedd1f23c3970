pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalTemplateStore;
pub use config::ScoutConfig;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3TemplateStore};

pub use core::{
    build_aggregator, Appraiser, ListingExtractor, PriceAggregator, TemplateDraft,
    TemplateLibrary,
};
pub use domain::model::{AggregateResult, Marketplace, MarketSummary, ScrapeResponse};
pub use utils::error::{Result, ScoutError};
