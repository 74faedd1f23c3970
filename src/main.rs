use clap::Parser;
use price_scout::adapters::{HttpFetcher, OpenAiVisionClassifier};
use price_scout::config::{Command, TemplateCommand};
use price_scout::utils::error::{ErrorSeverity, Result};
use price_scout::utils::validation::{require_input, Validate};
use price_scout::utils::logger;
use price_scout::{
    Appraiser, CliConfig, ListingExtractor, LocalTemplateStore, PriceAggregator, ScoutConfig,
    TemplateDraft, TemplateLibrary,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting price-scout CLI");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: CliConfig) -> Result<()> {
    let config = cli.load_scout_config()?;
    config.validate()?;
    let fetcher = Arc::new(HttpFetcher::new(&config)?);

    match cli.command {
        Command::Prices { query } => {
            let query = require_input("query", &query)?;
            let aggregator = PriceAggregator::from_config(&config, fetcher);
            print_json(&aggregator.aggregate(&query).await)
        }
        Command::Analyze {
            image,
            mime,
            no_prices,
        } => {
            let bytes = std::fs::read(&image)?;
            let mime = mime.unwrap_or_else(|| guess_mime(&image).to_string());
            let classifier = Arc::new(OpenAiVisionClassifier::new(fetcher.client().clone(), &config));
            let aggregator = Arc::new(PriceAggregator::from_config(&config, fetcher));
            let appraiser = Appraiser::new(classifier, aggregator);

            if no_prices {
                print_json(&appraiser.identify(&bytes, &mime).await)
            } else {
                print_json(&appraiser.appraise(&bytes, &mime).await)
            }
        }
        Command::Scrape { urls } => {
            let extractor = ListingExtractor::from_config(&config, fetcher);
            print_json(&extractor.scrape(&urls).await?)
        }
        Command::Templates(command) => run_templates(&config, fetcher, command).await,
    }
}

async fn run_templates(
    config: &ScoutConfig,
    fetcher: Arc<HttpFetcher>,
    command: TemplateCommand,
) -> Result<()> {
    let library = TemplateLibrary::new(LocalTemplateStore::new(&config.templates.path));
    tracing::debug!("Template store: {}", library.store().path().display());

    match command {
        TemplateCommand::List => print_json(&library.list().await?),
        TemplateCommand::Show { id } => print_json(&library.get(&id).await?),
        TemplateCommand::Add {
            category,
            title,
            description,
        } => print_json(
            &library
                .create(TemplateDraft::new(category, title, description))
                .await?,
        ),
        TemplateCommand::Update {
            id,
            category,
            title,
            description,
        } => print_json(
            &library
                .update(&id, TemplateDraft::new(category, title, description))
                .await?,
        ),
        TemplateCommand::Remove { id } => {
            library.delete(&id).await?;
            println!("✅ Removed template {}", id);
            Ok(())
        }
        TemplateCommand::Learn { category, urls } => {
            let extractor = ListingExtractor::from_config(config, fetcher);
            print_json(&library.learn(&extractor, &category, &urls).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn guess_mime(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}
