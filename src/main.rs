use anyhow::Context;
use clap::Parser;
use std::io::Write;
use tarot_reader::config::llm::{detect_platform, LlmOverrides};
use tarot_reader::config::meta::{load_meta, OrientationLabels};
use tarot_reader::config::toml_config::TomlConfig;
use tarot_reader::config::ConfigLayer;
use tarot_reader::core::narrative::{card_title, NarrativePipeline};
use tarot_reader::core::session::DrawnReading;
use tarot_reader::core::{SeededRandom, StreamSink};
use tarot_reader::utils::error::ErrorSeverity;
use tarot_reader::utils::{logger, validation::Validate};
use tarot_reader::{
    adapters::report::write_report, AppConfig, CardImages, CatalogCache, CliConfig, LocalStorage,
    OpenAiChatClient, ReadingSession, TarotError,
};

/// 將串流文字直接寫到 stdout
struct ConsoleSink;

impl StreamSink for ConsoleSink {
    fn begin(&mut self, title: &str) {
        println!("\n## {}\n", title);
    }

    fn chunk(&mut self, text: &str) {
        print!("{}", text);
        let _ = std::io::stdout().flush();
    }

    fn end(&mut self) {
        println!();
    }
}

fn exit_code(e: &TarotError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: &TarotError) -> ! {
    tracing::error!(
        "❌ Reading failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    std::process::exit(exit_code(e).max(1));
}

fn resolve_config(cli: &CliConfig) -> tarot_reader::Result<AppConfig> {
    let file = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            TomlConfig::from_file(path)?
        }
        None => TomlConfig::default(),
    };
    file.validate()?;

    let layers = vec![
        ConfigLayer {
            llm: cli.llm_overrides(),
            data: cli.data_overrides(),
            output: cli.output_overrides(),
        },
        ConfigLayer {
            llm: LlmOverrides::from_env()?,
            ..Default::default()
        },
        file.into(),
    ];

    let config = AppConfig::resolve(layers, detect_platform());
    config.validate()?;
    Ok(config)
}

fn print_cards(drawn: &DrawnReading<'_>, labels: &OrientationLabels) {
    println!("# 選ばれたカードの一覧\n");
    for card in drawn.cards() {
        println!("{}", card_title(&card, labels));
    }
    println!("\n(layout: {})", drawn.cross.side.as_str());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!("🔮 Starting tarot-reader");

    let config = resolve_config(&cli).unwrap_or_else(|e| fail(&e));
    tracing::debug!("Resolved config: {:?}", config);
    tracing::info!(
        "LLM: {:?} on {} ({} @ {})",
        config.llm.backend,
        config.llm.platform,
        config.llm.model,
        config.llm.base_url
    );

    let storage = LocalStorage::new(".");
    let mut catalogs = CatalogCache::new();
    let loaded = catalogs.load(&storage, &config.cards_path).await;
    let catalog = loaded.require_cards().unwrap_or_else(|e| fail(&e));
    let labels = load_meta(&storage, &config.meta_path).await;

    let mut session = ReadingSession::new(catalog, cli.questioner()).unwrap_or_else(|e| fail(&e));
    let client = OpenAiChatClient::new(&config.llm);
    if !cli.no_narrative {
        session.translate(&client).await;
    } else if cli.query_ignored() {
        tracing::info!(
            "--no-narrative skips translation, so the query is not used and the significator is drawn at random"
        );
    }

    let mut rng = match cli.seed {
        Some(seed) => SeededRandom::from_seed(seed),
        None => SeededRandom::from_entropy(),
    };
    let drawn = session.draw(&mut rng).unwrap_or_else(|e| fail(&e));
    print_cards(&drawn, &labels);

    let narrative = if cli.no_narrative {
        None
    } else {
        let pipeline = NarrativePipeline::new(&client, labels.clone());
        match pipeline.run(&drawn.reading, &mut ConsoleSink).await {
            Ok(narrative) => Some(narrative),
            Err(e) => fail(&e),
        }
    };

    if config.write_report {
        let output = LocalStorage::new(&config.output_path);
        let images = CardImages::new(&config.images_dir);
        let files = write_report(
            &output,
            &drawn,
            narrative.as_ref(),
            &images,
            &labels,
            chrono::Local::now(),
        )
        .await
        .with_context(|| format!("writing report to {}", config.output_path))?;
        tracing::info!("📁 Report saved to: {}/{}", config.output_path, files.html);
        println!("\n📁 {}/{}", config.output_path, files.html);
    }

    Ok(())
}
