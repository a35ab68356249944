use clap::Parser;
use news_etl::config::{Settings, StorageBackend};
use news_etl::utils::{logger, validation::Validate};
use news_etl::{build_news_pipeline, CliArgs, EtlError, TaskFilter, TaskSequence};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 不存在也沒關係
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    // guards 要活到 main 結束，不然檔案 log 會掉
    let _log_guards = logger::init_pipeline_logger(args.verbose, args.json_logs, &settings.logging.dir)?;

    tracing::info!("🚀 Starting news-etl");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let execution_id = args
        .execution_id
        .clone()
        .unwrap_or_else(|| format!("run_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")));

    let filter = TaskFilter {
        only: trimmed(&args.only),
        skip: trimmed(&args.skip),
    };

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No task will be executed");
        if let Err(e) = filter.validate() {
            eprintln!("❌ {}", e);
            std::process::exit(e.exit_code());
        }
        print_plan(&settings, &filter, &execution_id);
        return Ok(());
    }

    let sequence = match build_news_pipeline(&settings, execution_id, &filter) {
        Ok(sequence) => sequence,
        Err(e) => fail(&e),
    };

    match sequence.execute_all().await {
        Ok(results) => {
            let summary = TaskSequence::get_execution_summary(&results);
            tracing::info!("🎉 Pipeline completed: {:?}", summary);

            println!("✅ Pipeline completed successfully!");
            println!("🆔 Execution ID: {}", sequence.execution_id());
            for result in &results {
                println!(
                    "  • {} ({} attempt(s), {:?}): {}",
                    result.task_name, result.attempts, result.duration, result.output
                );
            }
        }
        Err(e) => fail(&e),
    }

    Ok(())
}

fn load_settings(args: &CliArgs) -> news_etl::Result<Settings> {
    let mut settings = Settings::load(args.config.as_deref())?;

    if let Some(retries) = args.retries {
        settings.retry.retries = retries;
    }
    if let Some(delay) = args.retry_delay_secs {
        settings.retry.delay_seconds = delay;
    }
    if let Some(dir) = &args.log_dir {
        settings.logging.dir = dir.clone();
    }

    settings.validate()?;
    Ok(settings)
}

fn trimmed(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

fn fail(e: &EtlError) -> ! {
    tracing::error!(
        "❌ Pipeline failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e);
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code())
}

fn print_plan(settings: &Settings, filter: &TaskFilter, execution_id: &str) {
    let store = match settings.storage.backend {
        StorageBackend::S3 => format!(
            "s3://{}",
            settings.storage.bucket.as_deref().unwrap_or("<unset>")
        ),
        StorageBackend::Fs => format!("file://{}", settings.storage.fs_root.display()),
    };

    println!("📋 Pipeline Plan:");
    println!("  Execution ID: {}", execution_id);
    println!(
        "  Retry: {} retries, {}s delay",
        settings.retry.retries, settings.retry.delay_seconds
    );
    println!();
    for (index, name) in filter.selected().iter().enumerate() {
        println!("  {}. {}", index + 1, name);
        match *name {
            news_etl::app::FETCH_AND_UPLOAD_TASK => {
                println!("     📡 Source: {}", settings.news.base_url);
                println!("     ☁️ Target: {}/{}", store, settings.storage.prefix);
            }
            news_etl::app::DOWNLOAD_LATEST_TASK => {
                println!("     ☁️ Source: {}/{}", store, settings.storage.prefix);
                println!("     📁 Target: {}", settings.download.local_dir.display());
            }
            news_etl::app::LOAD_TABLE_TASK => {
                println!("     📁 Source: {}", settings.load.csv_path.display());
                println!(
                    "     🗄️ Target: {} table {}",
                    settings.postgres.redacted_target(),
                    settings.load.table
                );
            }
            _ => {}
        }
    }
}
