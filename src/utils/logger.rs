use crate::utils::error::{EtlError, Result};
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

/// A named log file and the module targets routed into it.
pub struct LogComponent {
    pub file_name: &'static str,
    pub targets: &'static [&'static str],
}

pub const LOG_COMPONENTS: &[LogComponent] = &[
    LogComponent {
        file_name: "fetch_news.log",
        targets: &["news_etl::adapters::news_api", "news_etl::app::fetch_upload"],
    },
    LogComponent {
        file_name: "object_store.log",
        targets: &[
            "news_etl::adapters::object_store",
            "news_etl::app::download_latest",
        ],
    },
    LogComponent {
        file_name: "load_postgres.log",
        targets: &["news_etl::adapters::postgres", "news_etl::app::load_table"],
    },
    // 整個 run 的完整紀錄
    LogComponent {
        file_name: "pipeline.log",
        targets: &["news_etl"],
    },
];

/// Keeps the non-blocking file writers alive; drop it only at process exit.
#[must_use]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Console layer plus one file layer per [`LOG_COMPONENTS`] entry.
pub type PipelineSubscriber = Layered<Vec<BoxedLayer>, Registry>;

pub fn init_pipeline_logger(verbose: bool, json: bool, log_dir: &Path) -> Result<LogGuards> {
    let (subscriber, guards) = build_pipeline_subscriber(verbose, json, log_dir)?;

    subscriber.try_init().map_err(|e| EtlError::Unexpected {
        message: format!("Failed to install tracing subscriber: {}", e),
    })?;

    Ok(guards)
}

/// Builds the subscriber without installing it.
pub fn build_pipeline_subscriber(
    verbose: bool,
    json: bool,
    log_dir: &Path,
) -> Result<(PipelineSubscriber, LogGuards)> {
    std::fs::create_dir_all(log_dir)?;

    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("news_etl=debug,info")
        } else {
            EnvFilter::new("news_etl=info,warn")
        }
    });

    let console_layer = if json {
        fmt::layer()
            .with_target(false)
            .json()
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_filter(console_filter)
            .boxed()
    };

    let mut layers: Vec<BoxedLayer> = vec![console_layer];
    let mut guards = Vec::with_capacity(LOG_COMPONENTS.len());

    for component in LOG_COMPONENTS {
        let appender = tracing_appender::rolling::never(log_dir, component.file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);

        let targets = component
            .targets
            .iter()
            .fold(Targets::new(), |t, target| t.with_target(*target, level));

        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .with_filter(targets)
                .boxed(),
        );
    }

    Ok((
        tracing_subscriber::registry().with(layers),
        LogGuards { _guards: guards },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_component_has_a_distinct_log_file() {
        let mut names: Vec<&str> = LOG_COMPONENTS.iter().map(|c| c.file_name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), LOG_COMPONENTS.len());
        assert!(LOG_COMPONENTS.iter().all(|c| !c.targets.is_empty()));
    }

    #[test]
    fn test_events_are_routed_by_target() {
        let dir = tempfile::TempDir::new().unwrap();
        let (subscriber, guards) = build_pipeline_subscriber(false, false, dir.path()).unwrap();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "news_etl::adapters::postgres", "loaded 2 rows into news_cleaned");
            tracing::debug!(target: "news_etl::adapters::postgres", "below info threshold");
        });
        // flush the non-blocking writers
        drop(guards);

        let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap_or_default();

        let load_log = read("load_postgres.log");
        assert!(load_log.contains("loaded 2 rows into news_cleaned"));
        assert!(!load_log.contains("below info threshold"));
        assert!(read("pipeline.log").contains("loaded 2 rows into news_cleaned"));
        assert!(!read("fetch_news.log").contains("loaded 2 rows"));
        assert!(!read("object_store.log").contains("loaded 2 rows"));
    }
}
