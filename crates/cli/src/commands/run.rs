//! `run` command implementation.

use anyhow::{Context, Result};
use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};

use config_loader::{ConfigLoader, EventerConfig};
use dispatcher::{create_dispatcher, Dispatcher, SinkContext};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::source::BatchReader;
use crate::stats::RunStats;

/// Execute the `run` command
pub async fn run_eventer(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;

    info!(
        sinks = config.sinks.len(),
        cluster = config.cluster_name.as_deref().unwrap_or(""),
        webhook_throttle_ms = config.webhook_throttle_ms,
        "Configuration loaded"
    );

    if let Some(port) = config.metrics_port.filter(|p| *p != 0) {
        observability::init_metrics_only(port)?;
    }

    let context = SinkContext {
        cluster_name: config.cluster_name.clone().unwrap_or_default(),
        webhook_throttle: Duration::from_millis(config.webhook_throttle_ms),
    };
    let dispatcher = create_dispatcher(&config.sinks, context);
    if dispatcher.sink_count() == 0 {
        warn!("No sink could be created, events will only be counted");
    }

    let start = Instant::now();
    let mut stats = RunStats::default();

    info!(input = %args.input, "Reading event batches");
    let result = if args.input == "-" {
        let reader = BatchReader::new(BufReader::new(tokio::io::stdin()));
        pump(reader, &dispatcher, &mut stats, setup_shutdown_signal()).await
    } else {
        let file = tokio::fs::File::open(&args.input)
            .await
            .with_context(|| format!("Failed to open input {}", args.input))?;
        let reader = BatchReader::new(BufReader::new(file));
        pump(reader, &dispatcher, &mut stats, setup_shutdown_signal()).await
    };

    dispatcher.stop().await;

    stats.duration = start.elapsed();
    stats.sinks = dispatcher.metrics();
    info!(
        batches = stats.batches,
        events = stats.events,
        malformed_lines = stats.malformed_lines,
        duration_secs = stats.duration.as_secs_f64(),
        "Run finished"
    );
    stats.print_summary();

    result
}

/// Merge the configuration file, CLI sinks and CLI overrides
fn resolve_config(args: &RunArgs) -> Result<EventerConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EventerConfig::default(),
    };

    config.sinks.extend(args.sinks.iter().cloned());
    if config.sinks.is_empty() {
        return Err(CliError::NoSinks.into());
    }

    if let Some(ref name) = args.cluster_name {
        config.cluster_name = Some(name.clone());
    }
    if let Some(port) = args.metrics_port {
        config.metrics_port = Some(port);
    }

    ConfigLoader::validate(&config).context("Invalid configuration")?;
    Ok(config)
}

fn load_config(path: &Path) -> Result<EventerConfig> {
    info!(config = %path.display(), "Loading configuration");
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }
    ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Feed every parsed batch to the dispatcher until the input ends
///
/// `shutdown` only interrupts the wait for the next line; a batch that is
/// already being dispatched always completes.
async fn pump<R, F>(
    mut reader: BatchReader<R>,
    dispatcher: &Dispatcher,
    stats: &mut RunStats,
    shutdown: F,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        let next = tokio::select! {
            next = reader.next_batch() => next,
            _ = &mut shutdown => {
                warn!("Received shutdown signal, stopping sinks...");
                return Ok(());
            }
        };

        match next {
            Ok(Some(batch)) => {
                let events = batch.len();
                let start = Instant::now();
                dispatcher.export_events(batch).await;
                stats.record_batch(events, start.elapsed());
            }
            Ok(None) => return Ok(()),
            Err(e @ CliError::InvalidInput { .. }) => {
                stats.malformed_lines += 1;
                warn!(error = %e, "Skipping malformed input line");
            }
            Err(e) => return Err(e).context("Failed to read input"),
        }
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            sinks: Vec::new(),
            cluster_name: None,
            input: "-".to_string(),
            metrics_port: None,
        }
    }

    #[test]
    fn test_resolve_requires_sinks() {
        let err = resolve_config(&args()).unwrap_err();
        assert!(err.to_string().contains("No sinks configured"));
    }

    #[test]
    fn test_resolve_merges_file_and_flags() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "cluster_name = \"from-file\"\nsinks = [\"log\"]\nwebhook_throttle_ms = 10"
        )
        .unwrap();

        let mut args = args();
        args.config = Some(file.path().to_path_buf());
        args.sinks = vec!["webhook://example.com/hook".to_string()];
        args.cluster_name = Some("from-flag".to_string());

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.sinks, vec!["log", "webhook://example.com/hook"]);
        assert_eq!(config.cluster_name.as_deref(), Some("from-flag"));
        assert_eq!(config.webhook_throttle_ms, 10);
    }

    #[test]
    fn test_resolve_missing_config_file() {
        let mut args = args();
        args.config = Some("/nonexistent/eventer.toml".into());
        let err = resolve_config(&args).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_pump_counts_batches_and_malformed_lines() {
        let input = "{\"namespace\":\"a\"}\noops\n{\"timestamp\":\"2024-05-01T10:00:00Z\",\"events\":[{},{}]}\n";
        let dispatcher = create_dispatcher(&["log"], SinkContext::default());
        let mut stats = RunStats::default();

        pump(
            BatchReader::new(input.as_bytes()),
            &dispatcher,
            &mut stats,
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(stats.batches, 2);
        assert_eq!(stats.events, 3);
        assert_eq!(stats.malformed_lines, 1);
        assert_eq!(dispatcher.metrics()[0].1.event_count, 3);
    }

    #[tokio::test]
    async fn test_shutdown_lets_current_batch_finish() {
        // refused connection, then a 200ms pause after the send attempt
        let dispatcher = create_dispatcher(
            &["webhook://127.0.0.1:1/hook"],
            SinkContext {
                cluster_name: "test".to_string(),
                webhook_throttle: Duration::from_millis(200),
            },
        );
        let mut stats = RunStats::default();
        let input = "{\"type\":\"Warning\",\"namespace\":\"default\"}\n";

        let start = Instant::now();
        pump(
            BatchReader::new(input.as_bytes()),
            &dispatcher,
            &mut stats,
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await
        .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(200));
        assert_eq!(stats.batches, 1);
        assert_eq!(dispatcher.metrics()[0].1.batch_count, 1);
        dispatcher.stop().await;
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_waiting_for_input() {
        let dispatcher = create_dispatcher(&["log"], SinkContext::default());
        let mut stats = RunStats::default();
        // writer half stays open, so the reader would wait forever
        let (_writer, reader) = tokio::io::duplex(64);

        pump(
            BatchReader::new(BufReader::new(reader)),
            &dispatcher,
            &mut stats,
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await
        .unwrap();

        assert_eq!(stats.batches, 0);
    }
}
