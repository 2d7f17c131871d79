//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{EventerConfig, SinkDescriptor};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkStatus>,
}

/// Per-descriptor status
#[derive(Debug, Serialize)]
struct SinkStatus {
    descriptor: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    sink_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            sinks: Vec::new(),
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let sinks = check_sinks(&config);
            ValidationResult {
                valid: sinks.iter().all(|s| s.valid),
                config_path,
                error: None,
                sinks,
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            sinks: Vec::new(),
        },
    }
}

/// Parse every descriptor and look its type up in the registry
fn check_sinks(config: &EventerConfig) -> Vec<SinkStatus> {
    config
        .sinks
        .iter()
        .map(|raw| match SinkDescriptor::parse(raw) {
            Ok(descriptor) if dispatcher::is_registered(&descriptor.type_tag) => SinkStatus {
                descriptor: raw.clone(),
                valid: true,
                sink_type: Some(descriptor.type_tag),
                error: None,
            },
            Ok(descriptor) => SinkStatus {
                descriptor: raw.clone(),
                valid: false,
                error: Some(format!(
                    "sink not recognized: {} (known: {})",
                    descriptor.type_tag,
                    dispatcher::registered_types().join(", ")
                )),
                sink_type: Some(descriptor.type_tag),
            },
            Err(e) => SinkStatus {
                descriptor: raw.clone(),
                valid: false,
                sink_type: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }

    if !result.sinks.is_empty() {
        println!("\n  Sinks ({}):", result.sinks.len());
        for sink in &result.sinks {
            let mark = if sink.valid { "✓" } else { "✗" };
            match &sink.error {
                Some(error) => println!("  {} {} - {}", mark, sink.descriptor, error),
                None => println!("  {} {}", mark, sink.descriptor),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[cfg(feature = "rdkafka")]
    #[test]
    fn test_validate_all_registered() {
        let file = write_config(
            r#"sinks = ["log", "webhook://example.com/hook?level=Warning", "kafka:?brokers=localhost:9092"]"#,
        );
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });

        assert!(result.valid);
        let types: Vec<_> = result
            .sinks
            .iter()
            .map(|s| s.sink_type.as_deref().unwrap())
            .collect();
        assert_eq!(types, vec!["log", "webhook", "kafka"]);
    }

    #[test]
    fn test_validate_reports_each_bad_entry() {
        let file = write_config(r#"sinks = ["log", "influxdb://localhost:8086", "://broken"]"#);
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        });

        assert!(!result.valid);
        assert!(result.sinks[0].valid);
        assert!(!result.sinks[1].valid);
        assert!(result.sinks[1]
            .error
            .as_deref()
            .unwrap()
            .contains("sink not recognized: influxdb"));
        assert!(!result.sinks[2].valid);
        assert!(result.sinks[2].sink_type.is_none());
    }

    #[cfg(not(feature = "rdkafka"))]
    #[test]
    fn test_validate_rejects_kafka_without_client() {
        let file = write_config(r#"sinks = ["kafka:?brokers=localhost:9092"]"#);
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        });
        assert!(!result.valid);
    }

    #[test]
    fn test_validate_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/eventer.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
