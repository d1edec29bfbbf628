use std::path::PathBuf;

use chrono::{Duration, Utc};

mod app;
mod config;
mod db;
mod error;
mod models;
mod transform;

use app::BatchParams;
use config::Config;
use db::ExtractStrategy;
use error::{AppError, Result};

struct Options {
    config_path: PathBuf,
    profile: String,
    window_hours: i64,
    strategy: ExtractStrategy,
    backfill: bool,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self> {
        let mut options = Self {
            config_path: PathBuf::from("warehouse_sync.toml"),
            profile: "default".to_string(),
            window_hours: 1,
            strategy: ExtractStrategy::Union,
            backfill: false,
        };

        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => {
                    options.config_path = PathBuf::from(expect_value(&mut iter, "--config")?);
                }
                "--profile" => {
                    options.profile = expect_value(&mut iter, "--profile")?;
                }
                "--window-hours" => {
                    let value = expect_value(&mut iter, "--window-hours")?;
                    options.window_hours = value.parse().map_err(|_| {
                        AppError::Config(format!("invalid --window-hours value '{value}'"))
                    })?;
                }
                "--strategy" => {
                    options.strategy = expect_value(&mut iter, "--strategy")?.parse()?;
                }
                "--backfill" => options.backfill = true,
                other => {
                    return Err(AppError::Config(format!("unknown argument '{other}'")));
                }
            }
        }
        Ok(options)
    }
}

fn expect_value<'a, I: Iterator<Item = &'a String>>(
    iter: &mut I,
    flag: &str,
) -> Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| AppError::Config(format!("{flag} requires a value")))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let options = Options::parse(&args)?;

    if options.window_hours <= 0 {
        return Err(anyhow::anyhow!("--window-hours must be positive").into());
    }

    let config = Config::load(&options.config_path)?;
    let profile = config.profile(&options.profile)?;

    if options.backfill {
        let summary = app::run_backfill(profile).await?;
        println!(
            "Backfilled {} articles ({} word-count rows)",
            summary.extracted, summary.word_count_rows
        );
        return Ok(());
    }

    let params = BatchParams {
        since: Utc::now() - Duration::hours(options.window_hours),
        strategy: options.strategy,
    };
    let summary = app::run_batch(profile, &params).await?;
    println!(
        "Synced {} articles ({} word-count rows, {} deleted)",
        summary.extracted, summary.word_count_rows, summary.deleted
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("warehouse-sync")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn defaults_cover_the_hourly_incremental_case() {
        let options = Options::parse(&args(&[])).unwrap();
        assert_eq!(options.profile, "default");
        assert_eq!(options.window_hours, 1);
        assert_eq!(options.strategy, ExtractStrategy::Union);
        assert!(!options.backfill);
    }

    #[test]
    fn flags_override_defaults() {
        let options = Options::parse(&args(&[
            "--config",
            "/etc/sync.toml",
            "--profile",
            "staging",
            "--window-hours",
            "6",
            "--strategy",
            "flag",
            "--backfill",
        ]))
        .unwrap();
        assert_eq!(options.config_path, PathBuf::from("/etc/sync.toml"));
        assert_eq!(options.profile, "staging");
        assert_eq!(options.window_hours, 6);
        assert_eq!(options.strategy, ExtractStrategy::DeletedFlag);
        assert!(options.backfill);
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        assert!(Options::parse(&args(&["--bogus"])).is_err());
        assert!(Options::parse(&args(&["--strategy", "magic"])).is_err());
        assert!(Options::parse(&args(&["--window-hours", "soon"])).is_err());
    }
}
