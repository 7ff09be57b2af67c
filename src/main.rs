use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use sparkle_json::config::DEFAULT_OUTPUT;
use sparkle_json::content::FailurePolicy;
use sparkle_json::{convert, FailureKind, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "sparkle-json",
    about = "Convert a Sparkle appcast into JSON, filling empty release notes from their links"
)]
struct Args {
    /// Appcast XML file to convert
    #[arg(value_name = "FEED")]
    feed: Option<PathBuf>,

    /// Where to write the JSON
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Give up on a release-notes request after this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Number of release-notes requests to run at once
    #[arg(long, value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=64))]
    concurrency: u64,

    /// Leave a description empty when its notes cannot be fetched instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// Include delta updates in the output
    #[arg(long)]
    include_deltas: bool,

    /// Write <, > and & literally instead of as \u escapes
    #[arg(long)]
    no_html_escape: bool,
}

impl Args {
    fn into_settings(self, feed: PathBuf) -> Settings {
        let mut settings = Settings::new(feed);
        settings.output = self.output;
        settings.request_timeout = self.timeout.map(Duration::from_secs);
        settings.concurrency = self.concurrency as usize;
        settings.failure_policy = if self.keep_going {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Abort
        };
        settings.include_deltas = self.include_deltas;
        settings.escape_html = !self.no_html_escape;
        settings
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = Args::parse();

    let Some(feed) = args.feed.take() else {
        println!("{}", Args::command().render_usage());
        return ExitCode::from(FailureKind::ArgumentMissing.exit_code());
    };

    let settings = args.into_settings(feed);
    tracing::debug!(?settings, "Starting conversion");

    match convert(&settings).await {
        Ok(summary) => {
            println!(
                "Wrote {} items from '{}' to {} ({} release notes fetched)",
                summary.items,
                summary.feed_title,
                settings.output.display(),
                summary.enrichment.fetched
            );
            for failure in &summary.enrichment.failures {
                println!(
                    "Warning: no release notes for '{}': {}",
                    failure.title, failure.error
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("Error: {:#}", err);
            ExitCode::from(FailureKind::of(&err).exit_code())
        }
    }
}
