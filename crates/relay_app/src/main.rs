mod cli;
mod state_file;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use relay_engine::{
    FetchSettings, HttpFeedSource, LogSink, MastodonClient, MediaResolver, PostDelay, RunOptions,
    Runner,
};
use relay_logging::{relay_info, relay_warn, LogDestination};

use crate::cli::Args;
use crate::state_file::StateFile;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let destination = match &args.log_file {
        Some(path) => LogDestination::TerminalAndFile(path.clone()),
        None => LogDestination::Terminal,
    };
    relay_logging::initialize(destination, args.verbose);

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let path = args.state_path()?;
    let mut file = StateFile::load(&path)?;
    let configs = file.feed_configs();
    if configs.is_empty() {
        relay_warn!("No feeds configured in {}", path.display());
    }
    let mut state = file.run_state()?;

    let settings = FetchSettings {
        request_timeout: Duration::from_secs(args.timeout),
        ..FetchSettings::default()
    };
    let feeds = HttpFeedSource::new(settings.clone()).context("building feed client")?;
    let media = MediaResolver::new(settings.for_media()).context("building media client")?;
    let client =
        MastodonClient::new(&file.credentials(), &settings).context("building Mastodon client")?;

    if args.dry_run {
        relay_info!("Dry run: nothing will be posted");
    } else {
        let account = client
            .verify()
            .await
            .with_context(|| format!("verifying credentials with {}", file.url))?;
        relay_info!("Posting as {}", account);
    }

    let options = RunOptions {
        trial: args.dry_run,
        dedupe: args.dedupe,
        future: args.future_policy(),
        delay: args.delay.then(PostDelay::default),
    };
    let report = Runner::new(&feeds, &client, &LogSink, options)
        .with_media(&media)
        .run(&configs, &mut state)
        .await;

    relay_info!(
        "Processed {} entries: {} posted, {} duplicates, {} failed; {} feeds unreachable",
        report.processed,
        report.published,
        report.duplicates,
        report.failed,
        report.feeds_failed
    );

    if report.should_persist() {
        file.apply(&state);
        file.save(&path)?;
        relay_info!("Saved state to {}", path.display());
    }
    Ok(())
}
