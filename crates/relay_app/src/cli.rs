use std::path::PathBuf;

use clap::Parser;
use relay_core::{DedupeField, FuturePolicy};

const DEFAULT_STATE_FILE: &str = ".feedrelay";

/// Republish new feed entries to a Mastodon account.
#[derive(Debug, Parser)]
#[command(name = "feedrelay", version, about)]
pub struct Args {
    /// Render posts without publishing or updating the state file.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Log debug output.
    #[arg(short, long)]
    pub verbose: bool,

    /// State file (default: ~/.feedrelay).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Pause a random 10 to 30 seconds between posts.
    #[arg(long)]
    pub delay: bool,

    /// Skip entries whose FIELD was already posted
    /// (url, link, title, summary, content, hashtags).
    #[arg(long, value_name = "FIELD")]
    pub dedupe: Option<DedupeField>,

    /// Leave entries dated in the future for a later run.
    #[arg(long)]
    pub skip_future: bool,

    /// Request timeout for feed and media downloads.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Also append log output to FILE.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn state_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.config {
            return Ok(path.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("no home directory; pass --config"))?;
        Ok(home.join(DEFAULT_STATE_FILE))
    }

    pub fn future_policy(&self) -> FuturePolicy {
        if self.skip_future {
            FuturePolicy::Skip
        } else {
            FuturePolicy::Keep
        }
    }
}
