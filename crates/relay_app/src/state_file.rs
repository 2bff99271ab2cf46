//! The RON state file: account credentials, feed list and run state.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use relay_core::{parse_timestamp, render, RunState, TEMPLATE_FIELDS};
use relay_engine::{AtomicFileWriter, Credentials, FeedConfig};
use relay_logging::{relay_info, relay_warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub url: String,
    pub template: String,
    /// Falls back to the file-wide `include_images` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_images: Option<bool>,
    /// Source profile override, e.g. `"wordpress"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub include_images: bool,
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
    /// Watermark of the last run; absent until something was processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default)]
    pub dedupe: Vec<String>,
}

impl StateFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading state file {}", path.display()))?;
        let file: StateFile = ron::from_str(&content)
            .with_context(|| format!("parsing state file {}", path.display()))?;
        relay_info!(
            "Loaded {} feeds from {}",
            file.feeds.len(),
            path.display()
        );
        file.warn_about_templates();
        Ok(file)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())
            .context("serializing state")?;
        AtomicFileWriter::new(path.to_path_buf())
            .write(&content)
            .with_context(|| format!("writing state file {}", path.display()))
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            instance_url: self.url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            access_token: self.access_token.clone(),
        }
    }

    pub fn feed_configs(&self) -> Vec<FeedConfig> {
        self.feeds
            .iter()
            .map(|feed| FeedConfig {
                url: feed.url.clone(),
                template: feed.template.clone(),
                include_images: feed.include_images.unwrap_or(self.include_images),
                generator: feed.generator.clone(),
            })
            .collect()
    }

    pub fn run_state(&self) -> Result<RunState> {
        let watermark = self
            .updated
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .context("state file has an unreadable `updated` timestamp")?;
        Ok(RunState::new(watermark, self.dedupe.clone()))
    }

    /// Copy the run state back for saving.
    pub fn apply(&mut self, state: &RunState) {
        self.updated = state
            .persisted_watermark()
            .map(|watermark| watermark.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        self.dedupe = state.dedupe().keys().map(str::to_string).collect();
    }

    /// Templates are checked again per entry; this only surfaces typos early.
    fn warn_about_templates(&self) {
        for feed in &self.feeds {
            let probe = render(&feed.template, |name| {
                TEMPLATE_FIELDS.contains(&name).then(String::new)
            });
            if let Err(err) = probe {
                relay_warn!("Template for {} will not render: {}", feed.url, err);
            }
        }
    }
}
