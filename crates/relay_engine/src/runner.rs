use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use relay_core::{select, DedupeField, FuturePolicy, RunState, SourceProfile};
use relay_logging::{relay_debug, relay_info};

use crate::translate::translate;
use crate::{
    EventSink, FeedSource, MediaResolver, Platform, Publisher, RunEvent, RunReport,
};

/// One configured feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub url: String,
    pub template: String,
    pub include_images: bool,
    /// Overrides the feed's own generator for source detection.
    pub generator: Option<String>,
}

/// Bounds of the randomized pause between two posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostDelay {
    pub min: Duration,
    pub max: Duration,
}

impl Default for PostDelay {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(10),
            max: Duration::from_secs(30),
        }
    }
}

impl PostDelay {
    pub fn pick(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Render only; nothing is posted and the state is left alone.
    pub trial: bool,
    pub dedupe: Option<DedupeField>,
    pub future: FuturePolicy,
    pub delay: Option<PostDelay>,
}

/// Drives one pass over all configured feeds.
pub struct Runner<'a> {
    feeds: &'a dyn FeedSource,
    platform: &'a dyn Platform,
    media: Option<&'a MediaResolver>,
    sink: &'a dyn EventSink,
    options: RunOptions,
}

impl<'a> Runner<'a> {
    pub fn new(
        feeds: &'a dyn FeedSource,
        platform: &'a dyn Platform,
        sink: &'a dyn EventSink,
        options: RunOptions,
    ) -> Self {
        Self {
            feeds,
            platform,
            media: None,
            sink,
            options,
        }
    }

    /// Resolver used for feeds with `include_images`. Without one, no media
    /// is ever fetched.
    pub fn with_media(mut self, media: &'a MediaResolver) -> Self {
        self.media = Some(media);
        self
    }

    pub async fn run(&self, configs: &[FeedConfig], state: &mut RunState) -> RunReport {
        self.run_at(configs, state, Utc::now()).await
    }

    /// Like [`Runner::run`] with an explicit "now" for the future-date check.
    pub async fn run_at(
        &self,
        configs: &[FeedConfig],
        state: &mut RunState,
        now: DateTime<Utc>,
    ) -> RunReport {
        let watermark = state.watermark();
        let mut report = RunReport {
            trial: self.options.trial,
            ..RunReport::default()
        };
        let mut posted_before = false;

        for config in configs {
            let feed = match self.feeds.fetch(&config.url).await {
                Ok(feed) => feed,
                Err(error) => {
                    report.feeds_failed += 1;
                    self.sink.emit(RunEvent::FeedFailed {
                        feed_url: config.url.clone(),
                        error,
                    });
                    continue;
                }
            };

            let profile =
                SourceProfile::resolve(config.generator.as_deref(), feed.generator.as_deref());
            let total = feed.items.len();
            let selection = select(feed.items, watermark, self.options.future, now);
            relay_debug!("{} detected as {} source", config.url, profile);
            self.sink.emit(RunEvent::FeedFetched {
                feed_url: config.url.clone(),
                items: total,
                selected: selection.items.len(),
            });
            for rejected in selection.rejected {
                self.sink.emit(RunEvent::EntryRejected {
                    feed_url: config.url.clone(),
                    id: rejected.id,
                    reason: rejected.error.to_string(),
                });
            }

            let media = if config.include_images { self.media } else { None };
            for dated in selection.items {
                let mut entry = translate(&dated, profile);
                report.processed += 1;
                report.newest = report.newest.max(Some(entry.updated));

                let key = self
                    .options
                    .dedupe
                    .map(|field| entry.field(field).to_string());
                if let Some(key) = &key {
                    if state.dedupe().contains(key) {
                        report.duplicates += 1;
                        self.sink.emit(RunEvent::DuplicateSkipped {
                            url: entry.url.clone(),
                            key: key.clone(),
                        });
                        continue;
                    }
                }

                // Pause before media is fetched: a resolved download must not
                // sit open past the request timeout.
                if !self.options.trial && posted_before {
                    if let Some(delay) = self.options.delay {
                        let pause = delay.pick();
                        relay_info!("Waiting {}s before the next post", pause.as_secs());
                        tokio::time::sleep(pause).await;
                    }
                }
                if let Some(resolver) = media {
                    entry.images = resolver.discover(&dated.item, profile).await;
                }

                if self.options.trial {
                    match entry.render_post(&config.template) {
                        Ok(text) => self.sink.emit(RunEvent::Rendered {
                            url: entry.url.clone(),
                            text,
                            media: entry.images.len(),
                            trial: true,
                        }),
                        Err(err) => {
                            report.failed += 1;
                            self.sink.emit(RunEvent::PublishFailed {
                                url: entry.url.clone(),
                                reason: err.to_string(),
                            });
                        }
                    }
                    continue;
                }

                let url = entry.url.clone();
                match Publisher::new(self.platform).publish(entry, &config.template).await {
                    Ok(publication) => {
                        posted_before = true;
                        report.published += 1;
                        if let Some(key) = key {
                            state.dedupe_mut().record(key);
                        }
                        self.sink.emit(RunEvent::Rendered {
                            url: url.clone(),
                            text: publication.text,
                            media: publication.media,
                            trial: false,
                        });
                        self.sink.emit(RunEvent::Published {
                            url,
                            post_id: publication.post_id.to_string(),
                            media: publication.media,
                        });
                    }
                    Err(err) => {
                        report.failed += 1;
                        self.sink.emit(RunEvent::PublishFailed {
                            url,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }

        if !self.options.trial {
            if let Some(newest) = report.newest {
                state.advance_watermark(newest);
            }
        }
        report
    }
}
