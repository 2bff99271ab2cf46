use relay_logging::{relay_debug, relay_error, relay_info, relay_warn};

use crate::{EventSink, RunEvent};

/// Writes run events to the log. Rendered trial posts go out at info level
/// so a dry run shows what would have been posted.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: RunEvent) {
        match event {
            RunEvent::FeedFetched {
                feed_url,
                items,
                selected,
            } => relay_info!("{}: {} items, {} new", feed_url, items, selected),
            RunEvent::FeedFailed { feed_url, error } => {
                relay_error!("{}: fetch failed: {}", feed_url, error)
            }
            RunEvent::EntryRejected {
                feed_url,
                id,
                reason,
            } => relay_warn!("{}: skipping {}: {}", feed_url, id, reason),
            RunEvent::DuplicateSkipped { url, key } => {
                relay_info!("Skipping duplicate {} ({})", url, key)
            }
            RunEvent::Rendered {
                url,
                text,
                media,
                trial: true,
            } => relay_info!("[dry run] {} with {} attachments:\n{}", url, media, text),
            RunEvent::Rendered { url, text, .. } => {
                relay_debug!("Posting {}:\n{}", url, text)
            }
            RunEvent::Published {
                url,
                post_id,
                media,
            } => relay_info!("Posted {} as {} ({} attachments)", url, post_id, media),
            RunEvent::PublishFailed { url, reason } => {
                relay_error!("Could not post {}: {}", url, reason)
            }
        }
    }
}
