use chrono::{DateTime, Utc};

use crate::{parse_timestamp, RawItem, TimestampError, MIN_TIMESTAMP};

/// What to do with entries dated after the current instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FuturePolicy {
    /// Treat future-dated entries like any other.
    #[default]
    Keep,
    /// Drop them before the watermark comparison; they are picked up by a
    /// later run once their date has passed.
    Skip,
}

/// A raw item together with its parsed `updated` timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedItem {
    pub updated: DateTime<Utc>,
    pub item: RawItem,
}

/// An item dropped because its timestamp could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedItem {
    pub id: String,
    pub error: TimestampError,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    /// Items newer than the watermark, oldest first.
    pub items: Vec<DatedItem>,
    pub rejected: Vec<RejectedItem>,
}

/// Select the items newer than `watermark`, ordered oldest first.
///
/// With [`FuturePolicy::Skip`], items dated after `now` are discarded before
/// the watermark comparison. Items whose timestamp cannot be parsed are
/// reported in [`Selection::rejected`] and never selected. The sort is stable,
/// so items sharing a timestamp keep their feed order.
pub fn select(
    items: Vec<RawItem>,
    watermark: DateTime<Utc>,
    policy: FuturePolicy,
    now: DateTime<Utc>,
) -> Selection {
    let mut selection = Selection::default();

    for item in items {
        let parsed = match item.updated.as_deref() {
            Some(raw) => parse_timestamp(raw),
            None => Err(TimestampError::Missing),
        };
        let updated = match parsed {
            Ok(updated) => updated,
            Err(error) => {
                selection.rejected.push(RejectedItem {
                    id: item.id.clone(),
                    error,
                });
                continue;
            }
        };

        if policy == FuturePolicy::Skip && updated > now {
            continue;
        }
        if watermark != MIN_TIMESTAMP && updated <= watermark {
            continue;
        }
        selection.items.push(DatedItem { updated, item });
    }

    selection.items.sort_by_key(|dated| dated.updated);
    selection
}
