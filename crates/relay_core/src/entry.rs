use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{render, truncate_chars, DedupeField, TemplateError, MAX_POST_CHARS};

/// Placeholders available to post templates.
pub const TEMPLATE_FIELDS: &[&str] = &[
    "url", "link", "title", "summary", "content", "hashtags", "updated",
];

/// A normalized, publishable entry.
///
/// `M` is the media handle type. Handles are owned by the entry for one
/// publish attempt; dropping the entry releases whatever they hold.
#[derive(Debug)]
pub struct Entry<M> {
    /// Canonical identifier: the item id unless a source rule substituted a link.
    pub url: String,
    /// Feed-declared permalink.
    pub link: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    /// Space-joined `#tags`.
    pub hashtags: String,
    pub images: Vec<M>,
    pub updated: DateTime<Utc>,
}

impl<M> Entry<M> {
    /// Text value of a dedup key field.
    pub fn field(&self, field: DedupeField) -> &str {
        match field {
            DedupeField::Url => &self.url,
            DedupeField::Link => &self.link,
            DedupeField::Title => &self.title,
            DedupeField::Summary => &self.summary,
            DedupeField::Content => &self.content,
            DedupeField::Hashtags => &self.hashtags,
        }
    }

    /// Value for a template placeholder, if `name` is one.
    pub fn template_value(&self, name: &str) -> Option<Cow<'_, str>> {
        let value = match name {
            "url" => Cow::Borrowed(self.url.as_str()),
            "link" => Cow::Borrowed(self.link.as_str()),
            "title" => Cow::Borrowed(self.title.as_str()),
            "summary" => Cow::Borrowed(self.summary.as_str()),
            "content" => Cow::Borrowed(self.content.as_str()),
            "hashtags" => Cow::Borrowed(self.hashtags.as_str()),
            "updated" => Cow::Owned(self.updated.to_rfc3339_opts(SecondsFormat::Secs, true)),
            _ => return None,
        };
        Some(value)
    }

    /// Render the post text for this entry, truncated to [`MAX_POST_CHARS`].
    pub fn render_post(&self, template: &str) -> Result<String, TemplateError> {
        let rendered = render(template, |name| {
            self.template_value(name).map(Cow::into_owned)
        })?;
        Ok(truncate_chars(&rendered, MAX_POST_CHARS).to_string())
    }

    /// Detach the media handles, leaving the entry without images.
    pub fn take_images(&mut self) -> Vec<M> {
        std::mem::take(&mut self.images)
    }
}
