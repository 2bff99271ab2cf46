use relay_core::TemplateError;
use relay_logging::{relay_debug, relay_warn};
use thiserror::Error;

use crate::{Entry, MediaId, MediaResource, Platform, PlatformError, PostId};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("template error: {0}")]
    Render(#[from] TemplateError),
    #[error("post rejected: {0}")]
    Post(#[from] PlatformError),
}

/// Outcome of a successful publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub post_id: PostId,
    pub text: String,
    /// Attachments that made it onto the post.
    pub media: usize,
}

pub struct Publisher<'a> {
    platform: &'a dyn Platform,
}

impl<'a> Publisher<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self { platform }
    }

    /// Render, upload media and post one entry.
    ///
    /// A failed download or upload drops that attachment only. The entry is
    /// consumed; any media it still holds is released on every exit path.
    pub async fn publish(
        &self,
        mut entry: Entry,
        template: &str,
    ) -> Result<Publication, PublishError> {
        let text = entry.render_post(template)?;
        let media_ids = self.upload_all(entry.take_images()).await;
        let post_id = self.platform.post(&text, &media_ids).await?;
        Ok(Publication {
            post_id,
            text,
            media: media_ids.len(),
        })
    }

    async fn upload_all(&self, images: Vec<MediaResource>) -> Vec<MediaId> {
        let mut media_ids = Vec::with_capacity(images.len());
        for image in images {
            let url = image.url().to_string();
            let content_type = image.content_type().to_string();
            let bytes = match image.into_bytes().await {
                Ok(bytes) => bytes,
                Err(err) => {
                    relay_warn!("Dropping attachment {}: {}", url, err);
                    continue;
                }
            };
            match self.platform.upload_media(bytes, &content_type).await {
                Ok(id) => {
                    relay_debug!("Uploaded {} as media {}", url, id.0);
                    media_ids.push(id);
                }
                Err(err) => relay_warn!("Upload of {} failed: {}", url, err),
            }
        }
        media_ids
    }
}
