use relay_core::{hashtags, DatedItem, RawItem, SourceProfile};

use crate::normalize::{clean, CleanRules};
use crate::Entry;

/// Turn a dated raw item into a normalized [`Entry`] without media.
///
/// Images are attached by the runner right before publishing.
pub fn translate(dated: &DatedItem, profile: SourceProfile) -> Entry {
    let item = &dated.item;
    let rules = CleanRules::for_profile(profile);

    Entry {
        url: canonical_url(item, profile),
        link: item.link().to_string(),
        title: clean(item.title.as_deref().unwrap_or(""), rules),
        summary: clean(item.summary.as_deref().unwrap_or(""), rules),
        content: item
            .content
            .first()
            .map(|body| clean(body, rules))
            .unwrap_or_default(),
        hashtags: hashtags(&item.tags),
        images: Vec::new(),
        updated: dated.updated,
    }
}

/// The identifier used for templating and dedup.
///
/// The item id, except for WordPress feeds where the id is a `?p=123` style
/// GUID and the `alternate` link (the `text/html` one when several are
/// declared) is the public permalink.
pub fn canonical_url(item: &RawItem, profile: SourceProfile) -> String {
    if profile == SourceProfile::WordPress {
        let alternates: Vec<_> = item.links_with_rel("alternate").collect();
        let preferred = if alternates.len() > 1 {
            alternates
                .into_iter()
                .find(|link| link.media_type.as_deref() == Some("text/html"))
        } else {
            alternates.into_iter().next()
        };
        if let Some(link) = preferred {
            return link.href.clone();
        }
    }
    item.id.clone()
}
