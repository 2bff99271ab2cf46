/// A link declared on a feed item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawLink {
    pub href: String,
    /// Relation such as `alternate` or `enclosure`; `None` when undeclared.
    pub rel: Option<String>,
    /// Declared media type, e.g. `text/html`.
    pub media_type: Option<String>,
}

/// An enclosure (RSS) or media attachment declared on a feed item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawEnclosure {
    pub href: String,
    pub media_type: Option<String>,
}

/// One syndication entry as delivered by the feed source.
///
/// Every field is optional in the wire formats; absence is explicit here
/// rather than discovered by probing a loosely-typed record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawItem {
    /// Entry id (Atom `id`, RSS `guid`). Empty when the feed has none.
    pub id: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    /// Content bodies in document order; usually zero or one.
    pub content: Vec<String>,
    /// Raw category/tag terms.
    pub tags: Vec<String>,
    pub links: Vec<RawLink>,
    pub enclosures: Vec<RawEnclosure>,
    /// Updated (or, failing that, published) timestamp as text.
    pub updated: Option<String>,
}

impl RawItem {
    /// The feed-declared permalink.
    ///
    /// First link marked `alternate` (or carrying no relation), else the
    /// first link of any kind, else an empty string.
    pub fn link(&self) -> &str {
        self.links
            .iter()
            .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.links.first())
            .map(|link| link.href.as_str())
            .unwrap_or("")
    }

    /// Links carrying the given relation.
    pub fn links_with_rel<'a>(&'a self, rel: &'a str) -> impl Iterator<Item = &'a RawLink> + 'a {
        self.links
            .iter()
            .filter(move |link| link.rel.as_deref() == Some(rel))
    }
}

/// A fetched and parsed feed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchedFeed {
    /// Feed-level generator field (RSS `<generator>` text or Atom generator name).
    pub generator: Option<String>,
    pub items: Vec<RawItem>,
}
