use std::fmt;

/// Publishing platform behind a feed, resolved once per feed.
///
/// The translator and the media discoverer consult it for source-specific
/// quirks instead of sniffing the generator string themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceProfile {
    #[default]
    Generic,
    WordPress,
}

impl SourceProfile {
    /// Detect the profile from the feed-level generator field.
    ///
    /// RSS feeds put the generator URL there (`https://wordpress.org/?v=6.4`),
    /// Atom feeds the generator name (`WordPress`).
    pub fn detect(generator: Option<&str>) -> Self {
        let Some(generator) = generator else {
            return Self::Generic;
        };
        let lower = generator.trim().to_lowercase();
        if lower.contains("/wordpress.org/") || lower == "wordpress" {
            Self::WordPress
        } else {
            Self::Generic
        }
    }

    /// Resolve the profile for a feed: a configured override wins over detection.
    ///
    /// An override that names no known profile is ignored.
    pub fn resolve(configured: Option<&str>, generator: Option<&str>) -> Self {
        configured
            .and_then(Self::from_name)
            .unwrap_or_else(|| Self::detect(generator))
    }

    /// Parse a configured profile name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "wordpress" => Some(Self::WordPress),
            "generic" => Some(Self::Generic),
            _ => None,
        }
    }

    /// Whether "read more" elements are stripped from markup for this source.
    pub fn strips_read_more(self) -> bool {
        matches!(self, Self::WordPress)
    }
}

impl fmt::Display for SourceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceProfile::Generic => write!(f, "generic"),
            SourceProfile::WordPress => write!(f, "wordpress"),
        }
    }
}
