/// Turn one raw tag term into a hashtag.
///
/// Spaces become underscores, periods and hyphens are removed. Returns `None`
/// when nothing usable is left.
pub fn hashtag(term: &str) -> Option<String> {
    let tag: String = term
        .trim()
        .chars()
        .filter(|c| *c != '.' && *c != '-')
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    if tag.is_empty() {
        None
    } else {
        Some(format!("#{tag}"))
    }
}

/// Space-joined hashtags for a list of tag terms, in input order.
pub fn hashtags<I, S>(terms: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    terms
        .into_iter()
        .filter_map(|term| hashtag(term.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
