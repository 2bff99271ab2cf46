use thiserror::Error;

/// Character ceiling for a rendered post, one below the platform's 500.
pub const MAX_POST_CHARS: usize = 499;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),
    #[error("unbalanced brace at character {0}")]
    UnbalancedBrace(usize),
}

/// Substitute `{name}` placeholders using `lookup`.
///
/// `{{` and `}}` produce literal braces. A placeholder that `lookup` does not
/// know, or a stray brace, is an error.
pub fn render<F>(template: &str, lookup: F) -> Result<String, TemplateError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len() * 2);
    let mut chars = template.chars().enumerate().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => return Err(TemplateError::UnbalancedBrace(pos)),
                        Some((_, c)) => name.push(c),
                    }
                }
                let value =
                    lookup(&name).ok_or_else(|| TemplateError::UnknownPlaceholder(name.clone()))?;
                out.push_str(&value);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(TemplateError::UnbalancedBrace(pos));
                }
            }
            _ => out.push(ch),
        }
    }

    Ok(out)
}

/// Keep at most `max` characters (Unicode scalar values) of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
