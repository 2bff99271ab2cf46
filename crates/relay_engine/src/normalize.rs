//! HTML fragment to plain text.

use std::sync::LazyLock;

use ego_tree::NodeRef;
use regex::Regex;
use relay_core::SourceProfile;
use scraper::node::{Element, Node};
use scraper::Html;

/// Source-specific suppression rules for [`clean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanRules {
    /// Drop elements with a `read-more` / `read-more-*` class.
    pub strip_read_more: bool,
}

impl CleanRules {
    pub fn for_profile(profile: SourceProfile) -> Self {
        Self {
            strip_read_more: profile.strips_read_more(),
        }
    }
}

static NBSP_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new("\u{a0}+").expect("static regex"));
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new("  +").expect("static regex"));
static SPACE_BEFORE_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(" +\n").expect("static regex"));
static BLANK_LINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\n\n\n+").expect("static regex"));

/// Strip markup from an HTML fragment and tidy the remaining whitespace.
///
/// Never fails; malformed markup yields whatever text the parser recovers.
/// Cleaning twice gives the same text as cleaning once, unless the output
/// still holds `&` or `<` that decode to new markup: `&amp;lt;b&amp;gt;`
/// becomes `&lt;b&gt;` and then `<b>`.
pub fn clean(html: &str, rules: CleanRules) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::with_capacity(html.len());
    for child in fragment.root_element().children() {
        collect_text(child, rules, &mut text);
    }
    tidy_whitespace(&text)
}

fn collect_text(node: NodeRef<'_, Node>, rules: CleanRules, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => {
            if is_invisible(element) || (rules.strip_read_more && is_read_more(element)) {
                return;
            }
            if element.name() == "br" {
                out.push('\n');
                return;
            }
            for child in node.children() {
                collect_text(child, rules, out);
            }
        }
        _ => {
            for child in node.children() {
                collect_text(child, rules, out);
            }
        }
    }
}

fn is_invisible(element: &Element) -> bool {
    matches!(
        element.name(),
        "script" | "style" | "noscript" | "template"
    )
}

fn is_read_more(element: &Element) -> bool {
    element
        .classes()
        .any(|class| class == "read-more" || class.starts_with("read-more-"))
}

fn tidy_whitespace(text: &str) -> String {
    let text = NBSP_RUNS.replace_all(text, " ");
    let text = SPACE_RUNS.replace_all(&text, " ");
    let text = SPACE_BEFORE_NEWLINE.replace_all(&text, "\n");
    let text = BLANK_LINE_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}
