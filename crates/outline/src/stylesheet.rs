use crate::node::{Node, NodeKind};
use crate::span::Span;
use regex::Regex;
use std::sync::OnceLock;

/// Selector text up to (not including) a rule's opening brace
fn rule_pattern() -> &'static Regex {
    static RULE: OnceLock<Regex> = OnceLock::new();
    RULE.get_or_init(|| Regex::new(r"([^{}]+)\{").expect("rule pattern is valid"))
}

/// Heuristic rule scanner.
///
/// Each rule spans from the start of its selector to the start of the next
/// rule's selector, or end of text. Nested blocks (`@media`), braces inside
/// comments or strings and selectors containing `::` are not understood.
pub fn outline(content: &str) -> Node {
    let selectors: Vec<(String, usize)> = rule_pattern()
        .captures_iter(content)
        .filter_map(|caps| {
            let group = caps.get(1)?;
            let raw = group.as_str();
            let name = raw.trim();
            if name.is_empty() {
                return None;
            }
            let leading = raw.len() - raw.trim_start().len();
            Some((name.to_string(), group.start() + leading))
        })
        .collect();

    let mut root = Node::root(content.len());
    for (idx, (name, start)) in selectors.iter().enumerate() {
        let end = selectors
            .get(idx + 1)
            .map_or(content.len(), |(_, next)| *next);
        root.insert(Node::new(name.clone(), Span::new(*start, end), NodeKind::Rule));
    }
    root
}
