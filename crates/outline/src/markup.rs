use crate::error::ParseFailure;
use crate::node::{Node, NodeKind};
use crate::span::Span;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Attribute whose value names an addressable element
const ID_ATTRIBUTE: &str = "id";

/// Single forward pass over the markup collecting every element with an `id`.
///
/// Regions are flat children of the root regardless of nesting: an element's
/// region starts at its `<` and stops at the next `<` (or end of text).
pub fn outline(content: &str) -> Result<Node, ParseFailure> {
    let mut reader = Reader::from_str(content);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.check_comments = false;
    }

    let mut root = Node::root(content.len());

    loop {
        let event = reader.read_event().map_err(|e| ParseFailure::Markup {
            position: reader.error_position() as usize,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(ref tag) | Event::Empty(ref tag) => {
                let Some(id) = element_id(tag) else {
                    continue;
                };
                let position = (reader.buffer_position() as usize).min(content.len());
                let start = content[..position].rfind('<').unwrap_or(0);
                let end = content[start + 1..]
                    .find('<')
                    .map_or(content.len(), |offset| start + 1 + offset);

                root.insert(Node::new(id, Span::new(start, end), NodeKind::Element));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(root)
}

/// Value of the identifying attribute, HTML attribute syntax allowed
fn element_id(tag: &BytesStart<'_>) -> Option<String> {
    for attr in tag.html_attributes().with_checks(false) {
        let Ok(attr) = attr else {
            break;
        };
        if !attr.key.as_ref().eq_ignore_ascii_case(ID_ATTRIBUTE.as_bytes()) {
            continue;
        }

        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            |value| value.into_owned(),
        );
        return Some(value);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_ids_flat() {
        let html = r#"<!DOCTYPE html>
<html>
<body>
  <div id="outer">
    <p id="inner">Hi</p>
    <br>
    <input id="name" disabled>
  </div>
</body>
</html>
"#;

        let root = outline(html).unwrap();
        let ids: Vec<_> = root.children.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["outer", "inner", "name"]);

        let inner = root.child("inner").unwrap();
        assert_eq!(&html[inner.span.start..inner.span.end], r#"<p id="inner">Hi"#);

        let outer = root.child("outer").unwrap();
        assert_eq!(&html[outer.span.start..outer.span.end], "<div id=\"outer\">\n    ");
        assert!(root.is_well_nested());
    }

    #[test]
    fn test_last_region_runs_to_end_of_text() {
        let html = "<span id=\"tail\">text without close";
        let root = outline(html).unwrap();
        let tail = root.child("tail").unwrap();
        assert_eq!(tail.span, Span::new(0, html.len()));
    }

    #[test]
    fn test_duplicate_id_last_wins() {
        let html = "<a id=\"x\">one</a><b id=\"x\">two</b>";
        let root = outline(html).unwrap();
        assert_eq!(root.children.len(), 1);
        let x = root.child("x").unwrap();
        assert_eq!(&html[x.span.start..x.span.end], "<b id=\"x\">two");
    }

    #[test]
    fn test_self_closing_element() {
        let html = "<p><img id=\"logo\" src=\"a.png\"/></p>";
        let root = outline(html).unwrap();
        let logo = root.child("logo").unwrap();
        assert_eq!(&html[logo.span.start..logo.span.end], "<img id=\"logo\" src=\"a.png\"/>");
    }
}
