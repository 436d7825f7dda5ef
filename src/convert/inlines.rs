use crate::blocks::{Annotation, RichText};
use crate::convert::math::Restored;
use crate::convert::transform::plain_text;
use crate::convert::BlockTransformer;
use markdown::mdast;

impl BlockTransformer<'_> {
    /// Composes inline nodes into rich text spans.
    ///
    /// Strong, emphasis and delete stamp bold, italic and strikethrough onto every span beneath them; links stamp
    /// their URL. Math placeholders are restored here: as equation spans if LaTeX support is on, or as their source
    /// text otherwise. Any other node contributes its plain text as a single span. Empty text never produces a span.
    pub fn inline_rich_text(&self, nodes: &[mdast::Node]) -> Vec<RichText> {
        let mut spans = Vec::new();
        for node in nodes {
            self.push_inline(node, &mut spans);
        }
        spans
    }

    fn push_inline(&self, node: &mdast::Node, spans: &mut Vec<RichText>) {
        match node {
            mdast::Node::Text(text) => self.push_text(&text.value, spans),
            mdast::Node::Strong(strong) => self.push_annotated(&strong.children, Annotation::Bold, spans),
            mdast::Node::Emphasis(emphasis) => self.push_annotated(&emphasis.children, Annotation::Italic, spans),
            mdast::Node::Delete(delete) => self.push_annotated(&delete.children, Annotation::Strikethrough, spans),
            mdast::Node::InlineCode(code) => {
                let mut span = RichText::plain(self.placeholders.restore_source(&code.value));
                span.annotate(Annotation::Code);
                spans.push(span);
            }
            mdast::Node::Link(link) => self.push_linked(&link.children, &link.url, spans),
            mdast::Node::LinkReference(reference) => match self.link_definitions.get(&reference.identifier) {
                Some(url) => self.push_linked(&reference.children, url, spans),
                None => self.push_flattened(node, spans),
            },
            other => self.push_flattened(other, spans),
        }
    }

    fn push_text(&self, value: &str, spans: &mut Vec<RichText>) {
        if !self.support_latex {
            let content = self.placeholders.restore_source(value);
            if !content.is_empty() {
                spans.push(RichText::plain(content));
            }
            return;
        }
        for piece in self.placeholders.restore(value) {
            match piece {
                Restored::Text(text) if text.is_empty() => {}
                Restored::Text(text) => spans.push(RichText::plain(text)),
                Restored::Math(span) => spans.push(RichText::equation(span.expression.as_str())),
            }
        }
    }

    fn push_annotated(&self, children: &[mdast::Node], annotation: Annotation, spans: &mut Vec<RichText>) {
        let start = spans.len();
        for child in children {
            self.push_inline(child, spans);
        }
        for span in &mut spans[start..] {
            span.annotate(annotation);
        }
    }

    fn push_linked(&self, children: &[mdast::Node], url: &str, spans: &mut Vec<RichText>) {
        let start = spans.len();
        for child in children {
            self.push_inline(child, spans);
        }
        for span in &mut spans[start..] {
            span.set_link(url);
        }
    }

    fn push_flattened(&self, node: &mdast::Node, spans: &mut Vec<RichText>) {
        let text = plain_text(node);
        if !text.is_empty() {
            spans.push(RichText::plain(self.placeholders.restore_source(&text).into_owned()));
        }
    }
}
