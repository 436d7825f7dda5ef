use crate::blocks::*;
use crate::convert::MathPlaceholders;
use fancy_regex::Regex;
use markdown::mdast;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Turns mdast nodes into remote blocks.
///
/// One transformer serves one conversion: it borrows that conversion's [`MathPlaceholders`] and holds the link
/// reference definitions collected from the document (see [`BlockTransformer::with_definitions_from`]).
///
/// # Examples
///
/// ```
/// use md2notion::blocks::Block;
/// use md2notion::convert::{BlockTransformer, MathPlaceholders};
///
/// let root = markdown::to_mdast("# Title\n\n---", &markdown::ParseOptions::gfm()).unwrap();
/// let placeholders = MathPlaceholders::none();
/// let blocks = BlockTransformer::new(&placeholders, false).transform(&root);
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(blocks[0].type_name(), "heading_1");
/// assert_eq!(blocks[1], Block::Divider);
/// ```
pub struct BlockTransformer<'a> {
    pub(super) placeholders: &'a MathPlaceholders,
    pub(super) link_definitions: HashMap<String, String>,
    pub(super) support_latex: bool,
}

const PLAIN_TEXT_LANGUAGE: &str = "plain text";

impl<'a> BlockTransformer<'a> {
    pub fn new(placeholders: &'a MathPlaceholders, support_latex: bool) -> Self {
        Self {
            placeholders,
            link_definitions: HashMap::new(),
            support_latex,
        }
    }

    /// Collects every `[id]: url` definition under `root`, so that `[text][id]` references can resolve.
    ///
    /// The first definition of an id wins.
    pub fn with_definitions_from(mut self, root: &mdast::Node) -> Self {
        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            if let mdast::Node::Definition(def) = node {
                self.link_definitions
                    .entry(def.identifier.clone())
                    .or_insert_with(|| def.url.clone());
            }
            if let Some(children) = node.children() {
                pending.extend(children.iter().rev());
            }
        }
        self
    }

    /// Maps one node to zero or more blocks. A root node maps each of its children in turn.
    pub fn transform(&self, node: &mdast::Node) -> Vec<Block> {
        match node {
            mdast::Node::Root(root) => self.transform_all(&root.children),
            mdast::Node::Heading(heading) => vec![Block::heading(
                HeadingLevel::from_depth(heading.depth),
                self.inline_rich_text(&heading.children),
            )],
            mdast::Node::Paragraph(paragraph) => vec![self.paragraph(paragraph)],
            mdast::Node::List(list) => self.list_items(list),
            mdast::Node::Code(code) => vec![self.code(code)],
            mdast::Node::Blockquote(quote) => vec![Block::Quote(TextBody::new(self.quote_rich_text(quote)))],
            mdast::Node::Table(table) => vec![self.table(table)],
            mdast::Node::ThematicBreak(_) => vec![Block::Divider],
            mdast::Node::Html(html) => self.toggle_from_html(&html.value).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Maps sibling nodes in order.
    ///
    /// A `<details>` whose body has blank lines in it arrives as several siblings: an HTML node with the opening tag
    /// and summary, the body's blocks, and an HTML node with the closing tag. Those become one toggle, with the body's
    /// blocks as its children.
    pub fn transform_all(&self, nodes: &[mdast::Node]) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(nodes.len());
        let mut idx = 0;
        while idx < nodes.len() {
            if let mdast::Node::Html(html) = &nodes[idx] {
                if let Some((summary, rest)) = open_details(&html.value) {
                    if let Some(close_offset) = matching_details_close(&nodes[idx + 1..]) {
                        let close_idx = idx + 1 + close_offset;
                        blocks.push(self.toggle_spanning(summary, rest, &nodes[idx + 1..close_idx], &nodes[close_idx]));
                        idx = close_idx + 1;
                        continue;
                    }
                }
            }
            blocks.extend(self.transform(&nodes[idx]));
            idx += 1;
        }
        blocks
    }

    fn paragraph(&self, paragraph: &mdast::Paragraph) -> Block {
        let flattened = plain_text_of_all(&paragraph.children);
        let content = flattened.trim();
        if is_divider(content) {
            return Block::Divider;
        }
        if is_standalone_url(content) {
            return Block::Bookmark(BookmarkBody {
                url: content.to_string(),
            });
        }
        if self.support_latex {
            if let Some(span) = self.placeholders.sole_span(content) {
                return Block::Equation(EquationBody {
                    expression: span.expression.clone(),
                });
            }
        }
        Block::Paragraph(TextBody::new(self.inline_rich_text(&paragraph.children)))
    }

    fn list_items(&self, list: &mdast::List) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(list.children.len());
        for node in &list.children {
            let mdast::Node::ListItem(item) = node else {
                continue;
            };
            let (rich_text, children) = match item.children.split_first() {
                Some((mdast::Node::Paragraph(first), rest)) => {
                    (self.inline_rich_text(&first.children), self.transform_all(rest))
                }
                Some(_) => (vec![RichText::plain("")], self.transform_all(&item.children)),
                None => (Vec::new(), Vec::new()),
            };
            let body = TextBody::with_children(rich_text, children);
            blocks.push(if list.ordered {
                Block::NumberedListItem(body)
            } else {
                Block::BulletedListItem(body)
            });
        }
        blocks
    }

    fn code(&self, code: &mdast::Code) -> Block {
        let language = match code.lang.as_deref() {
            Some(lang) if !lang.is_empty() => language_alias(lang),
            _ => PLAIN_TEXT_LANGUAGE.to_string(),
        };
        Block::Code(CodeBody {
            rich_text: vec![RichText::plain(self.placeholders.restore_source(&code.value))],
            language,
        })
    }

    /// A quote's paragraphs keep their inline formatting, separated by newlines. Anything else inside the quote
    /// contributes its plain text.
    fn quote_rich_text(&self, quote: &mdast::Blockquote) -> Vec<RichText> {
        let mut rich_text = Vec::new();
        for (idx, child) in quote.children.iter().enumerate() {
            if idx > 0 {
                rich_text.push(RichText::plain("\n"));
            }
            match child {
                mdast::Node::Paragraph(paragraph) => rich_text.extend(self.inline_rich_text(&paragraph.children)),
                other => {
                    let text = plain_text(other);
                    if !text.is_empty() {
                        rich_text.push(RichText::plain(self.placeholders.restore_source(&text)));
                    }
                }
            }
        }
        rich_text
    }

    /// Cells keep only their plain text; inline formatting and links inside cells are dropped.
    fn table(&self, table: &mdast::Table) -> Block {
        let mut rows = Vec::with_capacity(table.children.len());
        let mut table_width = None;
        for row_node in &table.children {
            let mdast::Node::TableRow(row) = row_node else {
                continue;
            };
            let cells: Vec<_> = row
                .children
                .iter()
                .map(|cell| {
                    let text = plain_text(cell);
                    vec![RichText::plain(self.placeholders.restore_source(text.trim()))]
                })
                .collect();
            table_width.get_or_insert(cells.len());
            if !cells.is_empty() {
                rows.push(Block::TableRow(TableRowBody { cells }));
            }
        }
        Block::Table(TableBody {
            table_width: table_width.unwrap_or(1),
            has_column_header: true,
            has_row_header: false,
            children: rows,
        })
    }

    /// `<details><summary>S</summary>C</details>` becomes a toggle titled S, with C as a paragraph inside it.
    fn toggle_from_html(&self, html: &str) -> Option<Block> {
        static DETAILS: OnceLock<Regex> = OnceLock::new();
        let details = DETAILS.get_or_init(|| {
            Regex::new(r"(?s)<details[^>]*>.*?<summary>(.*?)</summary>(.*?)</details>").expect("internal error")
        });
        let caps = details.captures(html).ok().flatten()?;
        let summary = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let content = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        let mut children = Vec::new();
        self.push_html_text(content, &mut children);
        Some(self.toggle(summary, children))
    }

    /// A toggle whose opening and closing tags are separate HTML nodes, with `body` between them.
    fn toggle_spanning(&self, summary: &str, rest: &str, body: &[mdast::Node], close: &mdast::Node) -> Block {
        let mut children = Vec::new();
        self.push_html_text(rest, &mut children);
        children.extend(self.transform_all(body));
        if let mdast::Node::Html(html) = close {
            let before_close = html.value.split("</details>").next().unwrap_or_default();
            self.push_html_text(before_close, &mut children);
        }
        self.toggle(summary, children)
    }

    fn toggle(&self, summary: &str, children: Vec<Block>) -> Block {
        Block::Toggle(TextBody::with_children(
            vec![RichText::plain(self.placeholders.restore_source(summary.trim()))],
            children,
        ))
    }

    /// Text that sits inside the details tags themselves becomes a plain paragraph, if there is any.
    fn push_html_text(&self, text: &str, children: &mut Vec<Block>) {
        let text = text.trim();
        if !text.is_empty() {
            children.push(Block::Paragraph(TextBody::new(vec![RichText::plain(
                self.placeholders.restore_source(text),
            )])));
        }
    }
}

/// Maps common short language tags onto the names the remote store expects. Unknown tags pass through, lower-cased.
pub fn language_alias(lang: &str) -> String {
    let lower = lang.to_lowercase();
    let alias = match lower.as_str() {
        "js" => "javascript",
        "ts" => "typescript",
        "py" => "python",
        "rb" => "ruby",
        "sh" => "bash",
        "yml" => "yaml",
        "md" => "markdown",
        "mermaid" => PLAIN_TEXT_LANGUAGE,
        _ => return lower,
    };
    alias.to_string()
}

/// An HTML node that opens a `<details>` with a summary but doesn't close it: the summary, and whatever follows it.
fn open_details(html: &str) -> Option<(&str, &str)> {
    static OPEN: OnceLock<Regex> = OnceLock::new();
    if html.contains("</details>") {
        return None;
    }
    let open = OPEN.get_or_init(|| {
        Regex::new(r"(?s)^\s*<details[^>]*>.*?<summary>(.*?)</summary>(.*)$").expect("internal error")
    });
    let caps = open.captures(html).ok().flatten()?;
    let summary = caps.get(1)?.as_str();
    let rest = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    Some((summary, rest))
}

/// The index of the HTML node that closes an already-open `<details>`, skipping over nested ones.
fn matching_details_close(nodes: &[mdast::Node]) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, node) in nodes.iter().enumerate() {
        let mdast::Node::Html(html) = node else {
            continue;
        };
        let opens = html.value.contains("<details");
        let closes = html.value.contains("</details>");
        match (opens, closes) {
            (true, false) => depth += 1,
            (false, true) if depth == 0 => return Some(idx),
            (false, true) => depth -= 1,
            _ => {}
        }
    }
    None
}

/// 3+ of the same `-`, `*`, `_` or `=`, and nothing else.
fn is_divider(content: &str) -> bool {
    let mut chars = content.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_' | '=') && content.chars().count() >= 3 && chars.all(|ch| ch == first)
}

/// An absolute http(s) URL with a host, and nothing else.
fn is_standalone_url(content: &str) -> bool {
    let rest = if let Some(rest) = content.strip_prefix("https://") {
        rest
    } else if let Some(rest) = content.strip_prefix("http://") {
        rest
    } else {
        return false;
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    !host.is_empty() && !content.chars().any(char::is_whitespace)
}

/// The concatenated text of a node: literal values, image alt text, and the text of all descendants.
pub(crate) fn plain_text(node: &mdast::Node) -> String {
    let mut out = String::new();
    append_plain_text(node, &mut out);
    out
}

pub(crate) fn plain_text_of_all(nodes: &[mdast::Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        append_plain_text(node, &mut out);
    }
    out
}

fn append_plain_text(node: &mdast::Node, out: &mut String) {
    match node {
        mdast::Node::Text(n) => out.push_str(&n.value),
        mdast::Node::InlineCode(n) => out.push_str(&n.value),
        mdast::Node::InlineMath(n) => out.push_str(&n.value),
        mdast::Node::Code(n) => out.push_str(&n.value),
        mdast::Node::Math(n) => out.push_str(&n.value),
        mdast::Node::Html(n) => out.push_str(&n.value),
        mdast::Node::Image(n) => out.push_str(&n.alt),
        mdast::Node::ImageReference(n) => out.push_str(&n.alt),
        other => {
            if let Some(children) = other.children() {
                for child in children {
                    append_plain_text(child, out);
                }
            }
        }
    }
}
