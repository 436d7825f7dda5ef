use serde::{Deserialize, Serialize};

/// A run of text with uniform formatting, as the remote store understands it.
///
/// Serializes to either:
///
/// ```json
/// {"type": "text", "text": {"content": "hello", "link": {"url": "https://example.com"}}}
/// ```
///
/// or, for inline math when LaTeX support is on:
///
/// ```json
/// {"type": "equation", "equation": {"expression": "E = mc^2"}}
/// ```
///
/// In both cases an `annotations` object is added if any formatting flag is set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RichText {
    #[serde(flatten)]
    pub kind: RichTextKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichTextKind {
    Text { text: TextContent },
    Equation { equation: Expression },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkUrl>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkUrl {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Expression {
    pub expression: String,
}

/// Formatting flags. Only the flags that are set get serialized.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
}

/// One of the annotation flags; used when a formatting node stamps its flag onto every span beneath it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Annotation {
    Bold,
    Italic,
    Strikethrough,
    Underline,
    Code,
}

impl RichText {
    pub fn plain<S: Into<String>>(content: S) -> Self {
        Self {
            kind: RichTextKind::Text {
                text: TextContent {
                    content: content.into(),
                    link: None,
                },
            },
            annotations: None,
        }
    }

    pub fn equation<S: Into<String>>(expression: S) -> Self {
        Self {
            kind: RichTextKind::Equation {
                equation: Expression {
                    expression: expression.into(),
                },
            },
            annotations: None,
        }
    }

    /// The span's text content, or `None` for equations.
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            RichTextKind::Text { text } => Some(&text.content),
            RichTextKind::Equation { .. } => None,
        }
    }

    /// The visible text of this span: its content, or an equation's expression.
    pub fn plain_text(&self) -> &str {
        match &self.kind {
            RichTextKind::Text { text } => &text.content,
            RichTextKind::Equation { equation } => &equation.expression,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match &self.kind {
            RichTextKind::Text { text } => text.link.as_ref().map(|l| l.url.as_str()),
            RichTextKind::Equation { .. } => None,
        }
    }

    /// Sets one annotation flag, keeping any others already set.
    pub fn annotate(&mut self, annotation: Annotation) {
        let annotations = self.annotations.get_or_insert_with(Annotations::default);
        match annotation {
            Annotation::Bold => annotations.bold = true,
            Annotation::Italic => annotations.italic = true,
            Annotation::Strikethrough => annotations.strikethrough = true,
            Annotation::Underline => annotations.underline = true,
            Annotation::Code => annotations.code = true,
        }
    }

    /// Attaches a link. Equations can't carry links, so this is a no-op for them.
    pub fn set_link(&mut self, url: &str) {
        if let RichTextKind::Text { text } = &mut self.kind {
            text.link = Some(LinkUrl { url: url.to_string() });
        }
    }

    /// Returns a copy of this span with its text replaced, keeping link and annotations.
    pub(crate) fn with_content(&self, content: String) -> Self {
        let mut copy = self.clone();
        if let RichTextKind::Text { text } = &mut copy.kind {
            text.content = content;
        }
        copy
    }
}
