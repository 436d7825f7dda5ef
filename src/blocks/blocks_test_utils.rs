#[cfg(test)]
pub(crate) use test_utils::*;

#[cfg(test)]
mod test_utils {
    /// Builds a rich text span.
    ///
    /// - `rich_text!("hello")` is a plain span
    /// - `rich_text!("hello", bold, italic)` stamps annotations onto it
    /// - `rich_text!("hello" => "https://example.com")` links it
    macro_rules! rich_text {
        ($text:literal => $url:expr) => {{
            let mut rt = crate::blocks::RichText::plain($text);
            rt.set_link($url);
            rt
        }};
        ($text:literal $(, $annotation:ident)* $(,)?) => {{
            #[allow(unused_mut)]
            let mut rt = crate::blocks::RichText::plain($text);
            $(
                paste::paste! { rt.annotate(crate::blocks::Annotation::[<$annotation:camel>]); }
            )*
            rt
        }};
    }
    pub(crate) use rich_text;

    macro_rules! paragraph {
        ($($text:literal),* $(,)?) => {
            crate::blocks::Block::Paragraph(crate::blocks::TextBody::new(vec![$(rich_text!($text)),*]))
        };
    }
    pub(crate) use paragraph;

    macro_rules! heading {
        ($level:ident, $text:literal) => {
            crate::blocks::Block::heading(crate::blocks::HeadingLevel::$level, vec![rich_text!($text)])
        };
    }
    pub(crate) use heading;

    macro_rules! code {
        ($language:literal, $text:expr) => {
            crate::blocks::Block::Code(crate::blocks::CodeBody {
                rich_text: vec![crate::blocks::RichText::plain($text)],
                language: $language.to_string(),
            })
        };
    }
    pub(crate) use code;
}
