use fancy_regex::Regex;
use memchr::memmem;
use std::borrow::Cow;

const TOKEN_AFFIX: &str = "MATHPLACEHOLDER";

/// Hidden math spans for a single conversion.
///
/// Before parsing, every delimited formula is swapped for a token like `MATHPLACEHOLDER0MATHPLACEHOLDER`, so the
/// markdown parser can't read `*` or `_` inside a formula as emphasis. After parsing, text is run back through
/// [`MathPlaceholders::restore`] (or [`MathPlaceholders::restore_source`]) to swap the formulas back in.
///
/// Restoration is plain token substitution: a token that the user happened to type verbatim is also replaced, if a
/// span with that index exists.
///
/// # Examples
///
/// ```
/// use md2notion::convert::MathPlaceholders;
///
/// let (hidden, placeholders) = MathPlaceholders::hide("a $x_1 * y_2$ b", "$", false).unwrap();
/// assert_eq!(hidden, "a MATHPLACEHOLDER0MATHPLACEHOLDER b");
/// assert_eq!(placeholders.restore_source(&hidden), "a $x_1 * y_2$ b");
/// ```
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct MathPlaceholders {
    spans: Vec<MathSpan>,
}

/// One hidden formula.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MathSpan {
    /// The original text, delimiters included.
    pub source: String,
    /// The formula without its delimiters.
    pub expression: String,
    /// Whether the span used a display delimiter (`$$...$$` or `\[...\]`).
    pub display: bool,
}

/// A piece of restored text: either literal text, or a formula that was hidden.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Restored<'a> {
    Text(Cow<'a, str>),
    Math(&'a MathSpan),
}

/// The pattern used to hide a math span, and whether it's a display span.
struct MathPattern {
    regex: Regex,
    display: bool,
}

impl MathPlaceholders {
    /// Hides every `delimiter...delimiter` span (non-empty, with no nested delimiter).
    ///
    /// If `support_latex` is set, `$$...$$`, `\[...\]` and `\(...\)` spans get hidden first.
    pub fn hide(markdown: &str, delimiter: &str, support_latex: bool) -> Result<(String, Self), fancy_regex::Error> {
        let mut placeholders = Self::default();
        if delimiter.is_empty() {
            return Ok((markdown.to_string(), placeholders));
        }
        let mut patterns = Vec::with_capacity(4);
        if support_latex {
            patterns.push(MathPattern::new(r"(?s)\$\$(.+?)\$\$", true)?);
            patterns.push(MathPattern::new(r"(?s)\\\[(.+?)\\\]", true)?);
            patterns.push(MathPattern::new(r"(?s)\\\((.+?)\\\)", false)?);
        }
        let d = fancy_regex::escape(delimiter);
        patterns.push(MathPattern::new(&format!(r"(?s){d}((?:(?!{d}).)+){d}"), false)?);

        let mut text = markdown.to_string();
        for pattern in &patterns {
            text = placeholders.hide_matching(pattern, &text)?;
        }
        Ok((text, placeholders))
    }

    /// A no-op codec: nothing hidden, nothing to restore.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn token(index: usize) -> String {
        format!("{TOKEN_AFFIX}{index}{TOKEN_AFFIX}")
    }

    /// Looks up the span a token stands for.
    pub fn get(&self, token: &str) -> Option<&MathSpan> {
        let digits = token.strip_prefix(TOKEN_AFFIX)?.strip_suffix(TOKEN_AFFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.spans.get(digits.parse::<usize>().ok()?)
    }

    /// Splits `text` into literal runs and the formulas whose tokens it contains.
    pub fn restore<'a>(&'a self, text: &'a str) -> Vec<Restored<'a>> {
        let mut pieces = Vec::new();
        let mut last = 0;
        for (start, end, span) in self.tokens_in(text) {
            if start > last {
                pieces.push(Restored::Text(Cow::Borrowed(&text[last..start])));
            }
            pieces.push(Restored::Math(span));
            last = end;
        }
        if last < text.len() {
            pieces.push(Restored::Text(Cow::Borrowed(&text[last..])));
        }
        pieces
    }

    /// Puts every hidden formula back as its original source text.
    pub fn restore_source<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.is_empty() {
            return Cow::Borrowed(text);
        }
        let mut out: Option<String> = None;
        let mut last = 0;
        for (start, end, span) in self.tokens_in(text) {
            let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
            buf.push_str(&text[last..start]);
            buf.push_str(&span.source);
            last = end;
        }
        match out {
            None => Cow::Borrowed(text),
            Some(mut buf) => {
                buf.push_str(&text[last..]);
                Cow::Owned(buf)
            }
        }
    }

    /// If `text` (ignoring surrounding whitespace) is exactly one token, returns its span.
    pub fn sole_span(&self, text: &str) -> Option<&MathSpan> {
        self.get(text.trim())
    }

    fn hide_matching(&mut self, pattern: &MathPattern, text: &str) -> Result<String, fancy_regex::Error> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in pattern.regex.captures_iter(text) {
            let caps = caps?;
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            out.push_str(&Self::token(self.spans.len()));
            self.spans.push(MathSpan {
                source: whole.as_str().to_string(),
                expression: inner.as_str().trim().to_string(),
                display: pattern.display,
            });
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }

    /// Finds `(start, end, span)` for every known token in `text`, in order.
    fn tokens_in<'a>(&'a self, text: &'a str) -> impl Iterator<Item = (usize, usize, &'a MathSpan)> + 'a {
        let bytes = text.as_bytes();
        let mut from = 0;
        std::iter::from_fn(move || {
            while from < bytes.len() {
                let start = from + memmem::find(&bytes[from..], TOKEN_AFFIX.as_bytes())?;
                let digits_start = start + TOKEN_AFFIX.len();
                let digits_len = bytes[digits_start..].iter().take_while(|b| b.is_ascii_digit()).count();
                let digits_end = digits_start + digits_len;
                if digits_len > 0 && bytes[digits_end..].starts_with(TOKEN_AFFIX.as_bytes()) {
                    let end = digits_end + TOKEN_AFFIX.len();
                    if let Some(span) = self.get(&text[start..end]) {
                        from = end;
                        return Some((start, end, span));
                    }
                }
                from = start + 1;
            }
            None
        })
    }
}

impl MathPattern {
    fn new(pattern: &str, display: bool) -> Result<Self, fancy_regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            display,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::utils_for_test::*;

    #[test]
    fn hides_single_span() {
        let (hidden, ph) = MathPlaceholders::hide("cost is $a*b$ today", "$", false).unwrap();
        assert_eq!(hidden, "cost is MATHPLACEHOLDER0MATHPLACEHOLDER today");
        assert_eq!(ph.len(), 1);
        let span = get_only(ph.spans.iter());
        assert_eq!(span.source, "$a*b$");
        assert_eq!(span.expression, "a*b");
        assert!(!span.display);
    }

    #[test]
    fn hides_spans_in_order() {
        let (hidden, ph) = MathPlaceholders::hide("$a$ and $b$ and $c$", "$", false).unwrap();
        assert_eq!(
            hidden,
            "MATHPLACEHOLDER0MATHPLACEHOLDER and MATHPLACEHOLDER1MATHPLACEHOLDER and MATHPLACEHOLDER2MATHPLACEHOLDER"
        );
        assert_eq!(ph.restore_source(&hidden), "$a$ and $b$ and $c$");
    }

    #[test]
    fn unmatched_delimiter_left_alone() {
        let (hidden, ph) = MathPlaceholders::hide("it costs $5 and more", "$", false).unwrap();
        assert_eq!(hidden, "it costs $5 and more");
        assert!(ph.is_empty());
    }

    #[test]
    fn empty_span_not_hidden() {
        let (hidden, ph) = MathPlaceholders::hide("$$", "$", false).unwrap();
        assert_eq!(hidden, "$$");
        assert!(ph.is_empty());
    }

    #[test]
    fn custom_delimiter() {
        let (hidden, ph) = MathPlaceholders::hide("a %x+y% b $c$", "%", false).unwrap();
        assert_eq!(hidden, "a MATHPLACEHOLDER0MATHPLACEHOLDER b $c$");
        assert_eq!(ph.restore_source(&hidden), "a %x+y% b $c$");
    }

    #[test]
    fn empty_delimiter_is_identity() {
        let (hidden, ph) = MathPlaceholders::hide("a $b$ c", "", false).unwrap();
        assert_eq!(hidden, "a $b$ c");
        assert!(ph.is_empty());
    }

    #[test]
    fn spans_can_cross_lines() {
        let (hidden, ph) = MathPlaceholders::hide("$a\nb$", "$", false).unwrap();
        assert_eq!(hidden, "MATHPLACEHOLDER0MATHPLACEHOLDER");
        assert_eq!(get_only(ph.spans.iter()).source, "$a\nb$");
    }

    #[test]
    fn spans_can_cross_blocks() {
        let md = "Costs $5 today\n\n```sh\necho $HOME\n```";
        let (hidden, ph) = MathPlaceholders::hide(md, "$", false).unwrap();
        assert_eq!(hidden, "Costs MATHPLACEHOLDER0MATHPLACEHOLDERHOME\n```");
        let span = get_only(ph.spans.iter());
        assert_eq!(span.source, "$5 today\n\n```sh\necho $");
        assert_eq!(ph.restore_source(&hidden), md);
    }

    #[test]
    fn latex_display_spans_first() {
        let (hidden, ph) = MathPlaceholders::hide(r"$$E=mc^2$$ then \(F=ma\) and $x$", "$", true).unwrap();
        assert_eq!(
            hidden,
            "MATHPLACEHOLDER0MATHPLACEHOLDER then MATHPLACEHOLDER1MATHPLACEHOLDER and MATHPLACEHOLDER2MATHPLACEHOLDER"
        );
        assert_eq!(ph.spans[0].expression, "E=mc^2");
        assert!(ph.spans[0].display);
        assert_eq!(ph.spans[1].expression, "F=ma");
        assert!(!ph.spans[1].display);
        assert_eq!(ph.spans[2].expression, "x");
        assert_eq!(ph.restore_source(&hidden), r"$$E=mc^2$$ then \(F=ma\) and $x$");
    }

    #[test]
    fn latex_bracket_display() {
        let (hidden, ph) = MathPlaceholders::hide(r"\[ \int_0^1 x \]", "$", true).unwrap();
        assert_eq!(hidden, "MATHPLACEHOLDER0MATHPLACEHOLDER");
        assert_eq!(ph.spans[0].expression, r"\int_0^1 x");
        assert!(ph.spans[0].display);
    }

    #[test]
    fn restore_splits_text_and_math() {
        let (hidden, ph) = MathPlaceholders::hide("a $x$ b", "$", false).unwrap();
        let pieces = ph.restore(&hidden);
        assert_eq!(pieces.len(), 3);
        unwrap!(&pieces[0], Restored::Text(before));
        assert_eq!(before, "a ");
        unwrap!(&pieces[1], Restored::Math(span));
        assert_eq!(span.source, "$x$");
        unwrap!(&pieces[2], Restored::Text(after));
        assert_eq!(after, " b");
    }

    #[test]
    fn restore_adjacent_tokens() {
        let (hidden, ph) = MathPlaceholders::hide("$a$$b$", "$", false).unwrap();
        // "$a$" then "$b$", with no text between
        assert_eq!(ph.restore_source(&hidden), "$a$$b$");
        assert_eq!(ph.restore(&hidden).len(), 2);
    }

    #[test]
    fn unknown_token_left_as_is() {
        let ph = MathPlaceholders::none();
        let text = "MATHPLACEHOLDER7MATHPLACEHOLDER";
        assert_eq!(ph.restore_source(text), text);

        let (_, ph) = MathPlaceholders::hide("$a$", "$", false).unwrap();
        assert_eq!(ph.restore_source("MATHPLACEHOLDER7MATHPLACEHOLDER"), "MATHPLACEHOLDER7MATHPLACEHOLDER");
        assert_eq!(ph.restore_source("MATHPLACEHOLDERMATHPLACEHOLDER"), "MATHPLACEHOLDERMATHPLACEHOLDER");
    }

    #[test]
    fn user_typed_token_is_also_restored() {
        let (_, ph) = MathPlaceholders::hide("$a$", "$", false).unwrap();
        assert_eq!(ph.restore_source("typed MATHPLACEHOLDER0MATHPLACEHOLDER"), "typed $a$");
    }

    #[test]
    fn sole_span() {
        let (hidden, ph) = MathPlaceholders::hide("  $x$ ", "$", false).unwrap();
        assert_eq!(ph.sole_span(&hidden).map(|s| s.expression.as_str()), Some("x"));
        assert_eq!(ph.sole_span("text"), None);
    }

    #[test]
    fn non_ascii_text_round_trips() {
        let md = "公式：$y = mx + b$ 和 $é$";
        let (hidden, ph) = MathPlaceholders::hide(md, "$", false).unwrap();
        assert_eq!(ph.len(), 2);
        assert_eq!(ph.restore_source(&hidden), md);
    }
}
