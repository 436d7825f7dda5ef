/// The two code fence markers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Fence {
    Backticks,
    Tildes,
}

impl Fence {
    fn of_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            Some(Self::Backticks)
        } else if trimmed.starts_with("~~~") {
            Some(Self::Tildes)
        } else {
            None
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Self::Backticks => "```",
            Self::Tildes => "~~~",
        }
    }
}

/// Closes any code fences left open at the end of the document.
///
/// Fence lines are matched by marker only (```` ``` ```` vs `~~~`), never by language tag: a fence line whose marker
/// matches the innermost open fence closes it, and any other fence line opens a new one. Each fence still open at the
/// end gets a closing line, innermost first. A document with no open fences comes back unchanged.
///
/// # Examples
///
/// ```
/// use md2notion::convert::balance_fences;
///
/// assert_eq!(balance_fences("```rust\nfn main() {}"), "```rust\nfn main() {}\n```");
/// assert_eq!(balance_fences("```\nok\n```"), "```\nok\n```");
/// ```
pub fn balance_fences(markdown: &str) -> String {
    let mut open: Vec<Fence> = Vec::new();
    for line in markdown.split('\n') {
        let Some(fence) = Fence::of_line(line) else {
            continue;
        };
        if open.last() == Some(&fence) {
            open.pop();
        } else {
            open.push(fence);
        }
    }
    if open.is_empty() {
        return markdown.to_string();
    }
    let mut result = String::with_capacity(markdown.len() + open.len() * 4);
    result.push_str(markdown);
    while let Some(fence) = open.pop() {
        result.push('\n');
        result.push_str(fence.marker());
    }
    result
}
