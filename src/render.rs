use colored::Colorize;
use regex::Regex;
use std::sync::LazyLock;

static CODE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```([\w+#.-]*)[^\n]*\n(.*?)```").unwrap());
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
}

/// Fenced code blocks in order of appearance.
pub fn code_blocks(markdown: &str) -> Vec<CodeBlock> {
    CODE_BLOCK_RE
        .captures_iter(markdown)
        .map(|c| CodeBlock {
            language: c
                .get(1)
                .map(|m| m.as_str().to_string())
                .filter(|l| !l.is_empty()),
            code: c
                .get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        })
        .collect()
}

fn inline(line: &str) -> String {
    let bolded = BOLD_RE.replace_all(line, |c: &regex::Captures| c[1].bold().to_string());
    INLINE_CODE_RE
        .replace_all(&bolded, |c: &regex::Captures| c[1].yellow().to_string())
        .into_owned()
}

/// Terminal rendering of a guide: coloured headings, emphasis and framed
/// code blocks. Anything else passes through untouched.
pub fn render_markdown(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() + 64);
    let mut in_code = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if let Some(fence) = trimmed.strip_prefix("```") {
            if in_code {
                out.push_str(&"└──".dimmed().to_string());
            } else {
                let language = fence.trim();
                let label = if language.is_empty() { "code" } else { language };
                out.push_str(&format!("┌── {} ──", label.to_uppercase()).dimmed().to_string());
            }
            in_code = !in_code;
        } else if in_code {
            out.push_str(&format!("{} {}", "│".dimmed(), line.green()));
        } else if trimmed.starts_with('#') {
            let text = trimmed.trim_start_matches('#').trim();
            out.push_str(&text.bold().cyan().to_string());
        } else if trimmed.len() > 2 && trimmed.starts_with('_') && trimmed.ends_with('_') {
            out.push_str(&trimmed[1..trimmed.len() - 1].italic().dimmed().to_string());
        } else {
            out.push_str(&inline(line));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUIDE: &str = "## Wiring\nConnect **VCC** to `3V3`.\n\n```cpp\n#include <DHT.h>\nvoid setup() {}\n```\n\n```\nprint('hi')\n```\n";

    #[test]
    fn extracts_code_blocks_with_languages() {
        let blocks = code_blocks(GUIDE);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language.as_deref(), Some("cpp"));
        assert_eq!(blocks[0].code, "#include <DHT.h>\nvoid setup() {}\n");
        assert_eq!(blocks[1].language, None);
        assert_eq!(blocks[1].code, "print('hi')\n");
    }

    #[test]
    fn plain_rendering_keeps_text() {
        colored::control::set_override(false);
        let rendered = render_markdown(GUIDE);
        assert!(rendered.starts_with("Wiring\n"));
        assert!(rendered.contains("Connect VCC to 3V3."));
        assert!(rendered.contains("┌── CPP ──"));
        assert!(rendered.contains("│ #include <DHT.h>"));
        assert!(rendered.contains("┌── CODE ──"));
    }

    #[test]
    fn no_blocks_in_plain_text() {
        assert!(code_blocks("nothing to see").is_empty());
    }
}
