//! Text extraction from essay files

use crate::error::{AnalyzerError, Result};
use pulldown_cmark::{Event, Parser, Tag};
use std::path::Path;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> Result<String>;
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            AnalyzerError::InvalidInput(format!("'{}' is not valid UTF-8: {}", path.display(), e))
        })
    }
}

/// Markdown reduced to its text; headings, paragraphs and list items end with a line break.
pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let markdown = PlainTextExtractor.extract(path)?;
        Ok(markdown_to_text(&markdown))
    }
}

pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak => text.push(' '),
            Event::HardBreak => text.push('\n'),
            Event::End(Tag::Paragraph) | Event::End(Tag::Heading(..)) | Event::End(Tag::Item) => {
                text.push('\n')
            }
            _ => {}
        }
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_to_text() {
        let text = markdown_to_text("# 지원 동기\n\n저는 **백엔드** 개발자입니다.\n\n- 첫째 경험\n- 둘째 경험\n");
        assert_eq!(text, "지원 동기\n저는 백엔드 개발자입니다.\n첫째 경험\n둘째 경험");
    }
}
