use regex::Regex;
use termimad::crossterm::style::{Attribute, Color};
use termimad::{CompoundStyle, LineStyle, MadSkin};

/// Renders assistant markdown for terminal display.
#[derive(Clone)]
pub struct MarkdownFormat {
    skin: MadSkin,
    squeeze: Regex,
}

impl Default for MarkdownFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownFormat {
    pub fn new() -> Self {
        let mut skin = MadSkin::default();
        skin.inline_code = CompoundStyle::new(Some(Color::Cyan), None, Attribute::Bold.into());

        let mut codeblock_style = CompoundStyle::new(None, None, Default::default());
        codeblock_style.add_attr(Attribute::Dim);
        skin.code_block = LineStyle::new(codeblock_style, Default::default());

        // Replies stream in with arbitrary blank runs; cap them at one
        // blank line.
        let squeeze = Regex::new(r"\n{3,}").unwrap();

        Self { skin, squeeze }
    }

    pub fn render(&self, content: impl Into<String>) -> String {
        let content = content.into();
        let content = self.squeeze.replace_all(content.trim(), "\n\n");

        self.skin.term_text(&content).to_string().trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_render_keeps_plain_text() {
        let markdown = MarkdownFormat::new();
        let actual = markdown.render("plain reply");
        assert!(actual.contains("plain reply"));
    }

    #[test]
    fn test_render_squeezes_blank_runs() {
        let markdown = MarkdownFormat::new();
        let actual = markdown.render("one\n\n\n\ntwo");
        assert_eq!(actual.matches("\n\n\n").count(), 0);
    }

    #[test]
    fn test_render_is_non_empty_for_rich_markdown() {
        let markdown = MarkdownFormat::new();
        let actual = markdown.render("# Heading\nSome `code` and **bold**.");
        assert!(!actual.is_empty());
    }
}
