//! Markdown → HTML.
//!
//! Thin wrapper over `pulldown-cmark` with the common extensions switched on.
//! Rendering is pure and total: any string renders to some HTML.

use pulldown_cmark::{Options, Parser, html};

/// Parser options shared by the static build and the live server.
pub fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, markdown_options());
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_and_paragraph() {
        assert_eq!(render_markdown("# A\n\nhello"), "<h1>A</h1>\n<p>hello</p>\n");
    }

    #[test]
    fn image_link_keeps_its_target() {
        let html = render_markdown("![cat](abc.jpg)");
        assert!(html.contains(r#"<img src="abc.jpg" alt="cat" />"#), "{html}");
    }

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(render_markdown(""), "");
    }

    #[test]
    fn tables_are_enabled() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn strikethrough_is_enabled() {
        assert!(render_markdown("~~gone~~").contains("<del>gone</del>"));
    }

    #[test]
    fn task_lists_are_enabled() {
        let html = render_markdown("- [x] done\n- [ ] todo\n");
        assert!(html.contains(r#"type="checkbox""#));
    }
}
