//! Deterministic HTML→Markdown emission (spec.md §4.6 step 11): ATX
//! headings, GitHub-style fenced code blocks with language, pipe tables,
//! reference-free inline links/images. A pure function over the
//! structured tree — no DOM mutation, per spec.md §9's redesign flag.

use crate::content::{InlineNode, StructureNode};

/// Render the whole structured document to a markdown string, collapsing
/// runs of blank lines down to at most two.
pub fn render(structure: &[StructureNode]) -> String {
    let mut out = String::new();
    render_nodes(structure, 0, &mut out);
    collapse_blank_lines(out.trim().to_string())
}

fn render_nodes(nodes: &[StructureNode], list_depth: usize, out: &mut String) {
    for node in nodes {
        render_node(node, list_depth, out);
    }
}

fn render_node(node: &StructureNode, list_depth: usize, out: &mut String) {
    match node {
        StructureNode::Heading(h) => {
            out.push_str(&"#".repeat(h.level.clamp(1, 6) as usize));
            out.push(' ');
            out.push_str(&h.text);
            out.push_str("\n\n");
        }
        StructureNode::Paragraph(inline) => {
            out.push_str(&render_inline(inline));
            out.push_str("\n\n");
        }
        StructureNode::List { ordered, items } => {
            for (i, item) in items.iter().enumerate() {
                let indent = "  ".repeat(list_depth);
                let marker = if *ordered { format!("{}.", i + 1) } else { "-".to_string() };
                out.push_str(&indent);
                out.push_str(&marker);
                out.push(' ');
                let mut item_md = String::new();
                render_nodes(item, list_depth + 1, &mut item_md);
                out.push_str(item_md.trim());
                out.push('\n');
            }
            out.push('\n');
        }
        StructureNode::CodeBlock { language, code } => {
            out.push_str("```");
            out.push_str(language.as_deref().unwrap_or(""));
            out.push('\n');
            out.push_str(code);
            out.push_str("\n```\n\n");
        }
        StructureNode::Table { headers, rows } => {
            if !headers.is_empty() {
                out.push_str(&render_row(headers));
                out.push_str(&render_separator(headers.len()));
            }
            for row in rows {
                out.push_str(&render_row(row));
            }
            out.push('\n');
        }
        StructureNode::Blockquote(children) => {
            let mut inner = String::new();
            render_nodes(children, 0, &mut inner);
            for line in inner.trim().lines() {
                out.push_str("> ");
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        StructureNode::Section { heading, children } => {
            if let Some(h) = heading {
                render_node(&StructureNode::Heading(h.clone()), list_depth, out);
            }
            render_nodes(children, list_depth, out);
        }
    }
}

fn render_row(cells: &[String]) -> String {
    format!("| {} |\n", cells.join(" | "))
}

fn render_separator(n: usize) -> String {
    format!("| {} |\n", vec!["---"; n].join(" | "))
}

fn render_inline(nodes: &[InlineNode]) -> String {
    nodes.iter().map(render_inline_node).collect::<Vec<_>>().join("")
}

fn render_inline_node(node: &InlineNode) -> String {
    match node {
        InlineNode::Text(t) => t.clone(),
        InlineNode::Emphasis(t) => format!("*{t}*"),
        InlineNode::Strong(t) => format!("**{t}**"),
        InlineNode::Code(t) => format!("`{t}`"),
        InlineNode::Link { href, text } => format!("[{text}]({href})"),
        InlineNode::Image { src, alt } => format!("![{alt}]({src})"),
    }
}

fn collapse_blank_lines(s: String) -> String {
    let mut out = String::with_capacity(s.len());
    let mut blank_run = 0;
    for line in s.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run <= 2 {
                out.push('\n');
            }
        } else {
            blank_run = 0;
            out.push_str(line);
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::HeadingInfo;

    #[test]
    fn renders_atx_heading() {
        let structure = vec![StructureNode::Heading(HeadingInfo { level: 2, text: "Intro".into(), id: None })];
        assert_eq!(render(&structure), "## Intro");
    }

    #[test]
    fn renders_fenced_code_block_with_language() {
        let structure = vec![StructureNode::CodeBlock { language: Some("rust".into()), code: "fn main() {}".into() }];
        assert_eq!(render(&structure), "```rust\nfn main() {}\n```");
    }

    #[test]
    fn renders_pipe_table() {
        let structure = vec![StructureNode::Table {
            headers: vec!["A".into(), "B".into()],
            rows: vec![vec!["1".into(), "2".into()]],
        }];
        let rendered = render(&structure);
        assert!(rendered.contains("| A | B |"));
        assert!(rendered.contains("| --- | --- |"));
        assert!(rendered.contains("| 1 | 2 |"));
    }

    #[test]
    fn renders_inline_link() {
        let structure = vec![StructureNode::Paragraph(vec![InlineNode::Link {
            href: "https://example.com".into(),
            text: "Example".into(),
        }])];
        assert_eq!(render(&structure), "[Example](https://example.com)");
    }

    #[test]
    fn collapses_more_than_two_blank_lines() {
        let collapsed = collapse_blank_lines("a\n\n\n\n\nb".to_string());
        assert_eq!(collapsed, "a\n\n\nb");
    }
}
