//! Page model for one letter group, rendered either as HTML or as the node
//! tree the page service accepts.

use serde_json::{Value, json};

use crate::partition::LetterGroup;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(String),
    Link { href: String, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(String),
    Paragraph(Vec<Inline>),
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDraft {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl PageDraft {
    /// Builds the page for a letter group: a header with the letter and item
    /// count, then every record as a numbered link in group order.
    pub fn for_group(title_prefix: &str, group: &LetterGroup<'_>) -> Self {
        let letter = group.letter.to_string();
        let mut blocks = Vec::with_capacity(group.len() + 3);
        blocks.push(Block::Heading(format!(
            "📚 {title_prefix} - Letter {letter}"
        )));
        blocks.push(Block::Paragraph(vec![Inline::Strong(format!(
            "Books starting with \"{letter}\": {}",
            group.len()
        ))]));
        blocks.push(Block::Rule);
        for (idx, record) in group.records.iter().enumerate() {
            blocks.push(Block::Paragraph(vec![
                Inline::Text(format!("{}. ", idx + 1)),
                Inline::Link {
                    href: record.link.clone(),
                    text: record.title.clone(),
                },
            ]));
        }

        Self {
            title: format!("{title_prefix} - {}", group.letter.label()),
            blocks,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Heading(text) => {
                    out.push_str(&format!("<h3>{}</h3>", escape_html(text)));
                }
                Block::Paragraph(inlines) => {
                    out.push_str("<p>");
                    for inline in inlines {
                        match inline {
                            Inline::Text(t) => out.push_str(&escape_html(t)),
                            Inline::Strong(t) => {
                                out.push_str(&format!("<strong>{}</strong>", escape_html(t)))
                            }
                            Inline::Link { href, text } => out.push_str(&format!(
                                "<a href=\"{}\">{}</a>",
                                escape_html(href),
                                escape_html(text)
                            )),
                        }
                    }
                    out.push_str("</p>");
                }
                Block::Rule => out.push_str("<hr>"),
            }
        }
        out
    }

    pub fn to_nodes(&self) -> Value {
        let nodes: Vec<Value> = self
            .blocks
            .iter()
            .map(|block| match block {
                Block::Heading(text) => json!({ "tag": "h3", "children": [text] }),
                Block::Paragraph(inlines) => {
                    let children: Vec<Value> = inlines
                        .iter()
                        .map(|inline| match inline {
                            Inline::Text(t) => Value::String(t.clone()),
                            Inline::Strong(t) => json!({ "tag": "strong", "children": [t] }),
                            Inline::Link { href, text } => json!({
                                "tag": "a",
                                "attrs": { "href": href },
                                "children": [text],
                            }),
                        })
                        .collect();
                    json!({ "tag": "p", "children": children })
                }
                Block::Rule => json!({ "tag": "hr" }),
            })
            .collect();
        Value::Array(nodes)
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
