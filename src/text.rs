//! Rich-text flattening.
//!
//! Documents may carry structured rich content (a ProseMirror-style JSON tree)
//! instead of a precomputed plain-text body. The engine only needs plain
//! text, so flattening sits behind [`TextFlattener`] and can be swapped for
//! whatever the editing layer uses.

use serde_json::Value;

/// Turns structured rich content into plain text.
pub trait TextFlattener: Send + Sync {
    fn flatten(&self, content: &Value) -> String;
}

/// Flattener for ProseMirror/TipTap-style node trees.
///
/// Block nodes are separated by blank lines so the chunker sees paragraph
/// boundaries. Headings are rendered as Markdown (`## Title`) and code blocks
/// as fenced blocks so that section and code metadata survive flattening.
#[derive(Debug, Clone, Copy, Default)]
pub struct RichTextFlattener;

impl TextFlattener for RichTextFlattener {
    fn flatten(&self, content: &Value) -> String {
        let mut blocks = Vec::new();
        collect_blocks(content, &mut blocks);
        blocks.join("\n\n")
    }
}

fn collect_blocks(node: &Value, blocks: &mut Vec<String>) {
    match node {
        Value::String(text) => push_block(blocks, text.clone()),
        Value::Array(items) => {
            for item in items {
                collect_blocks(item, blocks);
            }
        }
        Value::Object(map) => {
            let node_type = map.get("type").and_then(Value::as_str).unwrap_or_default();
            match node_type {
                "paragraph" => push_block(blocks, inline_text(node)),
                "heading" => {
                    let level = map
                        .get("attrs")
                        .and_then(|attrs| attrs.get("level"))
                        .and_then(Value::as_u64)
                        .unwrap_or(1)
                        .clamp(1, 6) as usize;
                    let text = inline_text(node);
                    if !text.trim().is_empty() {
                        blocks.push(format!("{} {}", "#".repeat(level), text.trim()));
                    }
                }
                "codeBlock" | "code_block" => {
                    let text = inline_text(node);
                    if !text.trim().is_empty() {
                        blocks.push(format!("```\n{}\n```", text));
                    }
                }
                "text" => {
                    if let Some(text) = map.get("text").and_then(Value::as_str) {
                        push_block(blocks, text.to_string());
                    }
                }
                _ => {
                    if let Some(children) = map.get("content") {
                        collect_blocks(children, blocks);
                    } else if let Some(text) = map.get("text").and_then(Value::as_str) {
                        push_block(blocks, text.to_string());
                    }
                }
            }
        }
        _ => {}
    }
}

fn push_block(blocks: &mut Vec<String>, text: String) {
    if !text.trim().is_empty() {
        blocks.push(text);
    }
}

/// Concatenate the inline text below a block node.
fn inline_text(node: &Value) -> String {
    let mut out = String::new();
    append_inline(node, &mut out);
    out
}

fn append_inline(node: &Value, out: &mut String) {
    match node {
        Value::String(text) => out.push_str(text),
        Value::Array(items) => {
            for item in items {
                append_inline(item, out);
            }
        }
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("hardBreak") {
                out.push('\n');
                return;
            }
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
            if let Some(children) = map.get("content") {
                append_inline(children, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_paragraphs_and_headings() {
        let doc = json!({
            "type": "doc",
            "content": [
                {"type": "heading", "attrs": {"level": 2}, "content": [{"type": "text", "text": "Overview"}]},
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "First "},
                    {"type": "text", "text": "paragraph."}
                ]},
                {"type": "paragraph", "content": [{"type": "text", "text": "Second."}]}
            ]
        });

        let text = RichTextFlattener.flatten(&doc);
        assert_eq!(text, "## Overview\n\nFirst paragraph.\n\nSecond.");
    }

    #[test]
    fn test_flatten_lists_and_code() {
        let doc = json!({
            "type": "doc",
            "content": [
                {"type": "bulletList", "content": [
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "one"}]}
                    ]},
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "two"}]}
                    ]}
                ]},
                {"type": "codeBlock", "content": [{"type": "text", "text": "let x = 1;"}]}
            ]
        });

        let text = RichTextFlattener.flatten(&doc);
        assert_eq!(text, "one\n\ntwo\n\n```\nlet x = 1;\n```");
    }

    #[test]
    fn test_flatten_hard_break_and_empty_nodes() {
        let doc = json!({
            "type": "doc",
            "content": [
                {"type": "paragraph"},
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "line one"},
                    {"type": "hardBreak"},
                    {"type": "text", "text": "line two"}
                ]}
            ]
        });

        assert_eq!(RichTextFlattener.flatten(&doc), "line one\nline two");
    }

    #[test]
    fn test_flatten_plain_string() {
        assert_eq!(RichTextFlattener.flatten(&json!("just text")), "just text");
        assert_eq!(RichTextFlattener.flatten(&json!(null)), "");
    }
}
