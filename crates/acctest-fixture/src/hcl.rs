//! Minimal HCL document model and serializer.
//!
//! Only the subset needed to express Terraform resource blocks is modelled:
//! labelled blocks, attributes, nested blocks, lists, maps and interpolated
//! references. Documents are produced here and consumed by `terraform`; they
//! are never parsed back.

use std::fmt::Write as _;

/// An attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    /// A numeric literal, kept as text so decimals are emitted verbatim.
    Num(String),
    Bool(bool),
    List(Vec<Expr>),
    /// Ordered key/value pairs; keys are always quoted.
    Map(Vec<(String, Expr)>),
    /// Reference to another resource's attribute, e.g.
    /// `azurerm_resource_group.test.location`. Rendered as `"${...}"`.
    Ref(String),
}

impl Expr {
    pub fn str(s: impl Into<String>) -> Self {
        Expr::Str(s.into())
    }

    pub fn num(n: impl ToString) -> Self {
        Expr::Num(n.to_string())
    }

    pub fn reference(path: impl Into<String>) -> Self {
        Expr::Ref(path.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Attr(String, Expr),
    Block(Block),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    items: Vec<Item>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute. Returns `&mut self` for chaining.
    pub fn attr(&mut self, key: impl Into<String>, value: Expr) -> &mut Self {
        self.items.push(Item::Attr(key.into(), value));
        self
    }

    /// Append a nested block. Repeated blocks keep their insertion order.
    pub fn block(&mut self, block: Block) -> &mut Self {
        self.items.push(Item::Block(block));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: String,
    pub labels: Vec<String>,
    pub body: Body,
}

impl Block {
    pub fn new(kind: impl Into<String>) -> Self {
        Block { kind: kind.into(), labels: Vec::new(), body: Body::new() }
    }

    /// A top-level `resource "<type>" "<alias>" { ... }` block.
    pub fn resource(resource_type: &str, alias: &str, body: Body) -> Self {
        Block {
            kind: "resource".into(),
            labels: vec![resource_type.to_string(), alias.to_string()],
            body,
        }
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    /// Serialize to HCL text. Attribute `=` signs are aligned per body the
    /// way `terraform fmt` does for consecutive attributes.
    pub fn to_hcl(&self) -> String {
        let mut out = String::new();
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            write_block(&mut out, block, 0);
        }
        out
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hcl())
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_block(out: &mut String, block: &Block, depth: usize) {
    indent(out, depth);
    out.push_str(&block.kind);
    for label in &block.labels {
        let _ = write!(out, " \"{}\"", escape(label));
    }
    out.push_str(" {\n");
    write_body(out, &block.body, depth + 1);
    indent(out, depth);
    out.push_str("}\n");
}

fn write_body(out: &mut String, body: &Body, depth: usize) {
    let width = body
        .items
        .iter()
        .filter_map(|item| match item {
            Item::Attr(k, _) => Some(k.len()),
            Item::Block(_) => None,
        })
        .max()
        .unwrap_or(0);

    let mut prev_was_attr = false;
    for item in &body.items {
        match item {
            Item::Attr(key, value) => {
                indent(out, depth);
                let _ = write!(out, "{:<width$} = ", key, width = width);
                write_expr(out, value, depth);
                out.push('\n');
                prev_was_attr = true;
            }
            Item::Block(block) => {
                if prev_was_attr {
                    out.push('\n');
                }
                write_block(out, block, depth);
                prev_was_attr = false;
            }
        }
    }
}

fn write_expr(out: &mut String, expr: &Expr, depth: usize) {
    match expr {
        Expr::Str(s) => {
            let _ = write!(out, "\"{}\"", escape(s));
        }
        Expr::Num(n) => out.push_str(n),
        Expr::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Expr::Ref(path) => {
            let _ = write!(out, "\"${{{}}}\"", path);
        }
        Expr::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, item, depth);
            }
            out.push(']');
        }
        Expr::Map(entries) => {
            if entries.is_empty() {
                out.push_str("{}");
                return;
            }
            let width = entries.iter().map(|(k, _)| escape(k).len() + 2).max().unwrap_or(0);
            out.push_str("{\n");
            for (key, value) in entries {
                indent(out, depth + 1);
                let quoted = format!("\"{}\"", escape(key));
                let _ = write!(out, "{:<width$} = ", quoted, width = width);
                write_expr(out, value, depth + 1);
                out.push('\n');
            }
            indent(out, depth);
            out.push('}');
        }
    }
}

/// Escape a literal so it can never be read as an interpolation or template
/// directive.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
