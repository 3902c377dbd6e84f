//! Typed template for the generated nginx configuration.
//!
//! The finalizer knows most settings at build time, but a few are decided
//! when the container boots (`ENABLE_HTTP2`, `FORCE_HTTPS`, `PORT`,
//! `APP_ROOT`). Those are emitted as ERB tags that the boot step expands.
//! Rather than splicing strings, the configuration is first built as a tree
//! of [`Node`]s:
//!
//! | Node | Rendered as |
//! |---|---|
//! | [`Node::Line`] | one directive line, known at build time |
//! | [`Node::Block`] | `header {` … `}` around nested nodes |
//! | [`Node::WhenEnv`] | `<% if ENV["VAR"] %>` … `<% else %>` … `<% end %>` |
//! | [`Node::Blank`] | an empty line |
//!
//! Which nodes exist is a pure function of the configuration, so tests can
//! assert on the tree without rendering, and rendering only has to get
//! indentation right.

use std::fmt::Write;

const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Line(String),
    Block { header: String, body: Vec<Node> },
    WhenEnv {
        var: &'static str,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Blank,
}

impl Node {
    pub fn line(text: impl Into<String>) -> Self {
        Node::Line(text.into())
    }

    pub fn block(header: impl Into<String>, body: Vec<Node>) -> Self {
        Node::Block {
            header: header.into(),
            body,
        }
    }

    /// Branch on whether `var` is set in the boot environment.
    pub fn when_env(var: &'static str, then: Vec<Node>, otherwise: Vec<Node>) -> Self {
        Node::WhenEnv {
            var,
            then,
            otherwise,
        }
    }

    /// True if the node, or anything nested in it, defers to the boot
    /// environment variable `var`.
    pub fn defers_to(&self, var: &str) -> bool {
        match self {
            Node::WhenEnv {
                var: v,
                then,
                otherwise,
            } => *v == var || then.iter().chain(otherwise).any(|n| n.defers_to(var)),
            Node::Block { body, .. } => body.iter().any(|n| n.defers_to(var)),
            Node::Line(_) | Node::Blank => false,
        }
    }
}

/// ERB expression inserting the boot-time value of `var`.
pub fn env_value(var: &str) -> String {
    format!("<%= ENV[\"{var}\"] %>")
}

/// Render nodes to text, two spaces per nesting level.
pub fn render(nodes: &[Node]) -> String {
    let mut out = String::new();
    render_into(&mut out, nodes, 0);
    out
}

fn render_into(out: &mut String, nodes: &[Node], depth: usize) {
    let pad = INDENT.repeat(depth);
    for node in nodes {
        match node {
            Node::Line(text) => {
                let _ = writeln!(out, "{pad}{text}");
            }
            Node::Blank => out.push('\n'),
            Node::Block { header, body } => {
                let _ = writeln!(out, "{pad}{header} {{");
                render_into(out, body, depth + 1);
                let _ = writeln!(out, "{pad}}}");
            }
            Node::WhenEnv {
                var,
                then,
                otherwise,
            } => {
                let _ = writeln!(out, "{pad}<% if ENV[\"{var}\"] %>");
                render_into(out, then, depth + 1);
                if !otherwise.is_empty() {
                    let _ = writeln!(out, "{pad}<% else %>");
                    render_into(out, otherwise, depth + 1);
                }
                let _ = writeln!(out, "{pad}<% end %>");
            }
        }
    }
}
