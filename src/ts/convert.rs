//! Conversion from tree-sitter trees to UAST nodes, one shape per mode.
//!
//! * `Native` keeps every grammar node, named or anonymous, under its raw
//!   kind.
//! * `Annotated` keeps named nodes, renames kinds to PascalCase and adds
//!   roles, `nativeKind` and `internalRole` (the field name in the parent).
//! * `Semantic` is the annotated shape without comments, properties and
//!   positions, with single-child wrapper nodes replaced by their child.

use crate::client::ParseMode;
use crate::ts::roles::roles_for;
use crate::uast::{Node, NodeError, Point, Position};

/// Grammar kinds that only wrap a single expression.
const WRAPPER_KINDS: &[&str] = &[
    "expression_statement",
    "parenthesized_expression",
    "expression_list",
];

const PLACEHOLDER_KIND: &str = "_";

struct Open {
    node: Node,
    native_kind: &'static str,
}

/// Build the UAST for `root` in the given mode.
///
/// The tree-sitter cursor drives an explicit stack, so deeply nested source
/// does not recurse.
pub fn convert(
    root: tree_sitter::Node<'_>,
    source: &[u8],
    mode: ParseMode,
) -> Result<Node, NodeError> {
    let mut cursor = root.walk();
    let mut open: Vec<Open> = Vec::new();
    let mut kept: Vec<bool> = Vec::new();
    let mut result: Option<Node> = None;

    loop {
        let ts_node = cursor.node();
        let is_root = kept.is_empty();
        let keep = is_root || keeps(ts_node, mode);
        if keep {
            open.push(Open {
                node: build(ts_node, cursor.field_name(), source, mode)?,
                native_kind: ts_node.kind(),
            });
        }
        kept.push(keep);

        if cursor.goto_first_child() {
            continue;
        }

        loop {
            if kept.pop().unwrap_or(false) {
                if let Some(finished) = open.pop() {
                    let node = finish(finished, mode);
                    match open.last_mut() {
                        Some(parent) => parent.node.push_child(node),
                        None => result = Some(node),
                    }
                }
            }

            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return match result {
                    Some(node) => Ok(node),
                    None => placeholder(root.kind()),
                };
            }
        }
    }
}

fn keeps(node: tree_sitter::Node<'_>, mode: ParseMode) -> bool {
    match mode {
        ParseMode::Native => true,
        ParseMode::Annotated => node.is_named(),
        ParseMode::Semantic => node.is_named() && !is_comment(node),
    }
}

fn is_comment(node: tree_sitter::Node<'_>) -> bool {
    node.is_extra() || node.kind().contains("comment")
}

fn build(
    ts_node: tree_sitter::Node<'_>,
    field: Option<&str>,
    source: &[u8],
    mode: ParseMode,
) -> Result<Node, NodeError> {
    let native_kind = ts_node.kind();
    let kind = match mode {
        ParseMode::Native => native_kind.to_string(),
        ParseMode::Annotated | ParseMode::Semantic => pascal_case(native_kind),
    };
    let mut node = placeholder(&kind)?;

    let is_token = match mode {
        ParseMode::Native => ts_node.child_count() == 0,
        ParseMode::Annotated | ParseMode::Semantic => ts_node.named_child_count() == 0,
    };
    if is_token {
        node = node.with_token(text(ts_node, source));
    }

    match mode {
        ParseMode::Native => {
            if let Some(field) = field {
                node = node.with_property("field", field);
            }
            if ts_node.is_extra() {
                node = node.with_property("extra", "true");
            }
            node = node.with_position(position(ts_node));
        }
        ParseMode::Annotated => {
            node = node.with_property("nativeKind", native_kind);
            if let Some(field) = field {
                node = node.with_property("internalRole", field);
            }
            node = with_roles(node, native_kind);
            node = node.with_position(position(ts_node));
        }
        ParseMode::Semantic => {
            node = with_roles(node, native_kind);
        }
    }

    Ok(node)
}

fn finish(open: Open, mode: ParseMode) -> Node {
    let Open {
        mut node,
        native_kind,
    } = open;

    if mode == ParseMode::Semantic
        && WRAPPER_KINDS.contains(&native_kind)
        && node.children().len() == 1
    {
        if let Some(child) = node.take_children().pop() {
            return child;
        }
    }

    node
}

fn with_roles(node: Node, native_kind: &str) -> Node {
    roles_for(native_kind)
        .iter()
        .fold(node, |node, role| node.with_role(*role))
}

fn placeholder(kind: &str) -> Result<Node, NodeError> {
    if kind.is_empty() {
        Node::new(PLACEHOLDER_KIND)
    } else {
        Node::new(kind)
    }
}

fn text(node: tree_sitter::Node<'_>, source: &[u8]) -> String {
    let range = node.byte_range();
    let end = range.end.min(source.len());
    let start = range.start.min(end);
    String::from_utf8_lossy(&source[start..end]).into_owned()
}

fn position(node: tree_sitter::Node<'_>) -> Position {
    let start = node.start_position();
    let end = node.end_position();
    Position::new(
        Point::new(
            saturate(start.row + 1),
            saturate(start.column + 1),
            saturate(node.start_byte()),
        ),
        Point::new(
            saturate(end.row + 1),
            saturate(end.column + 1),
            saturate(node.end_byte()),
        ),
    )
}

/// Config validation keeps sources within `u32::MAX` bytes and rows and
/// columns never exceed the byte count, so the clamp is never reached.
fn saturate(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// `function_definition` -> `FunctionDefinition`.
pub fn pascal_case(kind: &str) -> String {
    let converted: String = kind
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if converted.is_empty() {
        kind.to_string()
    } else {
        converted
    }
}
