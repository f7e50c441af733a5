use crate::uast::Node;
use std::cmp::Ordering;

/// How a step moves from its context node to candidate nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `/name`: direct children.
    Child,
    /// `//name`: any descendant.
    Descendant,
    /// `.`: the context node itself.
    SelfNode,
    /// `//.`: the context node and every descendant.
    DescendantOrSelf,
}

impl Axis {
    pub fn reaches_descendants(&self) -> bool {
        matches!(self, Axis::Descendant | Axis::DescendantOrSelf)
    }

    pub fn includes_self(&self) -> bool {
        matches!(self, Axis::SelfNode | Axis::DescendantOrSelf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    Any,
    Kind(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    pub fn matches(&self, node: &Node) -> bool {
        let kind_ok = match &self.test {
            NodeTest::Any => true,
            NodeTest::Kind(kind) => node.kind() == kind,
        };
        kind_ok && self.predicates.iter().all(|p| p.eval(node))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPath {
    /// Anchored at the document rather than at the root node.
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionField {
    StartLine,
    StartCol,
    StartOffset,
    EndLine,
    EndCol,
    EndOffset,
}

/// Something a predicate can read from a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Token,
    Position(PositionField),
    /// `@roleX`: present when the node has role `X`.
    Role(String),
    Property(String),
}

impl Attribute {
    pub fn from_name(name: &str) -> Self {
        match name {
            "token" => Attribute::Token,
            "startLine" => Attribute::Position(PositionField::StartLine),
            "startCol" => Attribute::Position(PositionField::StartCol),
            "startOffset" => Attribute::Position(PositionField::StartOffset),
            "endLine" => Attribute::Position(PositionField::EndLine),
            "endCol" => Attribute::Position(PositionField::EndCol),
            "endOffset" => Attribute::Position(PositionField::EndOffset),
            _ => match name.strip_prefix("role") {
                Some(role) if !role.is_empty() => Attribute::Role(role.to_string()),
                _ => Attribute::Property(name.to_string()),
            },
        }
    }

    fn value<'a>(&self, node: &'a Node) -> Option<Value<'a>> {
        match self {
            Attribute::Token => node.token().map(Value::Text),
            Attribute::Position(field) => {
                let pos = node.position()?;
                let n = match field {
                    PositionField::StartLine => pos.start.line,
                    PositionField::StartCol => pos.start.column,
                    PositionField::StartOffset => pos.start.offset,
                    PositionField::EndLine => pos.end.line,
                    PositionField::EndCol => pos.end.column,
                    PositionField::EndOffset => pos.end.offset,
                };
                Some(Value::Number(u64::from(n)))
            }
            Attribute::Role(role) => node.has_role(role).then_some(Value::Text("true")),
            Attribute::Property(key) => node.property(key).map(Value::Text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Str(String),
    Number(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFn {
    Contains,
    StartsWith,
    EndsWith,
}

impl StringFn {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "contains" => Some(StringFn::Contains),
            "starts-with" => Some(StringFn::StartsWith),
            "ends-with" => Some(StringFn::EndsWith),
            _ => None,
        }
    }
}

/// Predicate expression inside `[...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Exists(Attribute),
    Compare {
        attribute: Attribute,
        op: CompareOp,
        literal: Literal,
    },
    Call {
        function: StringFn,
        attribute: Attribute,
        argument: String,
    },
}

impl Expr {
    pub fn eval(&self, node: &Node) -> bool {
        match self {
            Expr::Or(a, b) => a.eval(node) || b.eval(node),
            Expr::And(a, b) => a.eval(node) && b.eval(node),
            Expr::Not(inner) => !inner.eval(node),
            Expr::Exists(attribute) => attribute.value(node).is_some(),
            Expr::Compare {
                attribute,
                op,
                literal,
            } => attribute
                .value(node)
                .is_some_and(|value| op.holds(value.compare(literal))),
            Expr::Call {
                function,
                attribute,
                argument,
            } => attribute.value(node).is_some_and(|value| {
                let text = value.text();
                match function {
                    StringFn::Contains => text.contains(argument.as_str()),
                    StringFn::StartsWith => text.starts_with(argument.as_str()),
                    StringFn::EndsWith => text.ends_with(argument.as_str()),
                }
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Value<'a> {
    Text(&'a str),
    Number(u64),
}

impl Value<'_> {
    fn as_number(&self) -> Option<u64> {
        match self {
            Value::Text(s) => s.parse().ok(),
            Value::Number(n) => Some(*n),
        }
    }

    fn text(&self) -> String {
        match self {
            Value::Text(s) => s.to_string(),
            Value::Number(n) => n.to_string(),
        }
    }

    /// Compare numerically when both sides are numbers, else as strings.
    fn compare(&self, literal: &Literal) -> Ordering {
        let literal_number = match literal {
            Literal::Number(n) => Some(*n),
            Literal::Str(s) => s.parse().ok(),
        };

        match (self.as_number(), literal_number) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => {
                let literal_text = match literal {
                    Literal::Str(s) => s.clone(),
                    Literal::Number(n) => n.to_string(),
                };
                self.text().cmp(&literal_text)
            }
        }
    }
}
