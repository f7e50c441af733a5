use crate::uast::errors::NodeError;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Deepest tree that serializes through serde.
///
/// Serde serializers recurse once per level, so deeper trees are refused
/// with [`NodeError::TooDeep`] instead. The binary codec has no limit.
pub const MAX_SERIALIZE_DEPTH: usize = 256;

/// A location in source code.
///
/// Lines and columns are 1-based, offsets are 0-based byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Point {
    pub fn new(line: u32, column: u32, offset: u32) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// Source span covered by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

impl Position {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

/// One vertex of a UAST.
///
/// A node exclusively owns its children, so a tree is always a finite rooted
/// tree. Nodes are built once (by a parser backend or by the codec) and only
/// exposed read-only afterwards.
///
/// Equality, cloning, formatting, traversal and drop never recurse on the
/// call stack, so tree depth is bounded by memory only. Serialization is
/// the exception and stops at [`MAX_SERIALIZE_DEPTH`].
#[derive(Deserialize)]
pub struct Node {
    #[serde(deserialize_with = "non_empty_kind")]
    kind: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    properties: BTreeMap<String, String>,
    #[serde(default)]
    roles: BTreeSet<String>,
    #[serde(default)]
    position: Option<Position>,
    #[serde(default)]
    children: Vec<Node>,
}

fn non_empty_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let kind = String::deserialize(deserializer)?;
    if kind.is_empty() {
        return Err(serde::de::Error::custom(NodeError::EmptyKind));
    }
    Ok(kind)
}

impl Node {
    /// Create a node with the given kind and no other data.
    pub fn new(kind: impl Into<String>) -> Result<Self, NodeError> {
        let kind = kind.into();
        if kind.is_empty() {
            return Err(NodeError::EmptyKind);
        }

        Ok(Self {
            kind,
            token: None,
            properties: BTreeMap::new(),
            roles: BTreeSet::new(),
            position: None,
            children: Vec::new(),
        })
    }

    /// Create a node from all of its raw fields.
    pub fn from_parts(
        kind: impl Into<String>,
        token: Option<String>,
        properties: BTreeMap<String, String>,
        roles: BTreeSet<String>,
        position: Option<Position>,
        children: Vec<Node>,
    ) -> Result<Self, NodeError> {
        let mut node = Self::new(kind)?;
        node.token = token;
        node.properties = properties;
        node.roles = roles;
        node.position = position;
        node.children = children;
        Ok(node)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Visit this node, then every child subtree in order.
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Number of nodes in this subtree, including this one.
    pub fn size(&self) -> usize {
        self.pre_order().count()
    }

    /// Length of the longest root-to-leaf path, counted in nodes.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        max
    }

    pub(crate) fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Drop the children of this node and return them.
    pub(crate) fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    /// Copy of this node's own fields, without children.
    fn shallow_clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            token: self.token.clone(),
            properties: self.properties.clone(),
            roles: self.roles.clone(),
            position: self.position,
            children: Vec::with_capacity(self.children.len()),
        }
    }

    fn shallow_eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.token == other.token
            && self.properties == other.properties
            && self.roles == other.roles
            && self.position == other.position
            && self.children.len() == other.children.len()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if !a.shallow_eq(b) {
                return false;
            }
            stack.extend(a.children.iter().zip(b.children.iter()));
        }
        true
    }
}

impl Eq for Node {}

impl Clone for Node {
    fn clone(&self) -> Self {
        let mut root = self.shallow_clone();

        // Pre-order copies of every descendant with the 1-based index of
        // their parent in `copies`; 0 is the root.
        let mut copies: Vec<(usize, Node)> = Vec::new();
        let mut stack: Vec<(usize, &Node)> =
            self.children.iter().rev().map(|child| (0, child)).collect();
        while let Some((parent, node)) = stack.pop() {
            copies.push((parent, node.shallow_clone()));
            let index = copies.len();
            stack.extend(node.children.iter().rev().map(|child| (index, child)));
        }

        // A node's descendants all sit after it, so it is complete when
        // popped. Siblings arrive last first.
        while let Some((parent, mut node)) = copies.pop() {
            node.children.reverse();
            match parent.checked_sub(1) {
                Some(index) => copies[index].1.children.push(node),
                None => root.children.push(node),
            }
        }
        root.children.reverse();
        root
    }
}

/// Indentation stops growing here; deeper lines carry their depth instead.
const DEBUG_INDENT_LIMIT: usize = 32;

impl fmt::Debug for Node {
    /// One line per node in pre-order, indented by depth.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if depth > 0 {
                writeln!(f)?;
            }
            write!(f, "{:indent$}", "", indent = depth.min(DEBUG_INDENT_LIMIT) * 2)?;
            if depth > DEBUG_INDENT_LIMIT {
                write!(f, "[{depth}] ")?;
            }
            f.write_str(&node.kind)?;
            if let Some(token) = &node.token {
                write!(f, " {token:?}")?;
            }
            if !node.roles.is_empty() {
                write!(f, " roles={:?}", node.roles)?;
            }
            if !node.properties.is_empty() {
                write!(f, " properties={:?}", node.properties)?;
            }
            if let Some(position) = &node.position {
                write!(
                    f,
                    " {}:{}-{}:{}",
                    position.start.line, position.start.column, position.end.line, position.end.column
                )?;
            }
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
        Ok(())
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let depth = self.depth();
        if depth > MAX_SERIALIZE_DEPTH {
            return Err(serde::ser::Error::custom(NodeError::TooDeep {
                depth,
                limit: MAX_SERIALIZE_DEPTH,
            }));
        }
        Checked(self).serialize(serializer)
    }
}

/// A node whose depth has already been checked.
struct Checked<'a>(&'a Node);

impl Serialize for Checked<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.0;
        let mut state = serializer.serialize_struct("Node", 6)?;
        state.serialize_field("kind", &node.kind)?;
        match &node.token {
            Some(token) => state.serialize_field("token", token)?,
            None => state.skip_field("token")?,
        }
        if node.properties.is_empty() {
            state.skip_field("properties")?;
        } else {
            state.serialize_field("properties", &node.properties)?;
        }
        if node.roles.is_empty() {
            state.skip_field("roles")?;
        } else {
            state.serialize_field("roles", &node.roles)?;
        }
        match &node.position {
            Some(position) => state.serialize_field("position", position)?,
            None => state.skip_field("position")?,
        }
        if node.children.is_empty() {
            state.skip_field("children")?;
        } else {
            let children: Vec<Checked<'_>> = node.children.iter().map(Checked).collect();
            state.serialize_field("children", &children)?;
        }
        state.end()
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if self.children.is_empty() {
            return;
        }

        // Flatten the subtree so dropping a deep chain does not overflow.
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Pre-order iterator over a subtree.
pub struct PreOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
