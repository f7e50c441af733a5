/// A syntax problem reported by tree-sitter as an ERROR or MISSING node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start_point: tree_sitter::Point,
    pub end_point: tree_sitter::Point,
    pub missing: Option<&'static str>,
}

impl SyntaxIssue {
    /// Human-readable diagnostic with 1-based line:column positions.
    pub fn describe(&self) -> String {
        let span = format!(
            "{}:{}..{}:{}",
            self.start_point.row + 1,
            self.start_point.column + 1,
            self.end_point.row + 1,
            self.end_point.column + 1
        );
        match self.missing {
            Some(kind) => format!("missing '{kind}' at {span}"),
            None => format!("syntax error at {span}"),
        }
    }
}

/// Collect every ERROR and MISSING node below `root`, in document order.
pub fn syntax_issues(root: tree_sitter::Node<'_>) -> Vec<SyntaxIssue> {
    let mut issues = Vec::new();
    if !root.has_error() {
        return issues;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            issues.push(SyntaxIssue {
                byte_start: node.start_byte(),
                byte_end: node.end_byte(),
                start_point: node.start_position(),
                end_point: node.end_position(),
                missing: node.is_missing().then(|| node.kind()),
            });
            continue;
        }

        if !node.has_error() {
            continue;
        }

        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    issues
}
