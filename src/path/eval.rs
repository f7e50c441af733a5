use crate::path::ast::{Axis, LocationPath};
use crate::path::errors::PathError;
use crate::path::parser;
use crate::uast::Node;
use std::rc::Rc;

/// A compiled path expression.
///
/// Each location path runs as a small automaton over its steps: bit `i` of
/// a state means "step `i` may start here". Evaluation is a single
/// pre-order walk that carries one state per path down the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    source: String,
    paths: Vec<CompiledPath>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CompiledPath {
    path: LocationPath,
    /// Steps taken from the parent's context set.
    child_mask: u128,
    /// Steps whose context carries down to every descendant.
    desc_mask: u128,
}

/// Automaton state for one path at one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct State {
    /// Steps for which this node is the context node.
    ctx: u128,
    /// Descendant steps whose context is this node or one of its ancestors.
    desc: u128,
}

impl State {
    fn is_dead(&self) -> bool {
        self.ctx == 0 && self.desc == 0
    }
}

impl CompiledPath {
    fn new(path: LocationPath) -> Self {
        let mut child_mask = 0u128;
        let mut desc_mask = 0u128;
        for (i, step) in path.steps.iter().enumerate() {
            match step.axis {
                Axis::Child => child_mask |= 1 << i,
                axis if axis.reaches_descendants() => desc_mask |= 1 << i,
                _ => {}
            }
        }
        Self {
            path,
            child_mask,
            desc_mask,
        }
    }

    fn len(&self) -> usize {
        self.path.steps.len()
    }

    /// Advance steps that include the context node itself, lowest first so
    /// chains like `./.` settle in one pass.
    fn close_over_self(&self, node: &Node, mut ctx: u128) -> u128 {
        for (i, step) in self.path.steps.iter().enumerate() {
            if ctx & (1 << i) != 0 && step.axis.includes_self() && step.matches(node) {
                ctx |= 1 << (i + 1);
            }
        }
        ctx
    }

    /// State of the root before any node is visited.
    fn document_state(&self) -> State {
        State {
            ctx: 1,
            desc: 1 & self.desc_mask,
        }
    }

    /// Compute the state of `node` from its parent's; returns whether the
    /// node completes the path.
    fn advance(&self, parent: State, node: &Node) -> (State, bool) {
        let candidates = (parent.ctx & self.child_mask) | parent.desc;
        let mut reached = 0u128;
        for (i, step) in self.path.steps.iter().enumerate() {
            if candidates & (1 << i) != 0 && step.matches(node) {
                reached |= 1 << (i + 1);
            }
        }
        self.settle(parent.desc, node, reached)
    }

    /// State of the root for a relative path, where the root is the context.
    fn root_state(&self, root: &Node) -> (State, bool) {
        self.settle(0, root, 1)
    }

    fn settle(&self, inherited_desc: u128, node: &Node, reached: u128) -> (State, bool) {
        let n = self.len();
        let reached = self.close_over_self(node, reached);
        let matched = reached & (1 << n) != 0;
        let ctx = reached & ((1 << n) - 1);
        let desc = inherited_desc | (ctx & self.desc_mask);
        (State { ctx, desc }, matched)
    }
}

impl PathQuery {
    pub fn compile(query: &str) -> Result<Self, PathError> {
        let paths = parser::parse(query)?
            .into_iter()
            .map(CompiledPath::new)
            .collect();
        Ok(Self {
            source: query.to_string(),
            paths,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Every node selected by the query, in document order.
    ///
    /// A node selected by several union branches appears once, and the
    /// subtree of a selected node is still searched.
    pub fn evaluate<'a>(&self, root: &'a Node) -> Vec<&'a Node> {
        let mut matches = Vec::new();

        let mut root_states = Vec::with_capacity(self.paths.len());
        let mut root_matched = false;
        for path in &self.paths {
            let (state, matched) = if path.path.absolute {
                path.advance(path.document_state(), root)
            } else {
                path.root_state(root)
            };
            root_matched |= matched;
            root_states.push(state);
        }
        if root_matched {
            matches.push(root);
        }

        let mut stack: Vec<(&Node, Rc<[State]>)> = Vec::new();
        push_children(&mut stack, root, root_states);

        while let Some((node, parent_states)) = stack.pop() {
            let mut states = Vec::with_capacity(self.paths.len());
            let mut matched = false;
            for (path, parent) in self.paths.iter().zip(parent_states.iter()) {
                let (state, hit) = if parent.is_dead() {
                    (State::default(), false)
                } else {
                    path.advance(*parent, node)
                };
                matched |= hit;
                states.push(state);
            }
            if matched {
                matches.push(node);
            }
            push_children(&mut stack, node, states);
        }

        matches
    }
}

fn push_children<'a>(stack: &mut Vec<(&'a Node, Rc<[State]>)>, node: &'a Node, states: Vec<State>) {
    if node.is_leaf() || states.iter().all(State::is_dead) {
        return;
    }
    let states: Rc<[State]> = states.into();
    for child in node.children().iter().rev() {
        stack.push((child, Rc::clone(&states)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: &str, token: &str) -> Node {
        Node::new(kind).unwrap().with_token(token).with_role("Identifier")
    }

    // Module
    //   FunctionDefinition
    //     Identifier(sum)
    //     Block
    //       Return
    //         Identifier(a)
    //   Call
    //     Identifier(print)
    fn sample() -> Node {
        Node::new("Module")
            .unwrap()
            .with_child(
                Node::new("FunctionDefinition")
                    .unwrap()
                    .with_child(leaf("Identifier", "sum"))
                    .with_child(
                        Node::new("Block").unwrap().with_child(
                            Node::new("Return")
                                .unwrap()
                                .with_role("Return")
                                .with_child(leaf("Identifier", "a")),
                        ),
                    ),
            )
            .with_child(
                Node::new("Call")
                    .unwrap()
                    .with_role("Call")
                    .with_child(leaf("Identifier", "print")),
            )
    }

    fn select(query: &str, tree: &Node) -> Vec<String> {
        PathQuery::compile(query)
            .unwrap()
            .evaluate(tree)
            .into_iter()
            .map(|n| n.token().unwrap_or(n.kind()).to_string())
            .collect()
    }

    #[test]
    fn descendant_role_query_in_document_order() {
        assert_eq!(
            select("//*[@roleIdentifier]", &sample()),
            vec!["sum", "a", "print"]
        );
    }

    #[test]
    fn absolute_paths_start_above_the_root() {
        let tree = sample();
        assert_eq!(select("/Module", &tree), vec!["Module"]);
        assert!(select("/FunctionDefinition", &tree).is_empty());
        assert_eq!(select("/Module/Call/Identifier", &tree), vec!["print"]);
        assert_eq!(select("//Module", &tree), vec!["Module"]);
    }

    #[test]
    fn relative_paths_start_at_the_root() {
        let tree = sample();
        assert_eq!(select("FunctionDefinition/Identifier", &tree), vec!["sum"]);
        assert_eq!(select(".", &tree), vec!["Module"]);
        assert_eq!(select("./Call", &tree), vec!["Call"]);
        assert!(select("Module", &tree).is_empty());
    }

    #[test]
    fn descendant_or_self() {
        let tree = sample();
        assert_eq!(tree.size(), 8);
        assert_eq!(select("//.", &tree).len(), 8);
        assert_eq!(
            select("/Module/FunctionDefinition//./Identifier", &tree),
            vec!["sum", "a"]
        );
    }

    #[test]
    fn nested_descendant_steps() {
        let tree = sample();
        assert_eq!(select("//FunctionDefinition//Identifier", &tree), vec!["sum", "a"]);
        assert_eq!(select("//Block//Return/Identifier", &tree), vec!["a"]);
        assert!(select("//Call//Return", &tree).is_empty());
    }

    #[test]
    fn matching_is_inclusive() {
        let tree = Node::new("Block")
            .unwrap()
            .with_token("outer")
            .with_child(
                Node::new("Block")
                    .unwrap()
                    .with_token("middle")
                    .with_child(Node::new("Block").unwrap().with_token("inner")),
            );
        assert_eq!(select("//Block", &tree), vec!["outer", "middle", "inner"]);
        assert_eq!(select("//Block/Block", &tree), vec!["middle", "inner"]);
    }

    #[test]
    fn unions_are_merged_in_document_order() {
        let tree = sample();
        assert_eq!(
            select("//Call | //Identifier[@token='sum'] | //Call", &tree),
            vec!["sum", "Call"]
        );
        assert_eq!(
            select("//*[@roleCall] | //*[@roleIdentifier]", &tree),
            vec!["sum", "a", "Call", "print"]
        );
    }

    #[test]
    fn predicates_filter_steps() {
        let tree = sample();
        assert_eq!(
            select("//Identifier[starts-with(@token, 'p') or @token='a']", &tree),
            vec!["a", "print"]
        );
        assert_eq!(
            select("//*[not(@roleIdentifier) and @roleReturn]/Identifier", &tree),
            vec!["a"]
        );
    }

    #[test]
    fn evaluation_is_deterministic() {
        let query = PathQuery::compile("//*[@roleIdentifier] | //Block").unwrap();
        let (a, b) = (sample(), sample());
        let left: Vec<_> = query.evaluate(&a).into_iter().cloned().collect();
        let right: Vec<_> = query.evaluate(&b).into_iter().cloned().collect();
        assert_eq!(left, right);
        assert_eq!(query.as_str(), "//*[@roleIdentifier] | //Block");
    }

    #[test]
    fn deep_chains_are_walked_iteratively() {
        let mut node = Node::new("Leaf").unwrap();
        for _ in 0..100_000 {
            node = Node::new("Wrap").unwrap().with_child(node);
        }
        assert_eq!(select("//Leaf", &node), vec!["Leaf"]);
        assert_eq!(select("//Wrap", &node).len(), 100_000);
    }

    #[test]
    fn longest_path_fits() {
        let mut node = Node::new("a").unwrap();
        for _ in 1..parser::MAX_STEPS {
            node = Node::new("a").unwrap().with_child(node);
        }
        let query = vec!["a"; parser::MAX_STEPS].join("/");
        assert_eq!(select(&format!("/{query}"), &node).len(), 1);
    }

    #[test]
    fn queries_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PathQuery>();
    }
}
