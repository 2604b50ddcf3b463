//! Generic syntax tree: an arena of kind-tagged nodes with parent links
//!
//! Nodes own their children through the arena (`children` holds ids in
//! source order); `parent` is a plain back-index and never owns anything.

use std::fmt;

use crate::parser::expr::{BinaryOperator, Literal, UnaryOperator};

/// Index of a node inside its [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The closed set of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Call,
    Keyword,
    List,
    Tuple,
    Constant,
    UnaryOp,
    BinOp,
    Attribute,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Call => "Call",
            NodeKind::Keyword => "Keyword",
            NodeKind::List => "List",
            NodeKind::Tuple => "Tuple",
            NodeKind::Constant => "Constant",
            NodeKind::UnaryOp => "UnaryOp",
            NodeKind::BinOp => "BinOp",
            NodeKind::Attribute => "Attribute",
        };
        write!(f, "{}", name)
    }
}

/// Kind-dependent payload of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Empty,
    /// Call target, keyword name or attribute name
    Ident(String),
    Literal(Literal),
    Unary(UnaryOperator),
    Binary(BinaryOperator),
}

impl NodeValue {
    pub fn ident(&self) -> Option<&str> {
        match self {
            NodeValue::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NodeValue::Empty)
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Empty => write!(f, "None"),
            NodeValue::Ident(name) => write!(f, "{}", name),
            NodeValue::Literal(lit) => write!(f, "{}", lit),
            NodeValue::Unary(UnaryOperator::Neg) => write!(f, "USub"),
            NodeValue::Unary(UnaryOperator::Pos) => write!(f, "UAdd"),
            NodeValue::Binary(op) => {
                let name = match op {
                    BinaryOperator::Add => "Add",
                    BinaryOperator::Sub => "Sub",
                    BinaryOperator::Mul => "Mult",
                    BinaryOperator::Div => "Div",
                    BinaryOperator::FloorDiv => "FloorDiv",
                    BinaryOperator::Mod => "Mod",
                    BinaryOperator::Pow => "Pow",
                };
                write!(f, "{}", name)
            }
        }
    }
}

/// A single tree node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub value: NodeValue,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena-backed tree with exactly one root
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Start a tree from its root node
    pub fn new(kind: NodeKind, value: NodeValue) -> Self {
        Self {
            nodes: vec![Node {
                kind,
                value,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Append a new child to `parent` and return its id
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind, value: NodeValue) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            value,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).children.last().copied()
    }

    /// Walk parent links up to the root
    pub fn base(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            current = parent;
        }
        current
    }

    /// Indented dump of the subtree rooted at `id`
    pub fn dump(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(id, 0, &mut out);
        out
    }

    fn dump_into(&self, id: NodeId, level: usize, out: &mut String) {
        let node = self.get(id);
        out.push_str(&"\t".repeat(level));
        out.push_str(&format!("{} | {}\n", node.kind, node.value));
        for child in &node.children {
            self.dump_into(*child, level + 1, out);
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dump(self.root()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_child_links_parent() {
        let mut tree = Tree::new(NodeKind::Call, NodeValue::Ident("ImageStack".into()));
        let root = tree.root();
        let list = tree.add_child(root, NodeKind::List, NodeValue::Empty);
        let item = tree.add_child(list, NodeKind::Constant, NodeValue::Literal(Literal::Int(1)));

        assert_eq!(tree.get(item).parent, Some(list));
        assert_eq!(tree.get(list).parent, Some(root));
        assert_eq!(tree.get(root).children, vec![list]);
        assert_eq!(tree.last_child(list), Some(item));
        assert_eq!(tree.last_child(item), None);
        assert_eq!(tree.base(item), root);
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = Tree::new(NodeKind::Tuple, NodeValue::Empty);
        let root = tree.root();
        let a = tree.add_child(root, NodeKind::Constant, NodeValue::Literal(Literal::Int(1)));
        let b = tree.add_child(root, NodeKind::Constant, NodeValue::Literal(Literal::Int(2)));
        assert_eq!(tree.get(root).children, vec![a, b]);
        assert_eq!(tree.len(), 3);
        assert!(!tree.is_empty());
    }

    #[test]
    fn test_dump_indents_with_tabs() {
        let mut tree = Tree::new(NodeKind::BinOp, NodeValue::Binary(BinaryOperator::Mul));
        let root = tree.root();
        tree.add_child(root, NodeKind::Constant, NodeValue::Literal(Literal::Str("a".into())));
        tree.add_child(root, NodeKind::Constant, NodeValue::Literal(Literal::Int(3)));
        assert_eq!(
            tree.to_string(),
            "BinOp | Mult\n\tConstant | 'a'\n\tConstant | 3\n"
        );
    }
}
