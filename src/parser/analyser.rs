//! Lowering of the syntactic expression into the generic node tree
//!
//! One depth-first pass, one node per recognised construct. Nothing is
//! evaluated here.

use tracing::trace;

use crate::error::ParseError;
use crate::parser::expr::{Argument, Expr, Spanned};
use crate::parser::grammar::parse_expr;
use crate::parser::tree::{NodeId, NodeKind, NodeValue, Tree};

/// Something that becomes exactly one node
enum Item<'a> {
    Expr(&'a Spanned<Expr>),
    Keyword(&'a str, &'a Spanned<Expr>),
}

/// Parse template text into a generic node tree
pub fn analyse(text: &str) -> Result<Tree, Vec<ParseError>> {
    let expr = parse_expr(text)?;
    let tree = lower(&expr).map_err(|e| vec![e])?;
    trace!(nodes = tree.len(), "analysed template text");
    Ok(tree)
}

/// Lower an already parsed expression
pub fn lower(expr: &Spanned<Expr>) -> Result<Tree, ParseError> {
    let (kind, value, children) = shape(&Item::Expr(expr))?;
    let mut tree = Tree::new(kind, value);
    let root = tree.root();
    for child in children {
        attach(&mut tree, root, &child)?;
    }
    Ok(tree)
}

fn attach(tree: &mut Tree, parent: NodeId, item: &Item<'_>) -> Result<(), ParseError> {
    let (kind, value, children) = shape(item)?;
    let id = tree.add_child(parent, kind, value);
    for child in children {
        attach(tree, id, &child)?;
    }
    Ok(())
}

fn shape<'a>(item: &Item<'a>) -> Result<(NodeKind, NodeValue, Vec<Item<'a>>), ParseError> {
    let expr = match item {
        Item::Keyword(name, value) => {
            return Ok((
                NodeKind::Keyword,
                NodeValue::Ident(name.to_string()),
                vec![Item::Expr(value)],
            ))
        }
        Item::Expr(expr) => *expr,
    };

    let shaped = match &expr.node {
        Expr::Call { func, args } => {
            let arguments = args.iter().map(|arg| match arg {
                Argument::Positional(value) => Item::Expr(value),
                Argument::Keyword { name, value } => Item::Keyword(&name.node, value),
            });
            match &func.node {
                // `Foo(...)` keeps the callee name on the call itself
                Expr::Name(name) => (
                    NodeKind::Call,
                    NodeValue::Ident(name.clone()),
                    arguments.collect(),
                ),
                _ => {
                    let mut children = vec![Item::Expr(func)];
                    children.extend(arguments);
                    (NodeKind::Call, NodeValue::Empty, children)
                }
            }
        }
        Expr::Name(name) => {
            return Err(ParseError::syntax(
                expr.span.clone(),
                format!("name '{}' can only be used as a call target", name),
            ))
        }
        Expr::Attribute { value, attr } => (
            NodeKind::Attribute,
            NodeValue::Ident(attr.node.clone()),
            vec![Item::Expr(value)],
        ),
        Expr::List(items) => (
            NodeKind::List,
            NodeValue::Empty,
            items.iter().map(Item::Expr).collect(),
        ),
        Expr::Tuple(items) => (
            NodeKind::Tuple,
            NodeValue::Empty,
            items.iter().map(Item::Expr).collect(),
        ),
        Expr::Constant(lit) => (NodeKind::Constant, NodeValue::Literal(lit.clone()), vec![]),
        Expr::UnaryOp { op, operand } => (
            NodeKind::UnaryOp,
            NodeValue::Unary(*op),
            vec![Item::Expr(operand)],
        ),
        Expr::BinOp { op, left, right } => (
            NodeKind::BinOp,
            NodeValue::Binary(*op),
            vec![Item::Expr(left), Item::Expr(right)],
        ),
    };
    Ok(shaped)
}
