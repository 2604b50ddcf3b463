//! Parser implementation using chumsky

use std::collections::HashSet;

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::config::MAX_NESTING_DEPTH;
use crate::parser::expr::*;
use crate::parser::lexer::Token;

/// Parse template text into a syntactic expression
pub fn parse_expr(input: &str) -> Result<Spanned<Expr>, Vec<crate::ParseError>> {
    let len = input.len();

    let tokens = crate::parser::lexer::lex(input).map_err(|e| vec![e])?;
    check_nesting(&tokens).map_err(|e| vec![e])?;
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    expression_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Reject input that would nest deeper than [`MAX_NESTING_DEPTH`].
///
/// Runs on the token stream so that recursive parsing, lowering and
/// interpretation never see it. The count is an upper bound on tree depth:
/// every open bracket adds a level, and so does every operator, dot or
/// closed group within the current argument.
fn check_nesting(tokens: &[(Token, Span)]) -> Result<(), crate::ParseError> {
    let mut frames: Vec<usize> = vec![0];
    let mut depth = 0usize;
    for (token, span) in tokens {
        match token {
            Token::ParenOpen | Token::BracketOpen => {
                frames.push(0);
                depth += 1;
            }
            Token::ParenClose | Token::BracketClose if frames.len() > 1 => {
                let ops = frames.pop().unwrap_or_default();
                depth = depth.saturating_sub(ops + 1);
                // The closed group may still be called, indexed or operated on
                if let Some(outer) = frames.last_mut() {
                    *outer += 1;
                    depth += 1;
                }
            }
            Token::Comma => {
                if let Some(ops) = frames.last_mut() {
                    depth = depth.saturating_sub(*ops);
                    *ops = 0;
                }
            }
            Token::Plus
            | Token::Minus
            | Token::Star
            | Token::DoubleStar
            | Token::Slash
            | Token::DoubleSlash
            | Token::Percent
            | Token::Dot => {
                if let Some(ops) = frames.last_mut() {
                    *ops += 1;
                    depth += 1;
                }
            }
            _ => {}
        }
        if depth > MAX_NESTING_DEPTH {
            return Err(crate::ParseError::syntax(
                span.clone(),
                format!("expression is nested more than {} levels deep", MAX_NESTING_DEPTH),
            ));
        }
    }
    Ok(())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

/// Postfix suffix applied to a primary expression
#[derive(Debug, Clone)]
enum Postfix {
    Call(Vec<Argument>),
    Attribute(Spanned<String>),
}

fn join(a: &Span, b: &Span) -> Span {
    a.start.min(b.start)..a.end.max(b.end)
}

fn binary(op: BinaryOperator, left: Spanned<Expr>, right: Spanned<Expr>) -> Spanned<Expr> {
    let span = join(&left.span, &right.span);
    Spanned::new(
        Expr::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

/// Validate argument order and keyword uniqueness the way the host syntax does
fn check_arguments(args: &[Argument]) -> Result<(), (Span, String)> {
    let mut seen_keyword = false;
    let mut names = HashSet::new();
    for arg in args {
        match arg {
            Argument::Positional(value) => {
                if seen_keyword {
                    return Err((
                        value.span.clone(),
                        "positional argument follows keyword argument".to_string(),
                    ));
                }
            }
            Argument::Keyword { name, .. } => {
                seen_keyword = true;
                if !names.insert(name.node.clone()) {
                    return Err((
                        name.span.clone(),
                        format!("keyword argument repeated: {}", name.node),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn expression_parser<'a, I>(
) -> impl Parser<'a, I, Spanned<Expr>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let identifier = select! {
        Token::Ident(s) => s,
    }
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    let literal = select! {
        Token::Int(n) => Literal::Int(n),
        Token::Float(x) => Literal::Float(x),
        Token::String(s) => Literal::Str(s),
        Token::True => Literal::Bool(true),
        Token::False => Literal::Bool(false),
        Token::None => Literal::None,
    }
    .map_with(|lit, e| Spanned::new(Expr::Constant(lit), span_range(&e.span())));

    recursive(|expr| {
        let name = identifier
            .clone()
            .map(|id| Spanned::new(Expr::Name(id.node), id.span));

        // [a, b, c]
        let list = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
            .map_with(|items, e| Spanned::new(Expr::List(items), span_range(&e.span())));

        // () is the empty tuple, (x) groups, (x,) and (x, y) are tuples
        let parenthesized = expr
            .clone()
            .then(
                just(Token::Comma)
                    .ignore_then(expr.clone())
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .then(just(Token::Comma).or_not())
            .or_not()
            .delimited_by(just(Token::ParenOpen), just(Token::ParenClose))
            .map_with(|inner, e| {
                let span = span_range(&e.span());
                match inner {
                    None => Spanned::new(Expr::Tuple(vec![]), span),
                    Some(((first, rest), None)) if rest.is_empty() => {
                        Spanned::new(first.node, span)
                    }
                    Some(((first, rest), _)) => {
                        let mut items = vec![first];
                        items.extend(rest);
                        Spanned::new(Expr::Tuple(items), span)
                    }
                }
            });

        let atom = choice((literal, name, list, parenthesized));

        // Call arguments: keyword form must be tried first since it starts with an identifier
        let argument = choice((
            identifier
                .clone()
                .then_ignore(just(Token::Equals))
                .then(expr.clone())
                .map(|(name, value)| Argument::Keyword { name, value }),
            expr.clone().map(Argument::Positional),
        ));

        let call_args = argument
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::ParenOpen), just(Token::ParenClose))
            .try_map(|args, span: SimpleSpan| match check_arguments(&args) {
                Ok(()) => Ok(args),
                Err((_, message)) => Err(Rich::custom(span, message)),
            });

        let postfix = choice((
            call_args.map(Postfix::Call),
            just(Token::Dot)
                .ignore_then(identifier.clone())
                .map(Postfix::Attribute),
        ))
        .map_with(|p, e| (p, span_range(&e.span())));

        let primary = atom
            .then(postfix.repeated().collect::<Vec<_>>())
            .map(|(base, suffixes)| {
                suffixes.into_iter().fold(base, |acc, (suffix, span)| {
                    let span = join(&acc.span, &span);
                    let node = match suffix {
                        Postfix::Call(args) => Expr::Call {
                            func: Box::new(acc),
                            args,
                        },
                        Postfix::Attribute(attr) => Expr::Attribute {
                            value: Box::new(acc),
                            attr,
                        },
                    };
                    Spanned::new(node, span)
                })
            });

        // factor: ('-' | '+') factor | primary ['**' factor]
        let factor = recursive(|factor| {
            let unary = choice((
                just(Token::Minus).to(UnaryOperator::Neg),
                just(Token::Plus).to(UnaryOperator::Pos),
            ))
            .map_with(|op, e| (op, span_range(&e.span())))
            .then(factor.clone())
            .map(|((op, op_span), operand): ((UnaryOperator, Span), Spanned<Expr>)| {
                let span = join(&op_span, &operand.span);
                Spanned::new(
                    Expr::UnaryOp {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                )
            });

            let power = primary
                .clone()
                .then(just(Token::DoubleStar).ignore_then(factor).or_not())
                .map(|(base, exponent)| match exponent {
                    Some(exp) => binary(BinaryOperator::Pow, base, exp),
                    None => base,
                });

            choice((unary, power))
        });

        let term_op = choice((
            just(Token::Star).to(BinaryOperator::Mul),
            just(Token::DoubleSlash).to(BinaryOperator::FloorDiv),
            just(Token::Slash).to(BinaryOperator::Div),
            just(Token::Percent).to(BinaryOperator::Mod),
        ));

        let term = factor
            .clone()
            .then(term_op.then(factor).repeated().collect::<Vec<_>>())
            .map(|(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, (op, right)| binary(op, left, right))
            });

        let sum_op = choice((
            just(Token::Plus).to(BinaryOperator::Add),
            just(Token::Minus).to(BinaryOperator::Sub),
        ));

        term.clone()
            .then(sum_op.then(term).repeated().collect::<Vec<_>>())
            .map(|(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, (op, right)| binary(op, left, right))
            })
            .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Expr {
        parse_expr(input).expect("Should parse").node
    }

    #[test]
    fn test_parse_simple_call() {
        match parse_ok("ImageStack()") {
            Expr::Call { func, args } => {
                assert_eq!(func.node, Expr::Name("ImageStack".to_string()));
                assert!(args.is_empty());
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_keyword_arguments() {
        match parse_ok("RectangleLayer(pos=(0, 0), radius=20,)") {
            Expr::Call { args, .. } => {
                assert_eq!(args.len(), 2);
                match &args[0] {
                    Argument::Keyword { name, value } => {
                        assert_eq!(name.node, "pos");
                        assert!(matches!(value.node, Expr::Tuple(ref items) if items.len() == 2));
                    }
                    _ => panic!("Expected keyword"),
                }
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_parentheses_group_and_tuples() {
        assert_eq!(parse_ok("(5)"), Expr::Constant(Literal::Int(5)));
        assert!(matches!(parse_ok("()"), Expr::Tuple(ref items) if items.is_empty()));
        assert!(matches!(parse_ok("(5,)"), Expr::Tuple(ref items) if items.len() == 1));
        assert!(matches!(parse_ok("(1, 2, 3)"), Expr::Tuple(ref items) if items.len() == 3));
    }

    #[test]
    fn test_parse_list_trailing_comma() {
        assert!(matches!(parse_ok("[1, 'a',]"), Expr::List(ref items) if items.len() == 2));
    }

    #[test]
    fn test_parse_precedence() {
        // 1 + 2 * 3 => Add(1, Mul(2, 3))
        match parse_ok("1 + 2 * 3") {
            Expr::BinOp { op, right, .. } => {
                assert_eq!(op, BinaryOperator::Add);
                assert!(matches!(right.node, Expr::BinOp { op: BinaryOperator::Mul, .. }));
            }
            other => panic!("Expected binop, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_left_associative_subtraction() {
        // 10 - 3 - 2 => Sub(Sub(10, 3), 2)
        match parse_ok("10 - 3 - 2") {
            Expr::BinOp { op, left, .. } => {
                assert_eq!(op, BinaryOperator::Sub);
                assert!(matches!(left.node, Expr::BinOp { op: BinaryOperator::Sub, .. }));
            }
            other => panic!("Expected binop, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unary_binds_looser_than_power() {
        // -2 ** 2 => Neg(Pow(2, 2))
        match parse_ok("-2 ** 2") {
            Expr::UnaryOp { op, operand } => {
                assert_eq!(op, UnaryOperator::Neg);
                assert!(matches!(operand.node, Expr::BinOp { op: BinaryOperator::Pow, .. }));
            }
            other => panic!("Expected unary, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_method_chain() {
        // SingleColor((1, 2, 3)).alpha(128) => Call(Attribute(Call(SingleColor), alpha), 128)
        match parse_ok("SingleColor((1, 2, 3)).alpha(128)") {
            Expr::Call { func, args } => {
                assert_eq!(args.len(), 1);
                match func.node {
                    Expr::Attribute { value, attr } => {
                        assert_eq!(attr.node, "alpha");
                        assert!(matches!(value.node, Expr::Call { .. }));
                    }
                    other => panic!("Expected attribute, got {:?}", other),
                }
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_chained_calls() {
        match parse_ok("IteratorVariable('users')('name')") {
            Expr::Call { func, .. } => assert!(matches!(func.node, Expr::Call { .. })),
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_positional_after_keyword_rejected() {
        assert!(parse_expr("TextLayer(text='a', 5)").is_err());
    }

    #[test]
    fn test_repeated_keyword_rejected() {
        assert!(parse_expr("TextLayer(text='a', text='b')").is_err());
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse_expr("ImageStack() ImageStack()").is_err());
    }

    #[test]
    fn test_unbalanced_rejected() {
        let errs = parse_expr("ImageStack([RectangleLayer()").unwrap_err();
        assert!(!errs.is_empty());
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let nested = |open: &str, close: &str, depth: usize| {
            format!("{}1{}", open.repeat(depth), close.repeat(depth))
        };
        assert!(parse_expr(&nested("[", "]", 150)).is_ok());
        assert!(parse_expr(&nested("[", "]", 20000)).is_err());
        assert!(parse_expr(&nested("(", ")", 20000)).is_err());
        assert!(parse_expr(&format!("{}1", "-".repeat(20000))).is_err());
        assert!(parse_expr(&format!("1{}", " + 1".repeat(20000))).is_err());
        assert!(parse_expr(&format!("f{}", "()".repeat(20000))).is_err());
        assert!(parse_expr(&format!("f{}", ".a".repeat(20000))).is_err());

        // Siblings do not add up
        let wide = format!("[{}]", vec!["[[1]] + 2"; 2000].join(", "));
        assert!(parse_expr(&wide).is_ok());
    }

    #[test]
    fn test_spans_cover_call() {
        let expr = parse_expr("  Foo(1)").expect("Should parse");
        assert_eq!(expr.span, 2..8);
    }
}
