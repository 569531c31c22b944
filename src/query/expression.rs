//! Filter/search expression parsing.
//!
//! Expressions are a small query language over documents: `field:value`
//! terms, quoted phrases, comparison prefixes (`age:>=21`), `_exists_:field`,
//! and AND/OR/NOT with parentheses. Parsing produces an [`ExpressionNode`]
//! tree that lowers into the wire query model; lowering is context
//! dependent, a filter expression lowers to exact terms while a search
//! expression lowers bare and text terms to scored matches.

use crate::error::{RepositoryError, Result};
use crate::protocol::request::WireQuery;
use serde_json::{json, Value};

/// Field name carrying an existence test (`_exists_:status`)
const EXISTS_FIELD: &str = "_exists_";

/// Comparison operators accepted after `field:`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    /// `value` or `field:value`; a missing field means the query's default
    /// field at lowering time
    Term {
        field: Option<String>,
        value: String,
        phrase: bool,
    },
    /// `field:>value` and friends
    Comparison {
        field: String,
        op: ComparisonOp,
        value: String,
    },
    /// `_exists_:field`
    Exists { field: String },
    And(Vec<ExpressionNode>),
    Or(Vec<ExpressionNode>),
    Not(Box<ExpressionNode>),
}

/// Parses an expression string into a node tree
pub trait ExpressionParser: Send + Sync {
    fn parse(&self, expression: &str) -> Result<ExpressionNode>;
}

/// Default grammar: terms, comparisons, existence, AND/OR/NOT, parentheses.
/// Adjacent terms without an operator are joined with AND.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExpressionParser;

impl ExpressionParser for DefaultExpressionParser {
    fn parse(&self, expression: &str) -> Result<ExpressionNode> {
        let tokens = tokenize(expression)?;
        if tokens.is_empty() {
            return Err(RepositoryError::Expression(
                "empty expression".to_string(),
            ));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let node = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(RepositoryError::Expression(format!(
                "unexpected trailing input at token {}",
                parser.pos
            )));
        }
        Ok(node)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Term { field: Option<String>, value: String, phrase: bool },
    And,
    Or,
    Not,
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '"' => {
                chars.next();
                let value = read_quoted(&mut chars)?;
                tokens.push(Token::Term { field: None, value, phrase: true });
            }
            _ => {
                let word = read_word(&mut chars);
                match word.as_str() {
                    "AND" => tokens.push(Token::And),
                    "OR" => tokens.push(Token::Or),
                    "NOT" => tokens.push(Token::Not),
                    _ => tokens.push(split_term(word, &mut chars)?),
                }
            }
        }
    }

    Ok(tokens)
}

fn read_quoted(chars: &mut std::iter::Peekable<std::str::Chars>) -> Result<String> {
    let mut value = String::new();
    for c in chars.by_ref() {
        if c == '"' {
            return Ok(value);
        }
        value.push(c);
    }
    Err(RepositoryError::Expression(
        "unterminated quoted phrase".to_string(),
    ))
}

fn read_word(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == '(' || c == ')' || c == ':' {
            break;
        }
        word.push(c);
        chars.next();
    }
    word
}

/// A word followed by `:` is a fielded term; the value may be quoted or a
/// comparison-prefixed literal
fn split_term(
    word: String,
    chars: &mut std::iter::Peekable<std::str::Chars>,
) -> Result<Token> {
    if chars.peek() != Some(&':') {
        return Ok(Token::Term { field: None, value: word, phrase: false });
    }
    chars.next();

    if chars.peek() == Some(&'"') {
        chars.next();
        let value = read_quoted(chars)?;
        return Ok(Token::Term { field: Some(word), value, phrase: true });
    }

    let value = read_word(chars);
    if value.is_empty() {
        return Err(RepositoryError::Expression(format!(
            "field '{}' has no value",
            word
        )));
    }
    Ok(Token::Term { field: Some(word), value, phrase: false })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn parse_or(&mut self) -> Result<ExpressionNode> {
        let mut parts = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            parts.push(self.parse_and()?);
        }
        Ok(if parts.len() == 1 {
            parts.pop().unwrap()
        } else {
            ExpressionNode::Or(parts)
        })
    }

    fn parse_and(&mut self) -> Result<ExpressionNode> {
        let mut parts = vec![self.parse_unary()?];
        loop {
            match self.peek() {
                Some(Token::And) => {
                    self.pos += 1;
                    parts.push(self.parse_unary()?);
                }
                // implicit AND between adjacent terms
                Some(Token::Term { .. }) | Some(Token::Not) | Some(Token::Open) => {
                    parts.push(self.parse_unary()?);
                }
                _ => break,
            }
        }
        Ok(if parts.len() == 1 {
            parts.pop().unwrap()
        } else {
            ExpressionNode::And(parts)
        })
    }

    fn parse_unary(&mut self) -> Result<ExpressionNode> {
        match self.peek() {
            Some(Token::Not) => {
                self.pos += 1;
                Ok(ExpressionNode::Not(Box::new(self.parse_unary()?)))
            }
            Some(Token::Open) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                if self.peek() != Some(&Token::Close) {
                    return Err(RepositoryError::Expression(
                        "unbalanced parentheses".to_string(),
                    ));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(Token::Term { .. }) => {
                let token = self.tokens[self.pos].clone();
                self.pos += 1;
                let Token::Term { field, value, phrase } = token else {
                    unreachable!()
                };
                Ok(term_node(field, value, phrase))
            }
            other => Err(RepositoryError::Expression(format!(
                "expected a term, found {:?}",
                other
            ))),
        }
    }
}

fn term_node(field: Option<String>, value: String, phrase: bool) -> ExpressionNode {
    if let Some(field) = field {
        if field == EXISTS_FIELD {
            return ExpressionNode::Exists { field: value };
        }
        if !phrase {
            let (op, rest) = if let Some(rest) = value.strip_prefix(">=") {
                (Some(ComparisonOp::Gte), rest)
            } else if let Some(rest) = value.strip_prefix("<=") {
                (Some(ComparisonOp::Lte), rest)
            } else if let Some(rest) = value.strip_prefix('>') {
                (Some(ComparisonOp::Gt), rest)
            } else if let Some(rest) = value.strip_prefix('<') {
                (Some(ComparisonOp::Lt), rest)
            } else {
                (None, value.as_str())
            };
            if let Some(op) = op {
                return ExpressionNode::Comparison {
                    field,
                    op,
                    value: rest.to_string(),
                };
            }
        }
        return ExpressionNode::Term { field: Some(field), value, phrase };
    }
    ExpressionNode::Term { field: None, value, phrase }
}

/// Literal values are typed by shape: numbers and booleans become JSON
/// scalars, everything else stays a string
fn literal(value: &str) -> Value {
    if let Ok(n) = value.parse::<i64>() {
        return json!(n);
    }
    if let Ok(f) = value.parse::<f64>() {
        return json!(f);
    }
    match value {
        "true" => json!(true),
        "false" => json!(false),
        _ => json!(value),
    }
}

impl ExpressionNode {
    /// Lower to the wire model.
    ///
    /// `scored` controls term lowering: a search expression turns text
    /// terms into scored matches, a filter expression turns them into
    /// exact term tests. Bare terms need a default field in scored mode;
    /// in filter mode a bare term is an error since there is nothing
    /// exact to test it against.
    pub fn to_wire(&self, scored: bool, default_field: Option<&str>) -> Result<WireQuery> {
        match self {
            ExpressionNode::Term { field, value, phrase } => {
                let field = match field.as_deref().or(default_field) {
                    Some(f) => f,
                    None => {
                        return Err(RepositoryError::Expression(format!(
                            "bare term '{}' needs a default field",
                            value
                        )))
                    }
                };
                if scored || (*phrase && field_is_text_default(field, default_field)) {
                    Ok(WireQuery::Match {
                        field: field.to_string(),
                        query: value.clone(),
                    })
                } else {
                    Ok(WireQuery::Term {
                        field: field.to_string(),
                        value: literal(value),
                    })
                }
            }
            ExpressionNode::Comparison { field, op, value } => {
                let bound = Some(literal(value));
                let (gt, gte, lt, lte) = match op {
                    ComparisonOp::Gt => (bound, None, None, None),
                    ComparisonOp::Gte => (None, bound, None, None),
                    ComparisonOp::Lt => (None, None, bound, None),
                    ComparisonOp::Lte => (None, None, None, bound),
                };
                Ok(WireQuery::Range {
                    field: field.clone(),
                    gt,
                    gte,
                    lt,
                    lte,
                })
            }
            ExpressionNode::Exists { field } => Ok(WireQuery::Exists {
                field: field.clone(),
            }),
            ExpressionNode::And(parts) => Ok(WireQuery::and(
                parts
                    .iter()
                    .map(|p| p.to_wire(scored, default_field))
                    .collect::<Result<Vec<_>>>()?,
            )),
            ExpressionNode::Or(parts) => Ok(WireQuery::or(
                parts
                    .iter()
                    .map(|p| p.to_wire(scored, default_field))
                    .collect::<Result<Vec<_>>>()?,
            )),
            ExpressionNode::Not(inner) => {
                Ok(WireQuery::negate(inner.to_wire(scored, default_field)?))
            }
        }
    }
}

fn field_is_text_default(field: &str, default_field: Option<&str>) -> bool {
    default_field == Some(field)
}
