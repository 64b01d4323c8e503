//! Textual condition expressions.
//!
//! Two grammars exist. Documents older than version 1.2 use a flat,
//! comma-separated list of AND-ed terms:
//!
//! ```text
//! $Type=NPN,!horizontal
//! ```
//!
//! Newer documents use an infix expression with explicit operators and
//! grouping, where AND binds tighter than OR:
//!
//! ```text
//! $Type == "NPN" && (horizontal || $Gain >= 100)
//! ```
//!
//! Property operands are parsed as the declared type of the property
//! they are compared to, so every referenced property must be declared.

use logos::Logos;
use thiserror::Error;
use trellis_description::{
    condition::{BoolOp, ComparisonOp, Condition, ConditionKind, STATE_FLIPPED, STATE_HORIZONTAL},
    value::{PropertyType, TypedValue, ValueError},
    ConditionTree, Version,
};

/// The first document version which uses [`Grammar::Expression`].
pub const EXPRESSION_GRAMMAR_VERSION: Version = Version::new(1, 2, 0);

/// Errors in condition expressions.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("property '{0}' is not declared")]
    UndefinedProperty(String),

    #[error("unknown state '{0}'")]
    UnknownState(String),

    #[error("expected a comparison operator after '${0}'")]
    MissingOperator(String),

    #[error("unterminated string")]
    UnterminatedString,

    #[error("unexpected '{0}'")]
    Unexpected(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// The syntax a condition expression is written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grammar {
    /// Comma-separated terms which are all AND-ed.
    Legacy,
    /// Infix boolean expressions.
    Expression,
}

impl Grammar {
    /// The grammar used by documents of the given version.
    pub fn for_version(version: Version) -> Self {
        if version < EXPRESSION_GRAMMAR_VERSION {
            Self::Legacy
        } else {
            Self::Expression
        }
    }
}

/// Parses a condition expression.
///
/// `lookup` yields the declared type of a property. Blank text parses
/// to [`ConditionTree::Empty`].
pub fn parse_conditions<F>(
    text: &str,
    grammar: Grammar,
    lookup: F,
) -> Result<ConditionTree, ConditionError>
where
    F: Fn(&str) -> Option<PropertyType>,
{
    if text.trim().is_empty() {
        return Ok(ConditionTree::Empty);
    }

    match grammar {
        Grammar::Legacy => {
            let conditions = text
                .split(',')
                .map(|term| {
                    let mut parser = Parser::new(term, &lookup);
                    let atom = parser.atom(true)?;
                    parser.finish()?;
                    Ok(atom)
                })
                .collect::<Result<Vec<_>, ConditionError>>()?;

            Ok(ConditionTree::from_collection(conditions))
        }

        Grammar::Expression => {
            let mut parser = Parser::new(text, &lookup);
            let tree = parser.or_expr()?;
            parser.finish()?;
            Ok(tree)
        }
    }
}

type Span = std::ops::Range<usize>;

fn unquote<'a>(lex: &mut logos::Lexer<'a, Token<'a>>) -> String {
    let quoted = lex.slice();
    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted[1..quoted.len() - 1].chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

#[derive(Logos, Clone, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum Token<'a> {
    #[token("(")]
    Open,
    #[token(")")]
    Close,

    #[token("||")]
    #[token("or", ignore(ascii_case))]
    Or,
    #[token("&&")]
    #[token("and", ignore(ascii_case))]
    And,
    #[token("!")]
    Not,

    #[token("=")]
    #[token("==")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessOrEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterOrEqual,

    #[regex(r"\$[A-Za-z0-9_]*", |lex| &lex.slice()[1..])]
    Variable(&'a str),

    #[regex(r#""([^"\\]|\\.)*""#, unquote)]
    Quoted(String),

    #[regex(r#"[^\s()&|!=<>"$]+"#, |lex| lex.slice())]
    Word(&'a str),
}

struct Parser<'a, F> {
    text: &'a str,
    tokens: Vec<(Result<Token<'a>, ()>, Span)>,
    pos: usize,
    lookup: F,
}

impl<'a, F> Parser<'a, F>
where
    F: Fn(&str) -> Option<PropertyType>,
{
    fn new(text: &'a str, lookup: F) -> Self {
        Self {
            text,
            tokens: Token::lexer(text).spanned().collect(),
            pos: 0,
            lookup,
        }
    }

    fn peek(&self) -> Option<&Token<'a>> {
        match self.tokens.get(self.pos) {
            Some((Ok(token), _)) => Some(token),
            _ => None,
        }
    }

    fn eat(&mut self, token: Token<'static>) -> bool {
        let found = self.peek() == Some(&token);
        if found {
            self.pos += 1;
        }
        found
    }

    fn unexpected(&self) -> ConditionError {
        match self.tokens.get(self.pos) {
            None => ConditionError::UnexpectedEnd,
            Some((Err(()), span)) if self.text[span.start..].starts_with('"') => {
                ConditionError::UnterminatedString
            }
            Some((_, span)) => ConditionError::Unexpected(self.text[span.start..].to_owned()),
        }
    }

    fn finish(&self) -> Result<(), ConditionError> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn or_expr(&mut self) -> Result<ConditionTree, ConditionError> {
        let mut tree = self.and_expr()?;
        while self.eat(Token::Or) {
            tree = ConditionTree::or(tree, self.and_expr()?);
        }
        Ok(tree)
    }

    fn and_expr(&mut self) -> Result<ConditionTree, ConditionError> {
        let mut tree = self.primary()?;
        while self.eat(Token::And) {
            tree = ConditionTree::and(tree, self.primary()?);
        }
        Ok(tree)
    }

    fn primary(&mut self) -> Result<ConditionTree, ConditionError> {
        if self.eat(Token::Open) {
            let tree = self.or_expr()?;
            if !self.eat(Token::Close) {
                return Err(self.unexpected());
            }
            return Ok(tree);
        }

        self.atom(false).map(ConditionTree::Leaf)
    }

    fn atom(&mut self, legacy: bool) -> Result<Condition, ConditionError> {
        let expected = !self.eat(Token::Not);

        let token = self.peek().cloned().ok_or_else(|| self.unexpected())?;
        match token {
            Token::Variable(variable) if expected => {
                self.pos += 1;
                let ty = (self.lookup)(variable)
                    .ok_or_else(|| ConditionError::UndefinedProperty(variable.to_owned()))?;
                let op = self
                    .operator()
                    .ok_or_else(|| ConditionError::MissingOperator(variable.to_owned()))?;

                let text = if legacy {
                    // Legacy operands extend to the end of the term.
                    let start = self.tokens[self.pos - 1].1.end;
                    self.pos = self.tokens.len();
                    self.text[start..].trim().to_owned()
                } else {
                    self.operand()?
                };

                let value = TypedValue::parse(ty, &text)?;
                Ok(Condition::property(variable, op, value))
            }

            Token::Word(state) => {
                self.pos += 1;
                match state {
                    STATE_HORIZONTAL | STATE_FLIPPED => Ok(Condition::state(state, expected)),
                    _ => Err(ConditionError::UnknownState(state.to_owned())),
                }
            }

            _ => Err(self.unexpected()),
        }
    }

    fn operator(&mut self) -> Option<ComparisonOp> {
        let op = match self.peek()? {
            Token::Equal => ComparisonOp::Equal,
            Token::NotEqual => ComparisonOp::NotEqual,
            Token::Less => ComparisonOp::Less,
            Token::LessOrEqual => ComparisonOp::LessOrEqual,
            Token::Greater => ComparisonOp::Greater,
            Token::GreaterOrEqual => ComparisonOp::GreaterOrEqual,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn operand(&mut self) -> Result<String, ConditionError> {
        let text = match self.peek() {
            Some(Token::Quoted(text)) => text.clone(),
            Some(Token::Word(word)) => (*word).to_owned(),
            _ => return Err(self.unexpected()),
        };
        self.pos += 1;
        Ok(text)
    }
}

/// Formats a condition tree in the expression grammar.
///
/// Returns [`None`] for a tree that is always true.
pub fn format_conditions(tree: &ConditionTree) -> Option<String> {
    let mut out = String::new();
    write_tree(tree, None, &mut out);
    (!out.is_empty()).then_some(out)
}

fn write_tree(tree: &ConditionTree, parent: Option<(BoolOp, bool)>, out: &mut String) {
    match tree {
        ConditionTree::Empty => {}
        ConditionTree::Leaf(condition) => write_condition(condition, out),
        ConditionTree::Operator { op, left, right } => {
            // Empty subtrees are always true.
            if left.is_empty() {
                return write_tree(right, parent, out);
            }
            if right.is_empty() {
                return write_tree(left, parent, out);
            }

            // Right-nested chains of the same operator keep their shape.
            let parens = match parent {
                Some((BoolOp::And, _)) if *op == BoolOp::Or => true,
                Some((parent_op, true)) => parent_op == *op,
                _ => false,
            };

            if parens {
                out.push('(');
            }
            write_tree(left, Some((*op, false)), out);
            out.push_str(match op {
                BoolOp::And => " && ",
                BoolOp::Or => " || ",
            });
            write_tree(right, Some((*op, true)), out);
            if parens {
                out.push(')');
            }
        }
    }
}

fn write_condition(condition: &Condition, out: &mut String) {
    match condition.kind {
        ConditionKind::State => {
            let expected = condition.value.as_bool().unwrap_or(true);
            let negated = (condition.op == ComparisonOp::NotEqual) == expected;
            if negated {
                out.push('!');
            }
            out.push_str(&condition.variable);
        }

        ConditionKind::Property => {
            out.push('$');
            out.push_str(&condition.variable);
            out.push(' ');
            out.push_str(condition.op.symbol());
            out.push(' ');
            write_operand(&condition.value.to_string(), out);
        }
    }
}

fn write_operand(text: &str, out: &mut String) {
    let keyword = ["and", "or"].iter().any(|k| text.eq_ignore_ascii_case(k));
    let bare = !text.is_empty()
        && !keyword
        && !text.chars().any(|c| {
            c.is_whitespace() || matches!(c, '(' | ')' | '&' | '|' | '!' | '=' | '<' | '>' | '"' | '$' | '\\')
        });

    if bare {
        out.push_str(text);
        return;
    }

    out.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}
