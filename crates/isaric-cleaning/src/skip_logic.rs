//! Skip-logic expressions.
//!
//! A field's skip logic states when the field applies, in REDCap style:
//!
//! ```text
//! [sex] = 'Female' and ([age] >= 12 or [pregnant] <> '')
//! ```
//!
//! Operands are field references in brackets, quoted strings, or numbers.
//! A checkbox reference `[symptoms(cough)]` names the one-hot column
//! `symptoms___cough`. Two operands compare numerically when both parse as
//! numbers and as text otherwise; missing values compare as the empty
//! string. A bare field reference is true when its value is present and
//! not `0`.

use std::fmt;

use isaric_core::{Error, Result};
use logos::Logos;
use nom::{
    branch::alt,
    combinator::{map, map_opt, opt},
    multi::separated_list1,
    sequence::{delimited, pair, preceded},
    Err, IResult,
};

// ============================================================================
// Tokens
// ============================================================================

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum Token {
    // Longitudinal references `[event][field]` keep the field part.
    #[regex(r"(\[[^\[\]]*\])+", field_reference)]
    Field(String),

    #[regex(r"'[^']*'", |lex| unquote(lex.slice()))]
    #[regex(r#""[^"]*""#, |lex| unquote(lex.slice()))]
    Text(String),

    #[regex(r"-?([0-9]+(\.[0-9]*)?|\.[0-9]+)", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Word(String),

    #[token("and", ignore(ascii_case))]
    #[token("&&")]
    And,

    #[token("or", ignore(ascii_case))]
    #[token("||")]
    Or,

    #[token("not", ignore(ascii_case))]
    Not,

    #[token("=")]
    #[token("==")]
    Eq,

    #[token("<>")]
    #[token("!=")]
    Ne,

    #[token("<")]
    Lt,

    #[token("<=")]
    Le,

    #[token(">")]
    Gt,

    #[token(">=")]
    Ge,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Field(name) => write!(f, "[{name}]"),
            Token::Text(text) => write!(f, "'{text}'"),
            Token::Number(n) => write!(f, "{n}"),
            Token::Word(word) => f.write_str(word),
            Token::And => f.write_str("and"),
            Token::Or => f.write_str("or"),
            Token::Not => f.write_str("not"),
            Token::Eq => f.write_str("="),
            Token::Ne => f.write_str("<>"),
            Token::Lt => f.write_str("<"),
            Token::Le => f.write_str("<="),
            Token::Gt => f.write_str(">"),
            Token::Ge => f.write_str(">="),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

fn field_reference(lex: &mut logos::Lexer<Token>) -> Option<String> {
    let last = lex.slice().rsplit('[').next()?;
    let name = last.strip_suffix(']')?.trim();
    if name.is_empty() {
        return None;
    }
    Some(checkbox_column(name))
}

fn unquote(quoted: &str) -> String {
    quoted[1..quoted.len() - 1].to_string()
}

/// Tokenize an expression with byte spans.
fn tokenize(source: &str) -> Result<Vec<(Token, usize, usize)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span.start, span.end)),
            Err(()) => {
                return Err(Error::parse(format!(
                    "unexpected '{}' at position {} in skip logic '{source}'",
                    &source[span.clone()],
                    span.start
                )));
            }
        }
    }

    Ok(tokens)
}

/// Column name for a field reference, expanding `field(code)`.
fn checkbox_column(reference: &str) -> String {
    match reference.strip_suffix(')').and_then(|r| r.split_once('(')) {
        Some((field, code)) => format!("{}___{}", field.trim(), code.trim()),
        None => reference.to_string(),
    }
}

// ============================================================================
// Syntax tree
// ============================================================================

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>` or `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            Self::Eq => ordering == Equal,
            Self::Ne => ordering != Equal,
            Self::Lt => ordering == Less,
            Self::Le => ordering != Greater,
            Self::Gt => ordering == Greater,
            Self::Ge => ordering != Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        };
        f.write_str(symbol)
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Value of a field in the row being checked.
    Field(String),
    /// Literal text.
    Text(String),
    /// Literal number.
    Number(f64),
}

impl Operand {
    fn resolve<F>(&self, lookup: &F) -> String
    where
        F: Fn(&str) -> String,
    {
        match self {
            Self::Field(name) => lookup(name),
            Self::Text(text) => text.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// A parsed skip-logic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `left op right`
    Compare {
        /// Left operand.
        left: Operand,
        /// Operator.
        op: CompareOp,
        /// Right operand.
        right: Operand,
    },
    /// A lone operand; true when present and not `0`.
    Truthy(Operand),
    /// Both sides hold.
    And(Box<Expr>, Box<Expr>),
    /// Either side holds.
    Or(Box<Expr>, Box<Expr>),
    /// Negation.
    Not(Box<Expr>),
}

impl Expr {
    fn evaluate<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> String,
    {
        match self {
            Self::Compare { left, op, right } => {
                compare(&left.resolve(lookup), *op, &right.resolve(lookup))
            }
            Self::Truthy(operand) => {
                let value = operand.resolve(lookup);
                let value = value.trim();
                !value.is_empty() && value.parse::<f64>().map_or(true, |n| n != 0.0)
            }
            Self::And(a, b) => a.evaluate(lookup) && b.evaluate(lookup),
            Self::Or(a, b) => a.evaluate(lookup) || b.evaluate(lookup),
            Self::Not(inner) => !inner.evaluate(lookup),
        }
    }

    fn collect_fields<'a>(&'a self, fields: &mut Vec<&'a str>) {
        match self {
            Self::Compare { left, right, .. } => {
                push_field(fields, left);
                push_field(fields, right);
            }
            Self::Truthy(operand) => push_field(fields, operand),
            Self::And(a, b) | Self::Or(a, b) => {
                a.collect_fields(fields);
                b.collect_fields(fields);
            }
            Self::Not(inner) => inner.collect_fields(fields),
        }
    }
}

fn push_field<'a>(fields: &mut Vec<&'a str>, operand: &'a Operand) {
    if let Operand::Field(name) = operand {
        if !fields.contains(&name.as_str()) {
            fields.push(name);
        }
    }
}

/// Compare two resolved operands.
fn compare(left: &str, op: CompareOp, right: &str) -> bool {
    let (left, right) = (left.trim(), right.trim());
    match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r).is_some_and(|ordering| op.holds(ordering)),
        _ => op.holds(left.cmp(right)),
    }
}

// ============================================================================
// Parser
// ============================================================================

type TokenSlice<'a> = &'a [(Token, usize, usize)];

/// `or` binds loosest, then `and`, then `not`.
fn or_expr(input: TokenSlice) -> IResult<TokenSlice, Expr> {
    map_opt(separated_list1(token(Token::Or), and_expr), |terms| {
        terms
            .into_iter()
            .reduce(|a, b| Expr::Or(Box::new(a), Box::new(b)))
    })(input)
}

fn and_expr(input: TokenSlice) -> IResult<TokenSlice, Expr> {
    map_opt(separated_list1(token(Token::And), unary), |terms| {
        terms
            .into_iter()
            .reduce(|a, b| Expr::And(Box::new(a), Box::new(b)))
    })(input)
}

fn unary(input: TokenSlice) -> IResult<TokenSlice, Expr> {
    alt((
        map(preceded(token(Token::Not), unary), |inner| {
            Expr::Not(Box::new(inner))
        }),
        primary,
    ))(input)
}

fn primary(input: TokenSlice) -> IResult<TokenSlice, Expr> {
    alt((
        delimited(token(Token::LParen), or_expr, token(Token::RParen)),
        comparison,
    ))(input)
}

/// `left op right`, or a lone operand.
fn comparison(input: TokenSlice) -> IResult<TokenSlice, Expr> {
    let (input, left) = operand(input)?;
    let (input, rest) = opt(pair(compare_op, operand))(input)?;
    let expr = match rest {
        Some((op, right)) => Expr::Compare { left, op, right },
        None => Expr::Truthy(left),
    };
    Ok((input, expr))
}

fn compare_op(input: TokenSlice) -> IResult<TokenSlice, CompareOp> {
    alt((
        map(token(Token::Eq), |_| CompareOp::Eq),
        map(token(Token::Ne), |_| CompareOp::Ne),
        map(token(Token::Lt), |_| CompareOp::Lt),
        map(token(Token::Le), |_| CompareOp::Le),
        map(token(Token::Gt), |_| CompareOp::Gt),
        map(token(Token::Ge), |_| CompareOp::Ge),
    ))(input)
}

fn operand(input: TokenSlice) -> IResult<TokenSlice, Operand> {
    if let Some(first) = input.first() {
        match &first.0 {
            Token::Field(name) => Ok((&input[1..], Operand::Field(name.clone()))),
            // Bare words compare as text.
            Token::Text(text) | Token::Word(text) => {
                Ok((&input[1..], Operand::Text(text.clone())))
            }
            Token::Number(n) => Ok((&input[1..], Operand::Number(*n))),
            _ => Err(Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            ))),
        }
    } else {
        Err(Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Eof,
        )))
    }
}

/// Parse a specific token
fn token(tok: Token) -> impl Fn(TokenSlice) -> IResult<TokenSlice, &Token> {
    move |input: TokenSlice| {
        if let Some(first) = input.first() {
            if first.0 == tok {
                Ok((&input[1..], &first.0))
            } else {
                Err(Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Tag,
                )))
            }
        } else {
            Err(Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Eof,
            )))
        }
    }
}

/// Describe where parsing stopped.
fn unexpected(rest: TokenSlice, source: &str) -> Error {
    match rest.first() {
        Some((token, start, _)) => Error::parse(format!(
            "unexpected '{token}' at position {start} in skip logic '{source}'"
        )),
        None => Error::parse(format!(
            "unexpected end of expression in skip logic '{source}'"
        )),
    }
}

// ============================================================================
// SkipLogic
// ============================================================================

/// The skip logic of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct SkipLogic {
    source: String,
    expr: Option<Expr>,
}

impl SkipLogic {
    /// Parse an expression. Blank text gives logic that always holds.
    ///
    /// # Examples
    ///
    /// ```
    /// use isaric_cleaning::SkipLogic;
    ///
    /// let logic = SkipLogic::parse("[sex] = 'Female' and [age] >= 12").unwrap();
    /// assert_eq!(logic.fields(), vec!["sex", "age"]);
    ///
    /// let holds = logic.evaluate(|field| match field {
    ///     "sex" => "Female".to_string(),
    ///     "age" => "30".to_string(),
    ///     _ => String::new(),
    /// });
    /// assert!(holds);
    /// ```
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Ok(Self {
                source: source.to_string(),
                expr: None,
            });
        }
        let expr = match or_expr(&tokens) {
            Ok(([], expr)) => expr,
            Ok((rest, _)) => return Err(unexpected(rest, source)),
            Err(Err::Error(e) | Err::Failure(e)) => return Err(unexpected(e.input, source)),
            Err(Err::Incomplete(_)) => return Err(unexpected(&[], source)),
        };
        Ok(Self {
            source: source.to_string(),
            expr: Some(expr),
        })
    }

    /// The expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed expression; `None` for blank logic.
    pub fn expr(&self) -> Option<&Expr> {
        self.expr.as_ref()
    }

    /// Returns `true` if the logic is blank.
    pub fn is_always(&self) -> bool {
        self.expr.is_none()
    }

    /// Fields referenced by the expression, in order of first use.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        if let Some(expr) = &self.expr {
            expr.collect_fields(&mut fields);
        }
        fields
    }

    /// Evaluate against field values; `lookup` returns the comparison text
    /// of a field, or `""` when missing.
    pub fn evaluate<F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> String,
    {
        self.expr
            .as_ref()
            .is_none_or(|expr| expr.evaluate(&lookup))
    }
}

impl fmt::Display for SkipLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
