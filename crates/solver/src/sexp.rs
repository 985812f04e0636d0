//! Minimal S-expression reader for solver responses.
//!
//! Solver output is a sequence of S-expressions: a status atom (`sat`,
//! `unsat`, `unknown`), optionally followed by a model and `(error "...")`
//! forms. Only the lexical structure is recovered here; interpretation lives
//! in [`crate::parser`] and [`crate::model`].

use std::fmt;

use minilang_fv_smtlib::formatter::is_simple_symbol;

use crate::error::SolverError;

/// An S-expression: an atom or a parenthesized list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SExpr {
    /// Symbol, numeral, keyword, or string literal (strings keep their quotes;
    /// `|quoted|` symbols are stored without the bars).
    Atom(String),
    List(Vec<SExpr>),
}

impl SExpr {
    pub fn atom(text: impl Into<String>) -> Self {
        SExpr::Atom(text.into())
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExpr::Atom(a) => Some(a),
            SExpr::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExpr]> {
        match self {
            SExpr::List(items) => Some(items),
            SExpr::Atom(_) => None,
        }
    }

    /// Returns `true` for a list whose first element is the atom `head`.
    pub fn is_call(&self, head: &str) -> bool {
        self.as_list()
            .and_then(|items| items.first())
            .and_then(SExpr::as_atom)
            == Some(head)
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExpr::Atom(a) if a.starts_with('"') || a.starts_with(':') => write!(f, "{a}"),
            SExpr::Atom(a) if is_simple_symbol(a) || a.parse::<i128>().is_ok() => write!(f, "{a}"),
            SExpr::Atom(a) => write!(f, "|{a}|"),
            SExpr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Parse every top-level S-expression in `input`.
///
/// `;` comments run to end of line.
pub fn parse_all(input: &str) -> Result<Vec<SExpr>, SolverError> {
    let mut reader = Reader {
        chars: input.char_indices().peekable(),
        input,
    };
    let mut out = Vec::new();
    while let Some(expr) = reader.next_expr()? {
        out.push(expr);
    }
    Ok(out)
}

/// Parse exactly one S-expression.
pub fn parse_one(input: &str) -> Result<SExpr, SolverError> {
    let mut exprs = parse_all(input)?;
    match exprs.len() {
        1 => Ok(exprs.remove(0)),
        n => Err(SolverError::ParseError(format!(
            "expected one s-expression, found {n} in `{input}`"
        ))),
    }
}

struct Reader<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    input: &'a str,
}

impl Reader<'_> {
    fn skip_trivia(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else if c == ';' {
                while let Some((_, c)) = self.chars.next() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn next_expr(&mut self) -> Result<Option<SExpr>, SolverError> {
        self.skip_trivia();
        let Some(&(start, c)) = self.chars.peek() else {
            return Ok(None);
        };
        match c {
            '(' => {
                self.chars.next();
                let mut items = Vec::new();
                loop {
                    self.skip_trivia();
                    match self.chars.peek() {
                        Some(&(_, ')')) => {
                            self.chars.next();
                            return Ok(Some(SExpr::List(items)));
                        }
                        Some(_) => {
                            if let Some(item) = self.next_expr()? {
                                items.push(item);
                            }
                        }
                        None => {
                            return Err(SolverError::ParseError(format!(
                                "unbalanced parenthesis at offset {start}"
                            )));
                        }
                    }
                }
            }
            ')' => Err(SolverError::ParseError(format!(
                "unexpected `)` at offset {start}"
            ))),
            '|' => {
                self.chars.next();
                let mut text = String::new();
                for (_, c) in self.chars.by_ref() {
                    if c == '|' {
                        return Ok(Some(SExpr::Atom(text)));
                    }
                    text.push(c);
                }
                Err(SolverError::ParseError(format!(
                    "unterminated quoted symbol at offset {start}"
                )))
            }
            '"' => {
                self.chars.next();
                let mut end = None;
                while let Some((i, c)) = self.chars.next() {
                    if c == '"' {
                        // `""` is an escaped quote inside SMT-LIB strings.
                        if matches!(self.chars.peek(), Some(&(_, '"'))) {
                            self.chars.next();
                            continue;
                        }
                        end = Some(i);
                        break;
                    }
                }
                let end = end.ok_or_else(|| {
                    SolverError::ParseError(format!("unterminated string at offset {start}"))
                })?;
                Ok(Some(SExpr::Atom(self.input[start..=end].to_string())))
            }
            _ => {
                let mut end = start;
                while let Some(&(i, c)) = self.chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' || c == ';' {
                        break;
                    }
                    end = i + c.len_utf8();
                    self.chars.next();
                }
                Ok(Some(SExpr::Atom(self.input[start..end].to_string())))
            }
        }
    }
}
