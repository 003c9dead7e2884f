//! Token stream handling.
//!
//! [`TokenCursor`] is the explicit read position handed to parse
//! callbacks, so predicates consume their own arguments without any
//! process-wide option-parsing state. [`split_query`] turns a query string
//! into the flat token list the builder consumes.

use logos::Logos;

use crate::error::{QueryError, Result};

/// A read cursor over a flat token list.
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: Vec<&'a str>,
    index: usize,
    keyword: Option<usize>,
}

impl<'a> TokenCursor<'a> {
    pub fn new<T: AsRef<str>>(tokens: &'a [T]) -> Self {
        Self {
            tokens: tokens.iter().map(AsRef::as_ref).collect(),
            index: 0,
            keyword: None,
        }
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.index).copied()
    }

    /// Number of tokens consumed so far.
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> &[&'a str] {
        &self.tokens[self.index..]
    }

    pub fn is_empty(&self) -> bool {
        self.index >= self.tokens.len()
    }

    /// The raw token that selected the predicate currently being parsed.
    pub fn keyword(&self) -> Option<&'a str> {
        self.keyword.and_then(|index| self.tokens.get(index).copied())
    }

    pub(crate) fn mark_keyword(&mut self) {
        self.keyword = self.index.checked_sub(1);
    }

    pub(crate) fn rewind(&mut self, position: usize) {
        self.index = position.min(self.tokens.len());
    }

    /// Consumes the next token as an argument, failing when the stream ends.
    pub fn expect_argument(&mut self, what: &str) -> Result<&'a str> {
        let keyword = self.keyword().unwrap_or("predicate");
        self.next().ok_or_else(|| {
            QueryError::InvalidOrMissingArgument(format!("{keyword} requires {what}"))
        })
    }
}

impl<'a> Iterator for TokenCursor<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.index += 1;
        Some(token)
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"\s+")]
enum RawToken<'s> {
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    Quoted(&'s str),

    #[regex(r#"[^\s"]+"#, |lex| lex.slice())]
    Bare(&'s str),
}

/// Splits a query string into tokens.
///
/// Tokens are separated by whitespace. Double quotes group a phrase into a
/// single token; inside quotes a backslash escapes the next character.
pub fn split_query(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(input);

    while let Some(token) = lexer.next() {
        match token {
            Ok(RawToken::Bare(raw)) => tokens.push(raw.to_string()),
            Ok(RawToken::Quoted(raw)) => tokens.push(unescape_phrase(raw)),
            Err(()) => {
                return Err(QueryError::Syntax(format!(
                    "missing closing quote near byte {}",
                    lexer.span().start
                )));
            }
        }
    }

    Ok(tokens)
}

fn unescape_phrase(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut phrase = String::with_capacity(inner.len());
    let mut escaped = false;

    for ch in inner.chars() {
        if escaped {
            phrase.push(ch);
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        phrase.push(ch);
    }

    phrase
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        let tokens = split_query("  -loaded   -and ( -nonloadable ) ").expect("split");
        assert_eq!(tokens, vec!["-loaded", "-and", "(", "-nonloadable", ")"]);
    }

    #[test]
    fn quoted_phrase_is_one_token() {
        let tokens = split_query(r#"-property CFBundleName "IO Kit""#).expect("split");
        assert_eq!(tokens, vec!["-property", "CFBundleName", "IO Kit"]);
    }

    #[test]
    fn escapes_inside_quotes() {
        let tokens = split_query(r#""say \"hi\"" "back\\slash""#).expect("split");
        assert_eq!(tokens, vec![r#"say "hi""#, r"back\slash"]);
    }

    #[test]
    fn empty_quotes_yield_empty_token() {
        let tokens = split_query(r#"-name """#).expect("split");
        assert_eq!(tokens, vec!["-name", ""]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = split_query(r#"-name "unterminated"#).expect_err("open quote");
        assert!(matches!(err, QueryError::Syntax(_)));
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(split_query("").expect("split").is_empty());
        assert!(split_query(" \t\n").expect("split").is_empty());
    }

    #[test]
    fn cursor_tracks_position_and_keyword() {
        let tokens = ["-property", "Name", "Value", "-loaded"];
        let mut cursor = TokenCursor::new(&tokens);
        assert_eq!(cursor.next(), Some("-property"));
        cursor.mark_keyword();
        assert_eq!(cursor.keyword(), Some("-property"));
        assert_eq!(cursor.expect_argument("a name"), Ok("Name"));
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.remaining(), &["Value", "-loaded"]);
        assert_eq!(cursor.by_ref().collect::<Vec<_>>(), vec!["Value", "-loaded"]);
        assert!(cursor.is_empty());
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn expect_argument_reports_missing_value() {
        let tokens = ["-version"];
        let mut cursor = TokenCursor::new(&tokens);
        cursor.next();
        cursor.mark_keyword();
        let err = cursor.expect_argument("a version").expect_err("missing");
        assert_eq!(
            err,
            QueryError::InvalidOrMissingArgument("-version requires a version".to_string())
        );
        assert!(cursor.is_empty());
    }
}
