//! Tokenization of config source text using `nom`.
//!
//! Produces a stream of line-tagged [`Token`]s for the parser. Whitespace
//! and `//` line comments are discarded between tokens.

use std::fmt;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace1, not_line_ending},
    combinator::value,
    multi::many0,
    sequence::preceded,
};

use crate::error::{ConfigError, Result};

/// A token in the config language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A bare word: directive name, env name, port, or unquoted path.
    Word(String),
    /// A double-quoted string with escapes already processed.
    Quoted(String),
    /// `;` directive terminator.
    Semicolon,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(word) => write!(f, "`{word}`"),
            Self::Quoted(text) => write!(f, "{text:?}"),
            Self::Semicolon => f.write_str("`;`"),
        }
    }
}

/// A token together with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    /// The token itself.
    pub token: Token,
    /// Line the token starts on.
    pub line: usize,
}

/// Skippable items: whitespace or line comments.
fn skip_trivia(input: &str) -> IResult<&str, ()> {
    let comment = value((), preceded(tag("//"), not_line_ending));
    let ws = value((), multispace1);
    let (input, _) = many0(alt((ws, comment))).parse(input)?;
    Ok((input, ()))
}

/// Parses a double-quoted string with `\n`, `\t`, `\\`, and `\"` escapes.
fn quoted(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('"')(input)?;
    let mut result = String::new();
    let mut chars = input.char_indices();
    loop {
        match chars.next() {
            Some((idx, '"')) => return Ok((&input[idx + 1..], Token::Quoted(result))),
            Some((_, '\\')) => match chars.next() {
                Some((_, 'n')) => result.push('\n'),
                Some((_, 't')) => result.push('\t'),
                Some((_, c @ ('\\' | '"'))) => result.push(c),
                Some((_, c)) => {
                    result.push('\\');
                    result.push(c);
                }
                None => break,
            },
            Some((_, c)) => result.push(c),
            None => break,
        }
    }
    Err(nom::Err::Failure(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && c != ';' && c != '"'
}

fn word(input: &str) -> IResult<&str, Token> {
    let (input, text) = take_while1(is_word_char)(input)?;
    Ok((input, Token::Word(text.to_owned())))
}

fn single_token(input: &str) -> IResult<&str, Token> {
    alt((quoted, value(Token::Semicolon, char(';')), word)).parse(input)
}

fn count_newlines(consumed: &str) -> usize {
    consumed.bytes().filter(|&b| b == b'\n').count()
}

/// Tokenizes config source text.
///
/// # Errors
///
/// Returns [`ConfigError::Lex`] if a quoted string is not terminated.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut remaining = input;
    let mut line = 1;

    loop {
        let (rest, ()) = skip_trivia(remaining).map_err(|e| ConfigError::Lex {
            line,
            message: format!("failed to skip whitespace: {e}"),
        })?;
        line += count_newlines(&remaining[..remaining.len() - rest.len()]);
        remaining = rest;

        if remaining.is_empty() {
            break;
        }

        let (rest, token) = single_token(remaining).map_err(|e| ConfigError::Lex {
            line,
            message: if remaining.starts_with('"') {
                "unterminated string literal".to_owned()
            } else {
                format!(
                    "unexpected input at \"{}\" ({e})",
                    remaining.chars().take(20).collect::<String>()
                )
            },
        })?;
        tokens.push(Spanned { token, line });
        line += count_newlines(&remaining[..remaining.len() - rest.len()]);
        remaining = rest;
    }

    Ok(tokens)
}
