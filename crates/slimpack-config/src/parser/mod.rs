//! Config parser built on the `nom` lexer.
//!
//! Every directive has the shape `<keyword> <argument> ;`. The keyword
//! selects a [`DirectiveKind`] directly, so anything outside the closed
//! set is rejected the moment it is read.

pub mod ast;
pub mod lexer;

use crate::error::{ConfigError, Result};

use self::ast::{Config, Directive, DirectiveKind};
use self::lexer::{Spanned, Token};

/// Cursor into a token stream for directive-at-a-time parsing.
struct TokenCursor<'a> {
    tokens: &'a [Spanned],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    const fn new(tokens: &'a [Spanned]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Line of the most recently consumed token, or 1 before any.
    fn last_line(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(1, |s| s.line)
    }
}

fn describe(tok: Option<&Spanned>) -> String {
    tok.map_or_else(|| "end of input".to_owned(), |s| s.token.to_string())
}

/// Parses a port argument. Only plain decimal digits are accepted, and a
/// leading zero does not switch to octal.
fn parse_port(line: usize, text: &str) -> Result<u16> {
    let invalid = || ConfigError::InvalidPort {
        line,
        value: text.to_owned(),
    };
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match text.parse::<u16>() {
        Ok(0) | Err(_) => Err(invalid()),
        Ok(port) => Ok(port),
    }
}

fn parse_directive(cursor: &mut TokenCursor<'_>, first: &Spanned) -> Result<Directive> {
    let line = first.line;
    let Token::Word(name) = &first.token else {
        return Err(ConfigError::UnexpectedToken {
            line,
            found: first.token.to_string(),
        });
    };
    let kind = DirectiveKind::from_keyword(name).ok_or_else(|| ConfigError::UnknownDirective {
        line,
        name: name.clone(),
    })?;

    let (arg_line, argument) = match cursor.advance() {
        Some(Spanned {
            token: Token::Word(text) | Token::Quoted(text),
            line,
        }) if !text.is_empty() => (*line, text.clone()),
        _ => {
            return Err(ConfigError::MissingArgument {
                line,
                directive: kind.as_str(),
            });
        }
    };

    let directive = match kind {
        DirectiveKind::Env => Directive::Env(argument),
        DirectiveKind::Port => Directive::Port(parse_port(arg_line, &argument)?),
        DirectiveKind::File => Directive::File(argument),
    };

    match cursor.advance() {
        Some(Spanned {
            token: Token::Semicolon,
            ..
        }) => Ok(directive),
        other => Err(ConfigError::MissingTerminator {
            line: other.map_or_else(|| cursor.last_line(), |s| s.line),
            directive: kind.as_str(),
            found: describe(other),
        }),
    }
}

/// Parses config source text into directives, in source order.
///
/// # Errors
///
/// Returns the first lexical, syntactic, or validation error found.
pub fn parse_directives(input: &str) -> Result<Vec<Directive>> {
    let tokens = lexer::tokenize(input)?;
    let mut cursor = TokenCursor::new(&tokens);
    let mut directives = Vec::new();

    while let Some(first) = cursor.advance() {
        directives.push(parse_directive(&mut cursor, first)?);
    }

    Ok(directives)
}

/// Parses and validates config source text.
///
/// # Errors
///
/// Returns a [`ConfigError`] describing the first invalid directive.
pub fn parse_config(input: &str) -> Result<Config> {
    let directives = parse_directives(input)?;
    tracing::debug!(directives = directives.len(), "parsed config");
    Ok(Config::from_directives(directives))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_input() {
        let config = parse_config("").expect("should parse empty input");
        assert!(config.is_empty());
    }

    #[test]
    fn parse_mixed_directives() {
        let input = r#"
// Build-time environment
env HELLO_MESSAGE;
port 8080;
file "static/index.html";
env DATABASE_URL;
port 9090;
"#;
        let config = parse_config(input).expect("should parse");
        assert_eq!(config.env_names, vec!["HELLO_MESSAGE", "DATABASE_URL"]);
        assert_eq!(config.ports, vec![8080, 9090]);
        assert_eq!(config.files, vec!["static/index.html"]);
    }

    #[test]
    fn parse_preserves_duplicates_in_order() {
        let config = parse_config("port 80; port 443; port 80; env A; env A;")
            .expect("should parse");
        assert_eq!(config.ports, vec![80, 443, 80]);
        assert_eq!(config.env_names, vec!["A", "A"]);
    }

    #[test]
    fn parse_directives_keeps_interleaved_order() {
        let directives = parse_directives("port 1; env X; port 2;").expect("should parse");
        assert_eq!(
            directives,
            vec![
                Directive::Port(1),
                Directive::Env("X".into()),
                Directive::Port(2),
            ]
        );
    }

    #[test]
    fn parse_port_bounds() {
        assert_eq!(parse_config("port 1;").expect("min").ports, vec![1]);
        assert_eq!(parse_config("port 65535;").expect("max").ports, vec![65535]);
    }

    #[test]
    fn parse_env_name_is_kept_as_written() {
        let config = parse_config("env not-a-shell.name;").expect("should parse");
        assert_eq!(config.env_names, vec!["not-a-shell.name"]);
    }

    #[test]
    fn parse_unknown_directive_fails() {
        let err = parse_config("env A;\nvolume /data;").unwrap_err();
        match err {
            ConfigError::UnknownDirective { line, name } => {
                assert_eq!(line, 2);
                assert_eq!(name, "volume");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_uppercase_keyword_is_unknown() {
        let err = parse_config("PORT 80;").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDirective { .. }), "got: {err}");
    }

    #[test]
    fn parse_port_zero_fails() {
        let err = parse_config("port 0;").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { ref value, .. } if value == "0"));
    }

    #[test]
    fn parse_port_above_range_fails() {
        let err = parse_config("port 65536;").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { ref value, .. } if value == "65536"));
    }

    #[test]
    fn parse_port_non_numeric_fails() {
        for bad in ["http", "-1", "+80", "80.0", "0x50", "99999999999999999999"] {
            let err = parse_config(&format!("port {bad};")).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidPort { .. }),
                "port {bad}: got {err}"
            );
        }
    }

    #[test]
    fn parse_missing_terminator_fails() {
        let err = parse_config("port 80\nport 81;").unwrap_err();
        match err {
            ConfigError::MissingTerminator { line, directive, found } => {
                assert_eq!(line, 2);
                assert_eq!(directive, "port");
                assert_eq!(found, "`port`");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_terminator_at_end_of_input_fails() {
        let err = parse_config("env A").unwrap_err();
        assert!(err.to_string().contains("end of input"), "got: {err}");
    }

    #[test]
    fn parse_missing_argument_fails() {
        let err = parse_config("env;").unwrap_err();
        assert!(matches!(err, ConfigError::MissingArgument { directive: "env", .. }));
    }

    #[test]
    fn parse_empty_quoted_argument_fails() {
        for input in ["env \"\";", "file \"\";", "port \"\";"] {
            let err = parse_config(input).unwrap_err();
            assert!(
                matches!(err, ConfigError::MissingArgument { line: 1, .. }),
                "{input}: got {err}"
            );
        }
    }

    #[test]
    fn parse_port_leading_zeros_are_decimal() {
        assert_eq!(parse_config("port 010;").expect("010").ports, vec![10]);
        assert_eq!(parse_config("port 08080;").expect("08080").ports, vec![8080]);
        assert_eq!(parse_config("port 00001;").expect("00001").ports, vec![1]);
    }

    #[test]
    fn parse_stray_semicolon_fails() {
        let err = parse_config(";").unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedToken { .. }), "got: {err}");
    }

    #[test]
    fn parse_quoted_keyword_fails() {
        let err = parse_config("\"env\" A;").unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedToken { .. }), "got: {err}");
    }

    #[test]
    fn parse_error_message_names_line() {
        let err = parse_config("\n\nport 70000;").unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 3: invalid port `70000` (expected an integer in 1..=65535)"
        );
    }

    #[test]
    fn parse_many_directives_counts_ports() {
        let mut input = String::new();
        for i in 1..=200_u16 {
            input.push_str(&format!("port {i};\nenv VAR_{i};\nfile f{i};\n"));
        }
        let config = parse_config(&input).expect("should parse");
        assert_eq!(config.ports.len(), 200);
        assert_eq!(config.ports.first(), Some(&1));
        assert_eq!(config.ports.last(), Some(&200));
        assert_eq!(config.env_names.len(), 200);
        assert_eq!(config.files.len(), 200);
    }
}
