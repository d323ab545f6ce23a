//! Lexer for `OpenQASM` 2.0.

use logos::Logos;

/// Tokens for `OpenQASM` 2.0.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qreg")]
    QReg,

    #[token("creg")]
    CReg,

    #[token("gate")]
    Gate,

    #[token("opaque")]
    Opaque,

    #[token("if")]
    If,

    #[token("measure")]
    Measure,

    #[token("reset")]
    Reset,

    #[token("barrier")]
    Barrier,

    #[token("pi")]
    Pi,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Real(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    Integer(u64),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len() - 1].to_string())
    })]
    Str(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("^")]
    Caret,

    #[token("==")]
    EqEq,

    #[token("->")]
    Arrow,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::QReg => write!(f, "qreg"),
            Token::CReg => write!(f, "creg"),
            Token::Gate => write!(f, "gate"),
            Token::Opaque => write!(f, "opaque"),
            Token::If => write!(f, "if"),
            Token::Measure => write!(f, "measure"),
            Token::Reset => write!(f, "reset"),
            Token::Barrier => write!(f, "barrier"),
            Token::Pi => write!(f, "pi"),
            Token::Real(v) => write!(f, "{v}"),
            Token::Integer(v) => write!(f, "{v}"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::EqEq => write!(f, "=="),
            Token::Arrow => write!(f, "->"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// A token with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    /// The token.
    pub token: Token,
    /// Line of the token, starting at 1.
    pub line: usize,
}

/// Tokenize source, stopping at the first invalid token.
///
/// The error carries the byte offset and the offending text.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, (usize, String)> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut scanned = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        line += source[scanned..span.start].matches('\n').count();
        scanned = span.start;
        match result {
            Ok(token) => tokens.push(SpannedToken { token, line }),
            // Integer literals past u64 are still valid real constants.
            Err(()) if lexer.slice().bytes().all(|b| b.is_ascii_digit()) => {
                let value = lexer.slice().parse::<f64>().map_err(|e| (span.start, e.to_string()))?;
                tokens.push(SpannedToken {
                    token: Token::Real(value),
                    line,
                });
            }
            Err(()) => {
                return Err((span.start, format!("Invalid token: '{}'", lexer.slice())));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_header() {
        let tokens = kinds("OPENQASM 2.0;\ninclude \"qelib1.inc\";");
        assert_eq!(tokens[0], Token::OpenQasm);
        assert!(matches!(tokens[1], Token::Real(v) if (v - 2.0).abs() < 1e-12));
        assert_eq!(tokens[3], Token::Include);
        assert_eq!(tokens[4], Token::Str("qelib1.inc".into()));
    }

    #[test]
    fn test_measure_arrow_and_condition() {
        let tokens = kinds("if(c==1) x q[0]; measure q -> c;");
        assert_eq!(tokens[0], Token::If);
        assert_eq!(tokens[3], Token::EqEq);
        assert!(tokens.contains(&Token::Arrow));
        assert!(tokens.contains(&Token::Measure));
    }

    #[test]
    fn test_reals() {
        let tokens = kinds("rz(1.5e-3) q; rz(.25) q; rz(2e2) q;");
        assert!(tokens.contains(&Token::Real(1.5e-3)));
        assert!(tokens.contains(&Token::Real(0.25)));
        assert!(tokens.contains(&Token::Real(200.0)));
    }

    #[test]
    fn test_integer_past_u64_is_real() {
        let tokens = kinds("rz(18446744073709551615) q; rz(100000000000000000000) q;");
        assert!(tokens.contains(&Token::Integer(u64::MAX)));
        assert!(tokens.contains(&Token::Real(1e20)));
    }

    #[test]
    fn test_comments_and_lines() {
        let source = "// header\nqreg q[2];\n/* block\n comment */\ncreg c[2];";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens.len(), 12);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[6].line, 5);
    }

    #[test]
    fn test_invalid_token() {
        let (offset, message) = tokenize("qreg q[2];\n$").unwrap_err();
        assert_eq!(offset, 11);
        assert!(message.contains('$'));
    }
}
