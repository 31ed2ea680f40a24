use crate::parser::ParseError;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Int,
    Float,
    Str,
    Char,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Ellipsis,
    Define,
    Assign,
    AssignOp,
    Amp,
    Star,
    Arrow,
    IncDec,
    Operator,
    KwPackage,
    KwImport,
    KwFunc,
    KwType,
    KwStruct,
    KwInterface,
    KwMap,
    KwChan,
    KwDefer,
    KwGo,
    KwReturn,
    KwIf,
    KwElse,
    KwFor,
    KwRange,
    KwSwitch,
    KwSelect,
    KwCase,
    KwDefault,
    KwVar,
    KwConst,
    KwBreak,
    KwContinue,
    KwFallthrough,
    KwGoto,
    Eof,
}

#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

fn keyword(text: &str) -> Option<TokenKind> {
    use TokenKind::*;
    let kind = match text {
        "package" => KwPackage,
        "import" => KwImport,
        "func" => KwFunc,
        "type" => KwType,
        "struct" => KwStruct,
        "interface" => KwInterface,
        "map" => KwMap,
        "chan" => KwChan,
        "defer" => KwDefer,
        "go" => KwGo,
        "return" => KwReturn,
        "if" => KwIf,
        "else" => KwElse,
        "for" => KwFor,
        "range" => KwRange,
        "switch" => KwSwitch,
        "select" => KwSelect,
        "case" => KwCase,
        "default" => KwDefault,
        "var" => KwVar,
        "const" => KwConst,
        "break" => KwBreak,
        "continue" => KwContinue,
        "fallthrough" => KwFallthrough,
        "goto" => KwGoto,
        _ => return None,
    };
    Some(kind)
}

/// A token kind that triggers statement-terminator insertion at the next
/// line break.
fn ends_statement(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Ident
            | Int
            | Float
            | Str
            | Char
            | RParen
            | RBrace
            | RBracket
            | IncDec
            | KwReturn
            | KwBreak
            | KwContinue
            | KwFallthrough
    )
}

struct Lexer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    i: usize,
    toks: Vec<Token>,
    insert_semi: bool,
}

impl<'a> Lexer<'a> {
    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.toks.push(Token {
            kind,
            span: Span::new(start as u32, end as u32),
        });
        self.insert_semi = ends_statement(kind);
    }

    fn terminate_line(&mut self, at: usize) {
        if self.insert_semi {
            self.toks.push(Token {
                kind: TokenKind::Semicolon,
                span: Span::point(at as u32),
            });
            self.insert_semi = false;
        }
    }

    fn error(&self, at: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            offset: at as u32,
        }
    }

    fn peek_byte(&self, ahead: usize) -> u8 {
        *self.bytes.get(self.i + ahead).unwrap_or(&0)
    }

    fn scan_string(&mut self, quote: u8) -> Result<(), ParseError> {
        let start = self.i;
        self.i += 1;
        while self.i < self.bytes.len() {
            match self.bytes[self.i] {
                b'\\' => self.i += 2,
                b'\n' => return Err(self.error(start, "string literal not terminated")),
                b if b == quote => {
                    self.i += 1;
                    let kind = if quote == b'\'' {
                        TokenKind::Char
                    } else {
                        TokenKind::Str
                    };
                    self.push(kind, start, self.i);
                    return Ok(());
                }
                _ => self.i += 1,
            }
        }
        Err(self.error(start, "string literal not terminated"))
    }

    fn scan_number(&mut self) {
        let start = self.i;
        let mut kind = TokenKind::Int;
        while self
            .peek_byte(0)
            .is_ascii_alphanumeric()
            || self.peek_byte(0) == b'_'
        {
            self.i += 1;
        }
        if self.peek_byte(0) == b'.' && self.peek_byte(1).is_ascii_digit() {
            kind = TokenKind::Float;
            self.i += 1;
            while self.peek_byte(0).is_ascii_alphanumeric() || self.peek_byte(0) == b'_' {
                self.i += 1;
            }
        }
        self.push(kind, start, self.i);
    }

    fn scan_ident(&mut self) {
        let start = self.i;
        for (off, ch) in self.text[self.i..].char_indices() {
            if ch.is_alphanumeric() || ch == '_' {
                continue;
            }
            self.i = start + off;
            let word = &self.text[start..self.i];
            let kind = keyword(word).unwrap_or(TokenKind::Ident);
            self.push(kind, start, self.i);
            return;
        }
        self.i = self.text.len();
        let kind = keyword(&self.text[start..]).unwrap_or(TokenKind::Ident);
        self.push(kind, start, self.i);
    }

    /// Picks the longest operator starting at the cursor. `candidates` is
    /// ordered longest first.
    fn scan_operator(&mut self, candidates: &[(&str, TokenKind)]) {
        let start = self.i;
        for (pat, kind) in candidates {
            if self.text[self.i..].starts_with(pat) {
                self.i += pat.len();
                self.push(*kind, start, self.i);
                return;
            }
        }
        // candidates always end with the single-character fallback
        unreachable!("operator table misses {:?}", self.bytes[self.i] as char);
    }
}

pub fn lex(text: &str) -> Result<Vec<Token>, ParseError> {
    use TokenKind::*;

    let mut lx = Lexer {
        text,
        bytes: text.as_bytes(),
        i: 0,
        toks: Vec::new(),
        insert_semi: false,
    };

    while lx.i < lx.bytes.len() {
        let b = lx.bytes[lx.i];
        match b {
            b' ' | b'\t' | b'\r' => lx.i += 1,
            b'\n' => {
                lx.terminate_line(lx.i);
                lx.i += 1;
            }
            b'/' if lx.peek_byte(1) == b'/' => {
                while lx.i < lx.bytes.len() && lx.bytes[lx.i] != b'\n' {
                    lx.i += 1;
                }
            }
            b'/' if lx.peek_byte(1) == b'*' => {
                let start = lx.i;
                lx.i += 2;
                let mut newline = false;
                loop {
                    if lx.i >= lx.bytes.len() {
                        return Err(lx.error(start, "comment not terminated"));
                    }
                    if lx.bytes[lx.i] == b'\n' {
                        newline = true;
                    }
                    if lx.bytes[lx.i] == b'*' && lx.peek_byte(1) == b'/' {
                        lx.i += 2;
                        break;
                    }
                    lx.i += 1;
                }
                if newline {
                    lx.terminate_line(start);
                }
            }
            b'"' | b'\'' => lx.scan_string(b)?,
            b'`' => {
                let start = lx.i;
                lx.i += 1;
                loop {
                    if lx.i >= lx.bytes.len() {
                        return Err(lx.error(start, "raw string literal not terminated"));
                    }
                    if lx.bytes[lx.i] == b'`' {
                        lx.i += 1;
                        break;
                    }
                    lx.i += 1;
                }
                lx.push(Str, start, lx.i);
            }
            b'0'..=b'9' => lx.scan_number(),
            b'.' => {
                if lx.peek_byte(1).is_ascii_digit() {
                    let start = lx.i;
                    lx.i += 1;
                    while lx.peek_byte(0).is_ascii_alphanumeric() || lx.peek_byte(0) == b'_' {
                        lx.i += 1;
                    }
                    lx.push(Float, start, lx.i);
                } else if lx.peek_byte(1) == b'.' && lx.peek_byte(2) == b'.' {
                    let start = lx.i;
                    lx.i += 3;
                    lx.push(Ellipsis, start, lx.i);
                } else {
                    let start = lx.i;
                    lx.i += 1;
                    lx.push(Dot, start, lx.i);
                }
            }
            b':' => lx.scan_operator(&[(":=", Define), (":", Colon)]),
            b'=' => lx.scan_operator(&[("==", Operator), ("=", Assign)]),
            b'!' => lx.scan_operator(&[("!=", Operator), ("!", Operator)]),
            b'<' => lx.scan_operator(&[
                ("<<=", AssignOp),
                ("<-", Arrow),
                ("<<", Operator),
                ("<=", Operator),
                ("<", Operator),
            ]),
            b'>' => lx.scan_operator(&[
                (">>=", AssignOp),
                (">>", Operator),
                (">=", Operator),
                (">", Operator),
            ]),
            b'&' => lx.scan_operator(&[
                ("&^=", AssignOp),
                ("&^", Operator),
                ("&&", Operator),
                ("&=", AssignOp),
                ("&", Amp),
            ]),
            b'|' => lx.scan_operator(&[("||", Operator), ("|=", AssignOp), ("|", Operator)]),
            b'+' => lx.scan_operator(&[("++", IncDec), ("+=", AssignOp), ("+", Operator)]),
            b'-' => lx.scan_operator(&[("--", IncDec), ("-=", AssignOp), ("-", Operator)]),
            b'*' => lx.scan_operator(&[("*=", AssignOp), ("*", Star)]),
            b'/' => lx.scan_operator(&[("/=", AssignOp), ("/", Operator)]),
            b'%' => lx.scan_operator(&[("%=", AssignOp), ("%", Operator)]),
            b'^' => lx.scan_operator(&[("^=", AssignOp), ("^", Operator)]),
            b'~' => lx.scan_operator(&[("~", Operator)]),
            b'(' => {
                lx.push(LParen, lx.i, lx.i + 1);
                lx.i += 1;
            }
            b')' => {
                lx.push(RParen, lx.i, lx.i + 1);
                lx.i += 1;
            }
            b'{' => {
                lx.push(LBrace, lx.i, lx.i + 1);
                lx.i += 1;
            }
            b'}' => {
                lx.push(RBrace, lx.i, lx.i + 1);
                lx.i += 1;
            }
            b'[' => {
                lx.push(LBracket, lx.i, lx.i + 1);
                lx.i += 1;
            }
            b']' => {
                lx.push(RBracket, lx.i, lx.i + 1);
                lx.i += 1;
            }
            b',' => {
                lx.push(Comma, lx.i, lx.i + 1);
                lx.i += 1;
            }
            b';' => {
                lx.push(Semicolon, lx.i, lx.i + 1);
                lx.i += 1;
            }
            b'_' | b'a'..=b'z' | b'A'..=b'Z' => lx.scan_ident(),
            _ if b >= 0x80 => {
                let ch = lx.text[lx.i..].chars().next().unwrap_or('\u{fffd}');
                if ch.is_alphabetic() {
                    lx.scan_ident();
                } else {
                    return Err(lx.error(lx.i, format!("unexpected character {ch:?}")));
                }
            }
            _ => {
                return Err(lx.error(lx.i, format!("unexpected character {:?}", b as char)));
            }
        }
    }

    let end = lx.bytes.len();
    lx.terminate_line(end);
    lx.toks.push(Token {
        kind: Eof,
        span: Span::point(end as u32),
    });
    Ok(lx.toks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).expect("lex").into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn inserts_terminator_after_call_at_line_end() {
        use TokenKind::*;
        assert_eq!(
            kinds("defer f()\nreturn\n"),
            vec![
                KwDefer, Ident, LParen, RParen, Semicolon, KwReturn, Semicolon, Eof
            ]
        );
    }

    #[test]
    fn no_terminator_after_comma_or_open_brace() {
        use TokenKind::*;
        assert_eq!(
            kinds("f(a,\nb)\n{\n}"),
            vec![
                Ident, LParen, Ident, Comma, Ident, RParen, Semicolon, LBrace, RBrace, Semicolon,
                Eof
            ]
        );
    }

    #[test]
    fn line_comment_keeps_terminator_insertion() {
        use TokenKind::*;
        assert_eq!(
            kinds("x := 1 // bind\ny := 2"),
            vec![
                Ident, Define, Int, Semicolon, Ident, Define, Int, Semicolon, Eof
            ]
        );
    }

    #[test]
    fn strings_and_raw_strings() {
        use TokenKind::*;
        assert_eq!(kinds("\"a\\\"b\""), vec![Str, Semicolon, Eof]);
        assert_eq!(kinds("`line\nline`"), vec![Str, Semicolon, Eof]);
        assert!(lex("\"open").is_err());
        assert!(lex("\"broken\nrest\"").is_err());
    }

    #[test]
    fn compound_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("a &^= b << 2"),
            vec![Ident, AssignOp, Ident, Operator, Int, Semicolon, Eof]
        );
        assert_eq!(kinds("<-ch"), vec![Arrow, Ident, Semicolon, Eof]);
        assert_eq!(kinds("xs..."), vec![Ident, Ellipsis, Eof]);
    }

    #[test]
    fn block_comment_with_newline_terminates_statement() {
        use TokenKind::*;
        assert_eq!(
            kinds("x = 1 /* a\nb */ y = 2"),
            vec![
                Ident, Assign, Int, Semicolon, Ident, Assign, Int, Semicolon, Eof
            ]
        );
    }
}
