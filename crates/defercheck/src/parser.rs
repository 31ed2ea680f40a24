//! Recursive-descent parser for the analyzed language subset.
//!
//! The parser is tolerant where the analyses do not care: statement shapes
//! it does not model are preserved as opaque spanned nodes with their child
//! blocks intact, so scoped-exit statements are still reachable anywhere.
//! It is strict about bracket balance and literal termination; a file that
//! fails here produces a parse diagnostic and no analysis.

use std::fmt;

use crate::ast::{
    Block, CallExpr, Decl, DeferStmt, Expr, ExprKind, ExprStmt, Field, FieldList, File, ForStmt,
    FuncDecl, FuncLit, Ident, IfStmt, ImportDecl, ImportSpec, OtherStmt, PackageClause, Receiver,
    ReturnStmt, ShortVarDecl, Stmt, TypeDecl, TypeExpr, TypeExprKind, TypeSpec, UnaryOp,
};
use crate::source::SourceFile;
use crate::span::Span;
use crate::token::{lex, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub offset: u32,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for ParseError {}

pub fn parse_file(src: &SourceFile) -> Result<File, ParseError> {
    let toks = lex(src.text())?;
    let mut p = Parser { src, toks, pos: 0 };
    p.parse_file()
}

struct Parser<'a> {
    src: &'a SourceFile,
    toks: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Token {
        self.toks[self.pos.min(self.toks.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn kind_at(&self, ahead: usize) -> TokenKind {
        self.toks
            .get(self.pos + ahead)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn bump(&mut self) -> Token {
        let t = self.peek();
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        t
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.err_here(format!("expected {what}")))
        }
    }

    fn text(&self, tok: Token) -> &'a str {
        &self.src.text()[tok.span.start as usize..tok.span.end as usize]
    }

    fn err_here(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            offset: self.peek().span.start,
        }
    }

    fn skip_semis(&mut self) {
        while self.eat(TokenKind::Semicolon) {}
    }

    fn parse_file(&mut self) -> Result<File, ParseError> {
        let pkg_kw = self.expect(TokenKind::KwPackage, "`package` clause")?;
        let name_tok = self.expect(TokenKind::Ident, "package name")?;
        let package = PackageClause {
            name: self.text(name_tok).to_string(),
            span: Span::new(pkg_kw.span.start, name_tok.span.end),
        };
        self.skip_semis();

        let mut imports = Vec::new();
        while self.at(TokenKind::KwImport) {
            imports.push(self.parse_import_decl()?);
            self.skip_semis();
        }

        let mut decls = Vec::new();
        loop {
            self.skip_semis();
            match self.kind() {
                TokenKind::Eof => break,
                TokenKind::KwFunc => decls.push(Decl::Func(self.parse_func_decl()?)),
                TokenKind::KwType => decls.push(Decl::Type(self.parse_type_decl()?)),
                TokenKind::KwVar | TokenKind::KwConst => {
                    decls.push(Decl::Other(self.skip_gen_decl()?))
                }
                TokenKind::KwImport => imports.push(self.parse_import_decl()?),
                _ => return Err(self.err_here("expected declaration")),
            }
        }

        Ok(File {
            package,
            imports,
            decls,
            span: Span::new(0, self.src.len()),
        })
    }

    fn parse_import_decl(&mut self) -> Result<ImportDecl, ParseError> {
        let kw = self.expect(TokenKind::KwImport, "`import`")?;
        if self.at(TokenKind::LParen) {
            self.bump();
            let mut specs = Vec::new();
            loop {
                self.skip_semis();
                if self.at(TokenKind::RParen) {
                    break;
                }
                specs.push(self.parse_import_spec()?);
            }
            let rp = self.expect(TokenKind::RParen, "`)` closing import group")?;
            Ok(ImportDecl {
                grouped: true,
                specs,
                rparen: Some(rp.span.start),
                span: Span::new(kw.span.start, rp.span.end),
            })
        } else {
            let spec = self.parse_import_spec()?;
            let end = spec.span.end;
            Ok(ImportDecl {
                grouped: false,
                specs: vec![spec],
                rparen: None,
                span: Span::new(kw.span.start, end),
            })
        }
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec, ParseError> {
        let start = self.peek().span.start;
        let alias = if self.at(TokenKind::Ident) {
            let t = self.bump();
            Some(self.text(t).to_string())
        } else if self.at(TokenKind::Dot) {
            self.bump();
            Some(".".to_string())
        } else {
            None
        };
        let s = self.expect(TokenKind::Str, "import path string")?;
        let raw = self.text(s);
        let path = unquote_string(raw).ok_or_else(|| ParseError {
            message: format!("malformed import path {raw}"),
            offset: s.span.start,
        })?;
        Ok(ImportSpec {
            alias,
            path,
            span: Span::new(start, s.span.end),
        })
    }

    fn parse_type_decl(&mut self) -> Result<TypeDecl, ParseError> {
        let kw = self.expect(TokenKind::KwType, "`type`")?;
        let mut specs = Vec::new();
        let end;
        if self.at(TokenKind::LParen) {
            self.bump();
            loop {
                self.skip_semis();
                if self.at(TokenKind::RParen) {
                    break;
                }
                specs.push(self.parse_type_spec()?);
            }
            let rp = self.expect(TokenKind::RParen, "`)` closing type group")?;
            end = rp.span.end;
        } else {
            let spec = self.parse_type_spec()?;
            end = spec.span.end;
            specs.push(spec);
        }
        Ok(TypeDecl {
            specs,
            span: Span::new(kw.span.start, end),
        })
    }

    fn parse_type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        let name_tok = self.expect(TokenKind::Ident, "type name")?;
        if self.at(TokenKind::LBracket) {
            self.skip_balanced()?;
        }
        self.eat(TokenKind::Assign);
        let ty = self.parse_type()?;
        Ok(TypeSpec {
            name: self.text(name_tok).to_string(),
            span: Span::new(name_tok.span.start, ty.span.end),
        })
    }

    fn skip_gen_decl(&mut self) -> Result<Span, ParseError> {
        let kw = self.bump();
        if self.at(TokenKind::LParen) {
            let close = self.skip_balanced()?;
            return Ok(Span::new(kw.span.start, close.span.end));
        }
        let mut end = kw.span.end;
        loop {
            match self.kind() {
                TokenKind::Semicolon => {
                    self.bump();
                    break;
                }
                TokenKind::Eof | TokenKind::RBrace => break,
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => {
                    end = self.skip_balanced()?.span.end;
                }
                _ => end = self.bump().span.end,
            }
        }
        Ok(Span::new(kw.span.start, end))
    }

    /// Consumes from the opening bracket at the cursor through its matching
    /// close, honoring nesting; returns the closing token.
    fn skip_balanced(&mut self) -> Result<Token, ParseError> {
        let open = self.bump();
        let close_kind = match open.kind {
            TokenKind::LParen => TokenKind::RParen,
            TokenKind::LBrace => TokenKind::RBrace,
            TokenKind::LBracket => TokenKind::RBracket,
            _ => {
                return Err(ParseError {
                    message: "expected an opening bracket".to_string(),
                    offset: open.span.start,
                })
            }
        };
        loop {
            match self.kind() {
                TokenKind::Eof => {
                    return Err(ParseError {
                        message: "unexpected end of file before closing bracket".to_string(),
                        offset: open.span.start,
                    })
                }
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => {
                    self.skip_balanced()?;
                }
                k if k == close_kind => return Ok(self.bump()),
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                    return Err(self.err_here("mismatched bracket"))
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn parse_func_decl(&mut self) -> Result<FuncDecl, ParseError> {
        let kw = self.expect(TokenKind::KwFunc, "`func`")?;
        let receiver = if self.at(TokenKind::LParen) {
            Some(self.parse_receiver()?)
        } else {
            None
        };
        let name_tok = self.expect(TokenKind::Ident, "function name")?;
        if self.at(TokenKind::LBracket) {
            self.skip_balanced()?;
        }
        let params = self.parse_field_list()?;
        let results = self.parse_results()?;
        let (body, end) = if self.at(TokenKind::LBrace) {
            let b = self.parse_block()?;
            let end = b.span.end;
            (Some(b), end)
        } else {
            let end = results
                .as_ref()
                .map(|r| r.span.end)
                .unwrap_or(params.span.end);
            (None, end)
        };
        Ok(FuncDecl {
            receiver,
            name: self.text(name_tok).to_string(),
            name_span: name_tok.span,
            params,
            results,
            body,
            span: Span::new(kw.span.start, end),
        })
    }

    fn parse_receiver(&mut self) -> Result<Receiver, ParseError> {
        let lp = self.expect(TokenKind::LParen, "receiver")?;
        let mut name = None;
        let mut type_name = None;
        let mut pointer = false;
        match self.kind() {
            TokenKind::Ident => {
                let first = self.bump();
                match self.kind() {
                    TokenKind::RParen | TokenKind::LBracket => {
                        type_name = Some(self.text(first).to_string());
                    }
                    TokenKind::Star => {
                        self.bump();
                        pointer = true;
                        let t = self.expect(TokenKind::Ident, "receiver type")?;
                        name = Some(self.text(first).to_string());
                        type_name = Some(self.text(t).to_string());
                    }
                    TokenKind::Ident => {
                        let t = self.bump();
                        name = Some(self.text(first).to_string());
                        type_name = Some(self.text(t).to_string());
                    }
                    _ => {}
                }
            }
            TokenKind::Star => {
                self.bump();
                pointer = true;
                if self.at(TokenKind::Ident) {
                    let t = self.bump();
                    type_name = Some(self.text(t).to_string());
                }
            }
            _ => {}
        }
        if self.at(TokenKind::LBracket) {
            self.skip_balanced()?;
        }
        // anything left over means an unrecognized receiver shape
        while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
            type_name = None;
            if matches!(
                self.kind(),
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket
            ) {
                self.skip_balanced()?;
            } else {
                self.bump();
            }
        }
        let rp = self.expect(TokenKind::RParen, "`)` closing receiver")?;
        Ok(Receiver {
            name,
            type_name,
            pointer,
            span: Span::new(lp.span.start, rp.span.end),
        })
    }

    fn parse_field_list(&mut self) -> Result<FieldList, ParseError> {
        let lp = self.expect(TokenKind::LParen, "`(`")?;
        let mut fields = Vec::new();
        loop {
            self.skip_semis();
            if self.at(TokenKind::RParen) {
                break;
            }
            fields.push(self.parse_field()?);
            self.skip_semis();
            if !self.eat(TokenKind::Comma) && !self.at(TokenKind::RParen) {
                return Err(self.err_here("expected `,` or `)` in parameter list"));
            }
        }
        let rp = self.expect(TokenKind::RParen, "`)`")?;
        Ok(FieldList {
            fields,
            parenthesized: true,
            span: Span::new(lp.span.start, rp.span.end),
        })
    }

    /// One field of a parameter/result list. Leading identifiers are only
    /// names when a type follows; otherwise the parse rewinds and treats
    /// them as bare unnamed types, so `(int, error)` and `(n int, err
    /// error)` both come out right.
    fn parse_field(&mut self) -> Result<Field, ParseError> {
        let save = self.pos;
        let mut names: Vec<Ident> = Vec::new();
        if self.at(TokenKind::Ident) {
            let t = self.bump();
            names.push(Ident {
                name: self.text(t).to_string(),
                span: t.span,
            });
            while self.at(TokenKind::Comma) && self.kind_at(1) == TokenKind::Ident {
                self.bump();
                let t = self.bump();
                names.push(Ident {
                    name: self.text(t).to_string(),
                    span: t.span,
                });
            }
        }
        if !names.is_empty() && self.starts_type() {
            let ty = self.parse_type()?;
            return Ok(Field { names, ty });
        }
        self.pos = save;
        let ty = self.parse_type()?;
        Ok(Field {
            names: Vec::new(),
            ty,
        })
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Ident
                | TokenKind::Star
                | TokenKind::LBracket
                | TokenKind::KwMap
                | TokenKind::KwChan
                | TokenKind::KwFunc
                | TokenKind::KwStruct
                | TokenKind::KwInterface
                | TokenKind::Arrow
                | TokenKind::LParen
                | TokenKind::Ellipsis
        )
    }

    fn parse_results(&mut self) -> Result<Option<FieldList>, ParseError> {
        if self.at(TokenKind::LParen) {
            return Ok(Some(self.parse_field_list()?));
        }
        if self.starts_type() {
            let ty = self.parse_type()?;
            let span = ty.span;
            return Ok(Some(FieldList {
                fields: vec![Field {
                    names: Vec::new(),
                    ty,
                }],
                parenthesized: false,
                span,
            }));
        }
        Ok(None)
    }

    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let start = self.peek().span.start;
        match self.kind() {
            TokenKind::Star => {
                self.bump();
                let inner = self.parse_type()?;
                let end = inner.span.end;
                Ok(TypeExpr {
                    kind: TypeExprKind::Pointer(Box::new(inner)),
                    span: Span::new(start, end),
                })
            }
            TokenKind::Ident => {
                let t = self.bump();
                if self.at(TokenKind::Dot) {
                    self.bump();
                    let sel = self.expect(TokenKind::Ident, "qualified type name")?;
                    let mut end = sel.span.end;
                    if self.at(TokenKind::LBracket) {
                        end = self.skip_balanced()?.span.end;
                    }
                    Ok(TypeExpr {
                        kind: TypeExprKind::Qualified(
                            self.text(t).to_string(),
                            self.text(sel).to_string(),
                        ),
                        span: Span::new(start, end),
                    })
                } else if self.at(TokenKind::LBracket) {
                    let end = self.skip_balanced()?.span.end;
                    Ok(TypeExpr {
                        kind: TypeExprKind::Other,
                        span: Span::new(start, end),
                    })
                } else {
                    Ok(TypeExpr {
                        kind: TypeExprKind::Name(self.text(t).to_string()),
                        span: t.span,
                    })
                }
            }
            TokenKind::LBracket => {
                self.bump();
                if self.eat(TokenKind::RBracket) {
                    let inner = self.parse_type()?;
                    let end = inner.span.end;
                    Ok(TypeExpr {
                        kind: TypeExprKind::Slice(Box::new(inner)),
                        span: Span::new(start, end),
                    })
                } else {
                    loop {
                        match self.kind() {
                            TokenKind::RBracket => break,
                            TokenKind::Eof => {
                                return Err(self.err_here("unterminated array type"))
                            }
                            TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => {
                                self.skip_balanced()?;
                            }
                            _ => {
                                self.bump();
                            }
                        }
                    }
                    self.bump();
                    let inner = self.parse_type()?;
                    let end = inner.span.end;
                    Ok(TypeExpr {
                        kind: TypeExprKind::Array(Box::new(inner)),
                        span: Span::new(start, end),
                    })
                }
            }
            TokenKind::KwMap => {
                self.bump();
                self.expect(TokenKind::LBracket, "`[` after `map`")?;
                let key = self.parse_type()?;
                self.expect(TokenKind::RBracket, "`]` closing map key type")?;
                let val = self.parse_type()?;
                let end = val.span.end;
                Ok(TypeExpr {
                    kind: TypeExprKind::Map(Box::new(key), Box::new(val)),
                    span: Span::new(start, end),
                })
            }
            TokenKind::KwChan => {
                self.bump();
                self.eat(TokenKind::Arrow);
                let inner = self.parse_type()?;
                let end = inner.span.end;
                Ok(TypeExpr {
                    kind: TypeExprKind::Chan(Box::new(inner)),
                    span: Span::new(start, end),
                })
            }
            TokenKind::Arrow => {
                self.bump();
                self.expect(TokenKind::KwChan, "`chan` after `<-`")?;
                let inner = self.parse_type()?;
                let end = inner.span.end;
                Ok(TypeExpr {
                    kind: TypeExprKind::Chan(Box::new(inner)),
                    span: Span::new(start, end),
                })
            }
            TokenKind::KwFunc => {
                self.bump();
                let params = self.parse_field_list()?;
                let results = self.parse_results()?;
                let end = results
                    .as_ref()
                    .map(|r| r.span.end)
                    .unwrap_or(params.span.end);
                Ok(TypeExpr {
                    kind: TypeExprKind::Other,
                    span: Span::new(start, end),
                })
            }
            TokenKind::KwStruct | TokenKind::KwInterface => {
                self.bump();
                if !self.at(TokenKind::LBrace) {
                    return Err(self.err_here("expected `{` in type literal"));
                }
                let close = self.skip_balanced()?;
                Ok(TypeExpr {
                    kind: TypeExprKind::Other,
                    span: Span::new(start, close.span.end),
                })
            }
            TokenKind::Ellipsis => {
                self.bump();
                let inner = self.parse_type()?;
                let end = inner.span.end;
                Ok(TypeExpr {
                    kind: TypeExprKind::Other,
                    span: Span::new(start, end),
                })
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_type()?;
                let rp = self.expect(TokenKind::RParen, "`)`")?;
                Ok(TypeExpr {
                    kind: inner.kind,
                    span: Span::new(start, rp.span.end),
                })
            }
            _ => Err(self.err_here("expected type")),
        }
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let lb = self.expect(TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        loop {
            self.skip_semis();
            if self.at(TokenKind::RBrace) || self.at(TokenKind::Eof) {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        let rb = self.expect(TokenKind::RBrace, "`}` closing block")?;
        Ok(Block {
            stmts,
            lbrace: lb.span.start,
            rbrace: rb.span.start,
            span: Span::new(lb.span.start, rb.span.end),
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.kind() {
            TokenKind::KwDefer => self.parse_defer_stmt(),
            TokenKind::KwGo => {
                let kw = self.bump();
                let e = self.parse_expr()?;
                let span = Span::new(kw.span.start, e.span.end);
                Ok(Stmt::Other(OtherStmt {
                    blocks: Vec::new(),
                    exprs: vec![e],
                    span,
                }))
            }
            TokenKind::KwReturn => {
                let kw = self.bump();
                let mut exprs = Vec::new();
                if !matches!(
                    self.kind(),
                    TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
                ) {
                    exprs.push(self.parse_expr()?);
                    while self.eat(TokenKind::Comma) {
                        exprs.push(self.parse_expr()?);
                    }
                }
                let end = exprs.last().map(|e| e.span.end).unwrap_or(kw.span.end);
                Ok(Stmt::Return(ReturnStmt {
                    exprs,
                    span: Span::new(kw.span.start, end),
                }))
            }
            TokenKind::KwIf => self.parse_if_stmt(),
            TokenKind::KwFor => {
                let kw = self.bump();
                self.skip_header()?;
                let body = self.parse_block()?;
                let span = Span::new(kw.span.start, body.span.end);
                Ok(Stmt::For(ForStmt { body, span }))
            }
            TokenKind::KwSwitch | TokenKind::KwSelect => self.parse_switch_stmt(),
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::KwVar | TokenKind::KwConst | TokenKind::KwType => {
                let span = self.skip_gen_decl()?;
                Ok(Stmt::Other(OtherStmt {
                    blocks: Vec::new(),
                    exprs: Vec::new(),
                    span,
                }))
            }
            TokenKind::KwBreak
            | TokenKind::KwContinue
            | TokenKind::KwGoto
            | TokenKind::KwFallthrough => {
                let kw = self.bump();
                let mut end = kw.span.end;
                if self.at(TokenKind::Ident) {
                    end = self.bump().span.end;
                }
                Ok(Stmt::Other(OtherStmt {
                    blocks: Vec::new(),
                    exprs: Vec::new(),
                    span: Span::new(kw.span.start, end),
                }))
            }
            _ => self.parse_simple_stmt(),
        }
    }

    fn parse_defer_stmt(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.expect(TokenKind::KwDefer, "`defer`")?;
        let e = self.parse_expr()?;
        let span = Span::new(kw.span.start, e.span.end);
        match e.kind {
            ExprKind::Call(call) => Ok(Stmt::Defer(DeferStmt { call, span })),
            other => Ok(Stmt::Other(OtherStmt {
                blocks: Vec::new(),
                exprs: vec![Expr {
                    kind: other,
                    span: e.span,
                }],
                span,
            })),
        }
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.expect(TokenKind::KwIf, "`if`")?;
        self.skip_header()?;
        let body = self.parse_block()?;
        if self.at(TokenKind::Semicolon) && self.kind_at(1) == TokenKind::KwElse {
            self.bump();
        }
        let (else_branch, end) = if self.eat(TokenKind::KwElse) {
            if self.at(TokenKind::KwIf) {
                let s = self.parse_if_stmt()?;
                let end = s.span().end;
                (Some(Box::new(s)), end)
            } else {
                let b = self.parse_block()?;
                let end = b.span.end;
                (Some(Box::new(Stmt::Block(b))), end)
            }
        } else {
            (None, body.span.end)
        };
        Ok(Stmt::If(IfStmt {
            body,
            else_branch,
            span: Span::new(kw.span.start, end),
        }))
    }

    /// Consumes a control-statement header up to, not including, the body's
    /// opening brace. Braces inside parenthesized or bracketed positions
    /// (function literals in conditions) do not terminate the header.
    fn skip_header(&mut self) -> Result<(), ParseError> {
        let mut paren = 0i32;
        let mut bracket = 0i32;
        let mut brace = 0i32;
        loop {
            match self.kind() {
                TokenKind::Eof => {
                    return Err(self.err_here("unexpected end of file in statement header"))
                }
                TokenKind::LParen => {
                    paren += 1;
                    self.bump();
                }
                TokenKind::RParen => {
                    paren -= 1;
                    self.bump();
                }
                TokenKind::LBracket => {
                    bracket += 1;
                    self.bump();
                }
                TokenKind::RBracket => {
                    bracket -= 1;
                    self.bump();
                }
                TokenKind::LBrace => {
                    if paren == 0 && bracket == 0 && brace == 0 {
                        return Ok(());
                    }
                    brace += 1;
                    self.bump();
                }
                TokenKind::RBrace => {
                    if brace == 0 {
                        return Err(self.err_here("unbalanced `}` in statement header"));
                    }
                    brace -= 1;
                    self.bump();
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn parse_switch_stmt(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.bump();
        self.skip_header()?;
        let lb = self.expect(TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        loop {
            self.skip_semis();
            match self.kind() {
                TokenKind::RBrace | TokenKind::Eof => break,
                TokenKind::KwCase => {
                    self.bump();
                    self.skip_case_clause()?;
                    self.expect(TokenKind::Colon, "`:` after case clause")?;
                }
                TokenKind::KwDefault => {
                    self.bump();
                    self.expect(TokenKind::Colon, "`:` after `default`")?;
                }
                _ => stmts.push(self.parse_stmt()?),
            }
        }
        let rb = self.expect(TokenKind::RBrace, "`}` closing switch")?;
        let body = Block {
            stmts,
            lbrace: lb.span.start,
            rbrace: rb.span.start,
            span: Span::new(lb.span.start, rb.span.end),
        };
        Ok(Stmt::Other(OtherStmt {
            blocks: vec![body],
            exprs: Vec::new(),
            span: Span::new(kw.span.start, rb.span.end),
        }))
    }

    fn skip_case_clause(&mut self) -> Result<(), ParseError> {
        loop {
            match self.kind() {
                TokenKind::Colon => return Ok(()),
                TokenKind::Eof => {
                    return Err(self.err_here("unexpected end of file in case clause"))
                }
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => {
                    self.skip_balanced()?;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn parse_simple_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().span.start;
        let mut lhs = vec![self.parse_expr()?];
        while self.eat(TokenKind::Comma) {
            lhs.push(self.parse_expr()?);
        }
        match self.kind() {
            TokenKind::Colon => {
                // label; the labeled statement follows
                self.bump();
                self.parse_stmt()
            }
            TokenKind::Define => {
                self.bump();
                let mut values = vec![self.parse_expr()?];
                while self.eat(TokenKind::Comma) {
                    values.push(self.parse_expr()?);
                }
                let end = values.last().map(|e| e.span.end).unwrap_or(start);
                let span = Span::new(start, end);
                let names: Option<Vec<Ident>> = lhs
                    .iter()
                    .map(|e| match &e.kind {
                        ExprKind::Ident(n) => Some(Ident {
                            name: n.clone(),
                            span: e.span,
                        }),
                        _ => None,
                    })
                    .collect();
                match names {
                    Some(names) => Ok(Stmt::ShortVarDecl(ShortVarDecl {
                        names,
                        values,
                        span,
                    })),
                    None => {
                        let mut exprs = lhs;
                        exprs.extend(values);
                        Ok(Stmt::Other(OtherStmt {
                            blocks: Vec::new(),
                            exprs,
                            span,
                        }))
                    }
                }
            }
            TokenKind::Assign | TokenKind::AssignOp => {
                self.bump();
                let mut exprs = lhs;
                exprs.push(self.parse_expr()?);
                while self.eat(TokenKind::Comma) {
                    exprs.push(self.parse_expr()?);
                }
                let end = exprs.last().map(|e| e.span.end).unwrap_or(start);
                Ok(Stmt::Other(OtherStmt {
                    blocks: Vec::new(),
                    exprs,
                    span: Span::new(start, end),
                }))
            }
            TokenKind::IncDec => {
                let t = self.bump();
                Ok(Stmt::Other(OtherStmt {
                    blocks: Vec::new(),
                    exprs: lhs,
                    span: Span::new(start, t.span.end),
                }))
            }
            TokenKind::Arrow => {
                self.bump();
                let v = self.parse_expr()?;
                let end = v.span.end;
                let mut exprs = lhs;
                exprs.push(v);
                Ok(Stmt::Other(OtherStmt {
                    blocks: Vec::new(),
                    exprs,
                    span: Span::new(start, end),
                }))
            }
            _ => {
                if lhs.len() == 1 {
                    let expr = lhs.remove(0);
                    let span = expr.span;
                    Ok(Stmt::Expr(ExprStmt { expr, span }))
                } else {
                    let end = lhs.last().map(|e| e.span.end).unwrap_or(start);
                    Ok(Stmt::Other(OtherStmt {
                        blocks: Vec::new(),
                        exprs: lhs,
                        span: Span::new(start, end),
                    }))
                }
            }
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.kind() {
                TokenKind::Operator | TokenKind::Star | TokenKind::Amp => {
                    self.bump();
                    let rhs = self.parse_unary()?;
                    lhs = Expr {
                        kind: ExprKind::Other,
                        span: Span::new(lhs.span.start, rhs.span.end),
                    };
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span.start;
        match self.kind() {
            TokenKind::Amp => {
                self.bump();
                let x = self.parse_unary()?;
                let end = x.span.end;
                Ok(Expr {
                    kind: ExprKind::Unary {
                        op: UnaryOp::Addr,
                        x: Box::new(x),
                    },
                    span: Span::new(start, end),
                })
            }
            TokenKind::Star | TokenKind::Operator | TokenKind::Arrow => {
                self.bump();
                let x = self.parse_unary()?;
                let end = x.span.end;
                Ok(Expr {
                    kind: ExprKind::Unary {
                        op: UnaryOp::Other,
                        x: Box::new(x),
                    },
                    span: Span::new(start, end),
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span.start;
        let base = match self.kind() {
            TokenKind::Ident => {
                let t = self.bump();
                Expr {
                    kind: ExprKind::Ident(self.text(t).to_string()),
                    span: t.span,
                }
            }
            TokenKind::Int | TokenKind::Float | TokenKind::Str | TokenKind::Char => {
                let t = self.bump();
                Expr {
                    kind: ExprKind::BasicLit,
                    span: t.span,
                }
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                let rp = self.expect(TokenKind::RParen, "`)`")?;
                Expr {
                    kind: ExprKind::Paren(Box::new(inner)),
                    span: Span::new(start, rp.span.end),
                }
            }
            TokenKind::KwFunc => {
                self.bump();
                let params = self.parse_field_list()?;
                let results = self.parse_results()?;
                let body = self.parse_block()?;
                let end = body.span.end;
                Expr {
                    kind: ExprKind::FuncLit(FuncLit {
                        params,
                        results,
                        body,
                    }),
                    span: Span::new(start, end),
                }
            }
            TokenKind::LBracket
            | TokenKind::KwMap
            | TokenKind::KwChan
            | TokenKind::KwStruct
            | TokenKind::KwInterface => {
                let ty = self.parse_type()?;
                Expr {
                    kind: ExprKind::Other,
                    span: ty.span,
                }
            }
            _ => return Err(self.err_here("expected expression")),
        };
        self.parse_postfix(base)
    }

    fn parse_postfix(&mut self, mut x: Expr) -> Result<Expr, ParseError> {
        loop {
            match self.kind() {
                TokenKind::Dot => {
                    self.bump();
                    if self.at(TokenKind::LParen) {
                        // type assertion
                        let close = self.skip_balanced()?;
                        let span = Span::new(x.span.start, close.span.end);
                        x = Expr {
                            kind: ExprKind::Other,
                            span,
                        };
                    } else {
                        let sel = self.expect(TokenKind::Ident, "selector name")?;
                        let sel_ident = Ident {
                            name: self.text(sel).to_string(),
                            span: sel.span,
                        };
                        let span = Span::new(x.span.start, sel.span.end);
                        x = Expr {
                            kind: ExprKind::Selector {
                                x: Box::new(x),
                                sel: sel_ident,
                            },
                            span,
                        };
                    }
                }
                TokenKind::LParen => {
                    self.bump();
                    let mut args = Vec::new();
                    loop {
                        self.skip_semis();
                        if self.at(TokenKind::RParen) {
                            break;
                        }
                        args.push(self.parse_expr()?);
                        self.eat(TokenKind::Ellipsis);
                        self.skip_semis();
                        if !self.eat(TokenKind::Comma) && !self.at(TokenKind::RParen) {
                            return Err(self.err_here("expected `,` or `)` in argument list"));
                        }
                    }
                    let rp = self.expect(TokenKind::RParen, "`)` closing argument list")?;
                    let span = Span::new(x.span.start, rp.span.end);
                    x = Expr {
                        kind: ExprKind::Call(CallExpr {
                            fun: Box::new(x),
                            args,
                            span,
                        }),
                        span,
                    };
                }
                TokenKind::LBracket => {
                    let close = self.skip_balanced()?;
                    let span = Span::new(x.span.start, close.span.end);
                    x = Expr {
                        kind: ExprKind::Index { x: Box::new(x) },
                        span,
                    };
                }
                TokenKind::LBrace => {
                    let type_like = matches!(
                        &x.kind,
                        ExprKind::Ident(_)
                            | ExprKind::Selector { .. }
                            | ExprKind::Index { .. }
                            | ExprKind::Other
                    );
                    if !type_like {
                        break;
                    }
                    let close = self.skip_balanced()?;
                    let span = Span::new(x.span.start, close.span.end);
                    x = Expr {
                        kind: ExprKind::CompositeLit {
                            ty: Some(Box::new(x)),
                        },
                        span,
                    };
                }
                _ => break,
            }
        }
        Ok(x)
    }
}

fn unquote_string(raw: &str) -> Option<String> {
    if let Some(body) = raw.strip_prefix('`').and_then(|r| r.strip_suffix('`')) {
        return Some(body.to_string());
    }
    let body = raw.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '0' => out.push('\0'),
            _ => return None,
        }
    }
    Some(out)
}
