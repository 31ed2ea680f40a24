//! Syntax tree for the analyzed language subset.
//!
//! Every node carries a byte-offset [`Span`] into the original source; the
//! engine reads structure and positions and never mutates the tree. Shapes
//! the analyses do not inspect are preserved as opaque spanned nodes so that
//! traversal still reaches any scoped-exit statement nested inside them.

use crate::span::Span;

#[derive(Debug, Clone)]
pub struct File {
    pub package: PackageClause,
    pub imports: Vec<ImportDecl>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// `package NAME`; the span covers the whole clause and is the anchor for
/// import insertion into files without imports.
#[derive(Debug, Clone)]
pub struct PackageClause {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub grouped: bool,
    pub specs: Vec<ImportSpec>,
    /// Offset of the closing parenthesis of a grouped declaration.
    pub rparen: Option<u32>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportSpec {
    pub alias: Option<String>,
    /// Unquoted import path.
    pub path: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Func(FuncDecl),
    Type(TypeDecl),
    Other(Span),
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub specs: Vec<TypeSpec>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub receiver: Option<Receiver>,
    pub name: String,
    pub name_span: Span,
    pub params: FieldList,
    pub results: Option<FieldList>,
    pub body: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Receiver {
    pub name: Option<String>,
    /// Base type name with any pointer marker stripped; `None` when the
    /// receiver shape was not recognized.
    pub type_name: Option<String>,
    pub pointer: bool,
    pub span: Span,
}

/// Parameter or result list. For a bare single result type
/// (`func f() error`) the list is unparenthesized and its span is exactly
/// the type's span, which is what the signature rewrite replaces.
#[derive(Debug, Clone)]
pub struct FieldList {
    pub fields: Vec<Field>,
    pub parenthesized: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    Name(String),
    Qualified(String, String),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Chan(Box<TypeExpr>),
    Other,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Offset of `{`; the harness prologue is inserted at `lbrace + 1`.
    pub lbrace: u32,
    pub rbrace: u32,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Defer(DeferStmt),
    ShortVarDecl(ShortVarDecl),
    Expr(ExprStmt),
    Return(ReturnStmt),
    Block(Block),
    If(IfStmt),
    For(ForStmt),
    Other(OtherStmt),
}

#[derive(Debug, Clone)]
pub struct DeferStmt {
    pub call: CallExpr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ShortVarDecl {
    pub names: Vec<Ident>,
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub exprs: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub body: Block,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub body: Block,
    pub span: Span,
}

/// Statement shape the analyses never match on. Child blocks and
/// expressions are kept so traversal still descends into them.
#[derive(Debug, Clone)]
pub struct OtherStmt {
    pub blocks: Vec<Block>,
    pub exprs: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub fun: Box<Expr>,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Ident(String),
    Selector { x: Box<Expr>, sel: Ident },
    Call(CallExpr),
    Unary { op: UnaryOp, x: Box<Expr> },
    CompositeLit { ty: Option<Box<Expr>> },
    FuncLit(FuncLit),
    BasicLit,
    Paren(Box<Expr>),
    Index { x: Box<Expr> },
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Address-of, the only operator the matchers recognize structurally.
    Addr,
    Other,
}

#[derive(Debug, Clone)]
pub struct FuncLit {
    pub params: FieldList,
    pub results: Option<FieldList>,
    pub body: Block,
}

impl Expr {
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Defer(s) => s.span,
            Stmt::ShortVarDecl(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Block(b) => b.span,
            Stmt::If(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Other(s) => s.span,
        }
    }
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Func(f) => f.span,
            Decl::Type(t) => t.span,
            Decl::Other(span) => *span,
        }
    }
}
