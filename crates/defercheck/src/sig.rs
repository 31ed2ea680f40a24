//! Unit-local call resolution.
//!
//! Resolution never consults anything outside the analyzed file. A name
//! binds to a signature only when the file itself proves the connection:
//! top-level functions by name, methods through receivers whose concrete
//! type is visible at the binding site, and function literals structurally.
//! Everything else resolves to nothing and the caller skips the call, so
//! partial knowledge can never produce a false report.

use std::collections::{BTreeMap, BTreeSet};

use crate::ast::{
    Block, CallExpr, Decl, Expr, ExprKind, FieldList, File, Stmt, TypeExpr, TypeExprKind, UnaryOp,
};
use crate::span::Span;

/// The predeclared failure interface is matched by name. Composite shapes
/// (pointers, slices, qualified names) never count.
pub fn type_satisfies_error(ty: &TypeExpr) -> bool {
    matches!(&ty.kind, TypeExprKind::Name(n) if n == "error")
}

/// Flattened view of a function signature. One flag per result, in
/// declaration order, true when that result is error-typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub param_count: usize,
    pub results: Vec<bool>,
}

impl Signature {
    pub fn returns_error(&self) -> bool {
        self.results.iter().any(|is_err| *is_err)
    }
}

pub fn signature_of(params: &FieldList, results: Option<&FieldList>) -> Signature {
    Signature {
        param_count: field_count(params),
        results: results.map(expand_error_flags).unwrap_or_default(),
    }
}

fn field_count(list: &FieldList) -> usize {
    list.fields.iter().map(|f| f.names.len().max(1)).sum()
}

fn expand_error_flags(list: &FieldList) -> Vec<bool> {
    let mut flags = Vec::new();
    for field in &list.fields {
        let is_err = type_satisfies_error(&field.ty);
        for _ in 0..field.names.len().max(1) {
            flags.push(is_err);
        }
    }
    flags
}

/// Per-file resolver. Local variable types are tracked per enclosing
/// function, flattening nested blocks and function-literal scopes into one
/// map; a name bound twice to different types, or once to anything the
/// resolver cannot type, is poisoned and never resolves again.
pub struct Resolver {
    funcs: BTreeMap<String, Signature>,
    methods: BTreeMap<(String, String), Signature>,
    import_names: BTreeSet<String>,
    scopes: BTreeMap<Span, BTreeMap<String, Option<String>>>,
}

impl Resolver {
    pub fn build(file: &File) -> Resolver {
        let mut type_names = BTreeSet::new();
        for decl in &file.decls {
            if let Decl::Type(td) = decl {
                for spec in &td.specs {
                    type_names.insert(spec.name.clone());
                }
            }
        }

        let mut import_names = BTreeSet::new();
        for decl in &file.imports {
            for spec in &decl.specs {
                let name = match &spec.alias {
                    Some(a) if a == "." || a == "_" => continue,
                    Some(a) => a.clone(),
                    None => spec
                        .path
                        .rsplit('/')
                        .next()
                        .unwrap_or(spec.path.as_str())
                        .to_string(),
                };
                import_names.insert(name);
            }
        }

        let mut funcs = BTreeMap::new();
        let mut methods = BTreeMap::new();
        let mut scopes = BTreeMap::new();
        for decl in &file.decls {
            let Decl::Func(f) = decl else { continue };
            let sig = signature_of(&f.params, f.results.as_ref());
            match &f.receiver {
                Some(recv) => {
                    if let Some(type_name) = &recv.type_name {
                        methods.insert((type_name.clone(), f.name.clone()), sig);
                    }
                }
                None => {
                    funcs.insert(f.name.clone(), sig);
                }
            }
            if let Some(body) = &f.body {
                let mut locals = BTreeMap::new();
                if let Some(recv) = &f.receiver {
                    if let (Some(name), Some(type_name)) = (&recv.name, &recv.type_name) {
                        bind(&mut locals, name, Some(type_name.clone()));
                    }
                }
                bind_field_list(&mut locals, &f.params, &type_names);
                collect_block(body, &mut locals, &type_names);
                scopes.insert(body.span, locals);
            }
        }

        Resolver {
            funcs,
            methods,
            import_names,
            scopes,
        }
    }

    /// Resolves the callee of `call` as seen from the top-level function
    /// whose body span is `scope`. None means unknown, and unknown means
    /// the caller must not report.
    pub fn resolve_call(&self, scope: Span, call: &CallExpr) -> Option<Signature> {
        self.resolve_callee(scope, &call.fun)
    }

    fn resolve_callee(&self, scope: Span, fun: &Expr) -> Option<Signature> {
        match &fun.kind {
            ExprKind::Ident(name) => {
                // a local binding shadows any top-level function
                if let Some(locals) = self.scopes.get(&scope) {
                    if locals.contains_key(name) {
                        return None;
                    }
                }
                self.funcs.get(name).cloned()
            }
            ExprKind::Paren(inner) => self.resolve_callee(scope, inner),
            ExprKind::FuncLit(lit) => Some(signature_of(&lit.params, lit.results.as_ref())),
            ExprKind::Selector { x, sel } => {
                let base = x.as_ident()?;
                if self.import_names.contains(base) {
                    return None;
                }
                let locals = self.scopes.get(&scope)?;
                let type_name = locals.get(base)?.as_ref()?;
                self.methods
                    .get(&(type_name.clone(), sel.name.clone()))
                    .cloned()
            }
            _ => None,
        }
    }
}

fn bind(locals: &mut BTreeMap<String, Option<String>>, name: &str, ty: Option<String>) {
    if name == "_" {
        return;
    }
    match locals.get(name) {
        None => {
            locals.insert(name.to_string(), ty);
        }
        Some(existing) => {
            if *existing != ty {
                locals.insert(name.to_string(), None);
            }
        }
    }
}

fn bind_field_list(
    locals: &mut BTreeMap<String, Option<String>>,
    list: &FieldList,
    types: &BTreeSet<String>,
) {
    for field in &list.fields {
        let ty = local_type_name(&field.ty, types);
        for name in &field.names {
            bind(locals, &name.name, ty.clone());
        }
    }
}

fn local_type_name(ty: &TypeExpr, types: &BTreeSet<String>) -> Option<String> {
    match &ty.kind {
        TypeExprKind::Name(n) if types.contains(n.as_str()) => Some(n.clone()),
        TypeExprKind::Pointer(inner) => match &inner.kind {
            TypeExprKind::Name(n) if types.contains(n.as_str()) => Some(n.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn composite_type_name(expr: &Expr, types: &BTreeSet<String>) -> Option<String> {
    let target = match &expr.kind {
        ExprKind::Unary {
            op: UnaryOp::Addr,
            x,
        } => x.as_ref(),
        _ => expr,
    };
    let ExprKind::CompositeLit { ty: Some(ty) } = &target.kind else {
        return None;
    };
    let name = ty.as_ident()?;
    if types.contains(name) {
        Some(name.to_string())
    } else {
        None
    }
}

fn collect_block(
    block: &Block,
    locals: &mut BTreeMap<String, Option<String>>,
    types: &BTreeSet<String>,
) {
    for stmt in &block.stmts {
        collect_stmt(stmt, locals, types);
    }
}

fn collect_stmt(
    stmt: &Stmt,
    locals: &mut BTreeMap<String, Option<String>>,
    types: &BTreeSet<String>,
) {
    match stmt {
        Stmt::ShortVarDecl(sv) => {
            if sv.names.len() == sv.values.len() {
                for (name, value) in sv.names.iter().zip(&sv.values) {
                    bind(locals, &name.name, composite_type_name(value, types));
                    collect_expr(value, locals, types);
                }
            } else {
                // multi-value unpacking is opaque to the resolver
                for name in &sv.names {
                    bind(locals, &name.name, None);
                }
                for value in &sv.values {
                    collect_expr(value, locals, types);
                }
            }
        }
        Stmt::Defer(d) => {
            collect_expr(&d.call.fun, locals, types);
            for arg in &d.call.args {
                collect_expr(arg, locals, types);
            }
        }
        Stmt::Expr(es) => collect_expr(&es.expr, locals, types),
        Stmt::Return(ret) => {
            for e in &ret.exprs {
                collect_expr(e, locals, types);
            }
        }
        Stmt::Block(b) => collect_block(b, locals, types),
        Stmt::If(ifs) => {
            collect_block(&ifs.body, locals, types);
            if let Some(else_branch) = &ifs.else_branch {
                collect_stmt(else_branch, locals, types);
            }
        }
        Stmt::For(fs) => collect_block(&fs.body, locals, types),
        Stmt::Other(other) => {
            for b in &other.blocks {
                collect_block(b, locals, types);
            }
            for e in &other.exprs {
                collect_expr(e, locals, types);
            }
        }
    }
}

fn collect_expr(
    expr: &Expr,
    locals: &mut BTreeMap<String, Option<String>>,
    types: &BTreeSet<String>,
) {
    match &expr.kind {
        ExprKind::Call(call) => {
            collect_expr(&call.fun, locals, types);
            for arg in &call.args {
                collect_expr(arg, locals, types);
            }
        }
        ExprKind::Selector { x, .. } => collect_expr(x, locals, types),
        ExprKind::Unary { x, .. } => collect_expr(x, locals, types),
        ExprKind::Paren(inner) => collect_expr(inner, locals, types),
        ExprKind::Index { x } => collect_expr(x, locals, types),
        ExprKind::CompositeLit { ty } => {
            if let Some(ty) = ty {
                collect_expr(ty, locals, types);
            }
        }
        ExprKind::FuncLit(lit) => {
            bind_field_list(locals, &lit.params, types);
            collect_block(&lit.body, locals, types);
        }
        ExprKind::Ident(_) | ExprKind::BasicLit | ExprKind::Other => {}
    }
}
