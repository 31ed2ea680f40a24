//! Scanner: finds scoped-exit statements whose call drops an error and
//! emits diagnostics, fixable ones carrying the synthesized edit set.

use std::collections::BTreeMap;

use crate::ast::{Block, Decl, DeferStmt, Expr, ExprKind, File, FuncDecl, Stmt};
use crate::context::{analyze_func, FuncInfo};
use crate::diagnostics::{Diagnostic, Report, Severity};
use crate::fix;
use crate::harness::HarnessSpec;
use crate::matchers::call_returns_failure;
use crate::parser::{parse_file, ParseError};
use crate::sig::Resolver;
use crate::source::SourceFile;
use crate::span::Span;

pub const MISSED_ERROR_CODE: &str = "DC-DEFER-0001";
pub const CANNOT_AUTOFIX_CODE: &str = "DC-DEFER-0002";
pub const PARSE_ERROR_CODE: &str = "DC-PARSE-0001";

#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub harness: HarnessSpec,
}

/// Parses and analyzes one unit. A file that does not parse yields a
/// single parse diagnostic and no partial analysis.
pub fn check_source(src: &SourceFile, opts: &AnalyzeOptions) -> Report {
    match parse_file(src) {
        Ok(file) => analyze_unit(src, &file, opts),
        Err(err) => Report::ok().with_diagnostics(vec![parse_diagnostic(src, &err)]),
    }
}

pub fn parse_diagnostic(src: &SourceFile, err: &ParseError) -> Diagnostic {
    Diagnostic {
        code: PARSE_ERROR_CODE.to_string(),
        severity: Severity::Error,
        message: err.message.clone(),
        file: src.path().to_string(),
        pos: src.position(err.offset),
        fix: None,
    }
}

pub fn analyze_unit(src: &SourceFile, file: &File, opts: &AnalyzeOptions) -> Report {
    let resolver = Resolver::build(file);
    let mut cache: BTreeMap<Span, FuncInfo> = BTreeMap::new();
    let mut diagnostics = Vec::new();
    let mut import_added = false;

    for (func, defer_stmt) in deferred_calls(file) {
        let Some(body) = &func.body else { continue };
        let Some(sig) = resolver.resolve_call(body.span, &defer_stmt.call) else {
            continue;
        };
        if !call_returns_failure(&sig) {
            continue;
        }

        let info = cache
            .entry(func.span)
            .or_insert_with(|| analyze_func(func, &opts.harness))
            .clone();
        let call_text = src.slice(defer_stmt.call.span).unwrap_or_default();

        if !info.returns_error {
            diagnostics.push(Diagnostic {
                code: CANNOT_AUTOFIX_CODE.to_string(),
                severity: Severity::Warning,
                message: format!(
                    "missed error in defer statement, but cannot autofix because enclosing function {} does not return an error: {}",
                    func.name, call_text
                ),
                file: src.path().to_string(),
                pos: src.position(defer_stmt.span.start),
                fix: None,
            });
            continue;
        }

        let synthesized = fix::synthesize(
            src,
            file,
            &opts.harness,
            func,
            &info,
            defer_stmt,
            &sig,
            import_added,
        );
        let fix_payload = synthesized.map(|s| {
            if s.added_import {
                import_added = true;
            }
            s.fix
        });
        diagnostics.push(Diagnostic {
            code: MISSED_ERROR_CODE.to_string(),
            severity: Severity::Warning,
            message: format!("missed error in defer statement: {call_text}"),
            file: src.path().to_string(),
            pos: src.position(defer_stmt.span.start),
            fix: fix_payload,
        });
    }

    Report::ok().with_diagnostics(diagnostics)
}

/// Every scoped-exit statement in the unit, preorder, paired with its
/// enclosing top-level function declaration. Function literals are not
/// declarations: a defer inside one belongs to the surrounding top-level
/// function.
fn deferred_calls(file: &File) -> Vec<(&FuncDecl, &DeferStmt)> {
    let mut out = Vec::new();
    for decl in &file.decls {
        let Decl::Func(func) = decl else { continue };
        let Some(body) = &func.body else { continue };
        let mut defers = Vec::new();
        collect_defers_block(body, &mut defers);
        for d in defers {
            out.push((func, d));
        }
    }
    out
}

fn collect_defers_block<'a>(block: &'a Block, out: &mut Vec<&'a DeferStmt>) {
    for stmt in &block.stmts {
        collect_defers_stmt(stmt, out);
    }
}

fn collect_defers_stmt<'a>(stmt: &'a Stmt, out: &mut Vec<&'a DeferStmt>) {
    match stmt {
        Stmt::Defer(d) => {
            out.push(d);
            collect_defers_expr(&d.call.fun, out);
            for arg in &d.call.args {
                collect_defers_expr(arg, out);
            }
        }
        Stmt::ShortVarDecl(sv) => {
            for v in &sv.values {
                collect_defers_expr(v, out);
            }
        }
        Stmt::Expr(es) => collect_defers_expr(&es.expr, out),
        Stmt::Return(ret) => {
            for e in &ret.exprs {
                collect_defers_expr(e, out);
            }
        }
        Stmt::Block(b) => collect_defers_block(b, out),
        Stmt::If(ifs) => {
            collect_defers_block(&ifs.body, out);
            if let Some(else_branch) = &ifs.else_branch {
                collect_defers_stmt(else_branch, out);
            }
        }
        Stmt::For(fs) => collect_defers_block(&fs.body, out),
        Stmt::Other(other) => {
            for b in &other.blocks {
                collect_defers_block(b, out);
            }
            for e in &other.exprs {
                collect_defers_expr(e, out);
            }
        }
    }
}

fn collect_defers_expr<'a>(expr: &'a Expr, out: &mut Vec<&'a DeferStmt>) {
    match &expr.kind {
        ExprKind::Call(call) => {
            collect_defers_expr(&call.fun, out);
            for arg in &call.args {
                collect_defers_expr(arg, out);
            }
        }
        ExprKind::Selector { x, .. } => collect_defers_expr(x, out),
        ExprKind::Unary { x, .. } => collect_defers_expr(x, out),
        ExprKind::Paren(inner) => collect_defers_expr(inner, out),
        ExprKind::Index { x } => collect_defers_expr(x, out),
        ExprKind::CompositeLit { ty } => {
            if let Some(ty) = ty {
                collect_defers_expr(ty, out);
            }
        }
        ExprKind::FuncLit(lit) => collect_defers_block(&lit.body, out),
        ExprKind::Ident(_) | ExprKind::BasicLit | ExprKind::Other => {}
    }
}
