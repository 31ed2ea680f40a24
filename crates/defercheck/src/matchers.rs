//! Tree-shape predicates over the parsed unit.
//!
//! Matchers compare shape and identifier text, nothing else. Any length,
//! shape, or name mismatch means "no match"; they never raise and never
//! accept a partial prologue.

use crate::ast::{Block, ExprKind, Stmt, UnaryOp};
use crate::harness::HarnessSpec;
use crate::sig::Signature;

/// True iff the resolved callee can leave a failure value behind.
pub fn call_returns_failure(sig: &Signature) -> bool {
    sig.returns_error()
}

/// True iff the first two statements of `body` are exactly the installed
/// collection prologue for `named_err`:
///
/// ```text
///     g := collector.New()
///     defer g.Collect(&NAME)
/// ```
///
/// Constructor arguments are not part of the match. All compared names
/// come from `harness`.
pub fn is_harness_prologue(body: &Block, named_err: &str, harness: &HarnessSpec) -> bool {
    if body.stmts.len() < 2 {
        return false;
    }

    let Stmt::ShortVarDecl(decl) = &body.stmts[0] else {
        return false;
    };
    if decl.names.len() != 1 || decl.values.len() != 1 {
        return false;
    }
    if decl.names[0].name != harness.binding {
        return false;
    }
    let ExprKind::Call(ctor) = &decl.values[0].kind else {
        return false;
    };
    let ExprKind::Selector { x, sel } = &ctor.fun.kind else {
        return false;
    };
    if x.as_ident() != Some(harness.package_name.as_str()) {
        return false;
    }
    if sel.name != harness.constructor {
        return false;
    }

    let Stmt::Defer(d) = &body.stmts[1] else {
        return false;
    };
    let ExprKind::Selector { x, sel } = &d.call.fun.kind else {
        return false;
    };
    if x.as_ident() != Some(harness.binding.as_str()) {
        return false;
    }
    if sel.name != harness.collect_method {
        return false;
    }
    if d.call.args.len() != 1 {
        return false;
    }
    let ExprKind::Unary {
        op: UnaryOp::Addr,
        x,
    } = &d.call.args[0].kind
    else {
        return false;
    };
    x.as_ident() == Some(named_err)
}
