//! Suggested-fix synthesis.
//!
//! Every edit addresses the original, unpatched source; the applier works
//! one-shot. A component that cannot be rendered is dropped rather than
//! emitted half-formed: no defer rewrite means no fix at all, a missing
//! result list drops only the setup edits.

use crate::ast::{DeferStmt, FieldList, File, FuncDecl};
use crate::context::FuncInfo;
use crate::diagnostics::{SuggestedFix, TextEdit};
use crate::harness::HarnessSpec;
use crate::sig::{type_satisfies_error, Signature};
use crate::source::SourceFile;

pub struct SynthesizedFix {
    pub fix: SuggestedFix,
    /// True when this fix carries the file's import edit. The scanner uses
    /// it to suppress import edits on later findings in the same pass.
    pub added_import: bool,
}

#[allow(clippy::too_many_arguments)]
pub fn synthesize(
    src: &SourceFile,
    file: &File,
    harness: &HarnessSpec,
    func: &FuncDecl,
    info: &FuncInfo,
    defer_stmt: &DeferStmt,
    sig: &Signature,
    import_already_added: bool,
) -> Option<SynthesizedFix> {
    let defer_edit = build_defer_edit(src, defer_stmt, sig, harness)?;
    let mut edits = vec![defer_edit];

    if !info.is_already_patched {
        let err_name = info
            .named_error_var
            .clone()
            .unwrap_or_else(|| harness.default_err_name.clone());
        edits.extend(build_setup_edits(src, func, &err_name, harness));
    }

    let mut added_import = false;
    if !import_already_added && !file_has_harness_import(file, harness) {
        if let Some(edit) = build_import_edit(file, harness) {
            edits.push(edit);
            added_import = true;
        }
    }

    Some(SynthesizedFix {
        fix: SuggestedFix {
            message: harness.fix_label(),
            edits,
        },
        added_import,
    })
}

/// Replaces the whole scoped-exit statement. Callees already of the guard
/// shape (no parameters, single error result) are referenced directly;
/// everything else is adapted through a zero-parameter closure.
///
/// Known gap: the closure form re-evaluates the whole call expression at
/// scope exit, receiver included. A receiver with side effects (a map
/// index, a call) runs again inside the closure; single evaluation is not
/// guaranteed.
fn build_defer_edit(
    src: &SourceFile,
    defer_stmt: &DeferStmt,
    sig: &Signature,
    harness: &HarnessSpec,
) -> Option<TextEdit> {
    let new_text = if sig.param_count == 0 && sig.results == [true] {
        let fun_text = src.slice(defer_stmt.call.fun.span)?;
        format!(
            "defer {}.{}({})",
            harness.binding, harness.guard_method, fun_text
        )
    } else {
        let call_text = src.slice(defer_stmt.call.span)?;
        format!(
            "defer {}.{}(func() error {{\n\treturn {}\n}})",
            harness.binding, harness.guard_method, call_text
        )
    };
    Some(TextEdit {
        pos: defer_stmt.span.start,
        end: defer_stmt.span.end,
        new_text,
    })
}

fn build_setup_edits(
    src: &SourceFile,
    func: &FuncDecl,
    err_name: &str,
    harness: &HarnessSpec,
) -> Vec<TextEdit> {
    let mut edits = Vec::new();
    let (Some(results), Some(body)) = (&func.results, &func.body) else {
        return edits;
    };

    if let Some(new_results) = rewritten_results(src, results, err_name) {
        edits.push(TextEdit {
            pos: results.span.start,
            end: results.span.end,
            new_text: new_results,
        });
    }

    let prologue = format!(
        "\n\t{b} := {p}.{c}()\n\tdefer {b}.{m}(&{e})\n\n",
        b = harness.binding,
        p = harness.package_name,
        c = harness.constructor,
        m = harness.collect_method,
        e = err_name,
    );
    edits.push(TextEdit {
        pos: body.lbrace + 1,
        end: body.lbrace + 1,
        new_text: prologue,
    });
    edits
}

/// Rewrites the result clause as a parenthesized, fully named list. The
/// first error-typed entry gets `err_name` if it had no name; every other
/// entry keeps its name or gets `_`.
fn rewritten_results(src: &SourceFile, results: &FieldList, err_name: &str) -> Option<String> {
    let mut parts = Vec::new();
    let mut err_seen = false;
    for field in &results.fields {
        let ty_text = src.slice(field.ty.span)?;
        let is_err = type_satisfies_error(&field.ty);
        let first_err = is_err && !err_seen;
        if is_err {
            err_seen = true;
        }
        if field.names.is_empty() {
            let name = if first_err { err_name } else { "_" };
            parts.push(format!("{name} {ty_text}"));
        } else {
            for name in &field.names {
                parts.push(format!("{} {}", name.name, ty_text));
            }
        }
    }
    Some(format!("({})", parts.join(", ")))
}

pub fn file_has_harness_import(file: &File, harness: &HarnessSpec) -> bool {
    file.imports
        .iter()
        .flat_map(|decl| &decl.specs)
        .any(|spec| spec.path == harness.import_path)
}

/// Insertion point and text depend on the file's import shape; all three
/// forms re-parse in place.
fn build_import_edit(file: &File, harness: &HarnessSpec) -> Option<TextEdit> {
    let quoted = format!("{:?}", harness.import_path);

    if let Some(grouped) = file.imports.iter().filter(|d| d.grouped).last() {
        let pos = match grouped.specs.last() {
            Some(spec) => spec.span.end,
            None => grouped.rparen?,
        };
        return Some(TextEdit {
            pos,
            end: pos,
            new_text: format!("\n\t{quoted}"),
        });
    }

    if let Some(last) = file.imports.last() {
        let pos = last.span.end;
        return Some(TextEdit {
            pos,
            end: pos,
            new_text: format!("\nimport {quoted}"),
        });
    }

    let pos = file.package.span.end;
    Some(TextEdit {
        pos,
        end: pos,
        new_text: format!("\n\nimport {quoted}"),
    })
}
