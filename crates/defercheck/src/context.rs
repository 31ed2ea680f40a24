//! Per-function fact sheet, computed once and cached by the scanner.

use crate::ast::FuncDecl;
use crate::harness::HarnessSpec;
use crate::matchers::is_harness_prologue;
use crate::sig::type_satisfies_error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncInfo {
    pub returns_error: bool,
    pub named_error_var: Option<String>,
    pub is_already_patched: bool,
}

/// Derives the facts the scanner needs about an enclosing function.
///
/// The first error-typed result wins; later ones are ignored. The prologue
/// check only runs when that result is named and the body has at least two
/// statements, otherwise the function counts as unpatched.
pub fn analyze_func(decl: &FuncDecl, harness: &HarnessSpec) -> FuncInfo {
    let mut returns_error = false;
    let mut named_error_var = None;
    if let Some(results) = &decl.results {
        for field in &results.fields {
            if !type_satisfies_error(&field.ty) {
                continue;
            }
            returns_error = true;
            if let Some(first) = field.names.first() {
                named_error_var = Some(first.name.clone());
            }
            break;
        }
    }

    let is_already_patched = match (&named_error_var, &decl.body) {
        (Some(name), Some(body)) if body.stmts.len() >= 2 => {
            is_harness_prologue(body, name, harness)
        }
        _ => false,
    };

    FuncInfo {
        returns_error,
        named_error_var,
        is_already_patched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Decl;
    use crate::parser::parse_file;
    use crate::source::SourceFile;

    fn analyze(text: &str) -> FuncInfo {
        let src = SourceFile::new("t.go", text.to_string());
        let file = parse_file(&src).unwrap();
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected a function declaration");
        };
        analyze_func(f, &HarnessSpec::default())
    }

    #[test]
    fn named_error_result() {
        let info = analyze("package p\n\nfunc f() (n int, err error) {\n\treturn\n}\n");
        assert!(info.returns_error);
        assert_eq!(info.named_error_var.as_deref(), Some("err"));
        assert!(!info.is_already_patched);
    }

    #[test]
    fn unnamed_error_result() {
        let info = analyze("package p\n\nfunc f() error {\n\treturn nil\n}\n");
        assert!(info.returns_error);
        assert_eq!(info.named_error_var, None);
    }

    #[test]
    fn no_error_result() {
        let info = analyze("package p\n\nfunc f() int {\n\treturn 0\n}\n");
        assert!(!info.returns_error);
        assert_eq!(info.named_error_var, None);
        assert!(!info.is_already_patched);
    }

    #[test]
    fn first_error_result_wins() {
        let info = analyze("package p\n\nfunc f() (e error, error) {\n\treturn nil, nil\n}\n");
        assert!(info.returns_error);
        assert_eq!(info.named_error_var.as_deref(), Some("e"));
    }

    #[test]
    fn detects_installed_prologue() {
        let info = analyze(
            "package p\n\nfunc f() (err error) {\n\tg := collector.New()\n\tdefer g.Collect(&err)\n\treturn\n}\n",
        );
        assert!(info.is_already_patched);
    }

    #[test]
    fn short_body_is_unpatched() {
        let info = analyze("package p\n\nfunc f() (err error) {\n\treturn\n}\n");
        assert!(!info.is_already_patched);
    }
}
