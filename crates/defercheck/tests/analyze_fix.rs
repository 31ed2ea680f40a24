use defercheck::diagnostics::{Report, Severity};
use defercheck::edit::{apply_edits, collect_fix_edits};
use defercheck::harness::HarnessSpec;
use defercheck::parser::parse_file;
use defercheck::scan::{
    check_source, AnalyzeOptions, CANNOT_AUTOFIX_CODE, MISSED_ERROR_CODE, PARSE_ERROR_CODE,
};
use defercheck::source::SourceFile;

fn analyze(text: &str) -> Report {
    let src = SourceFile::new("fixture.go", text.to_string());
    check_source(&src, &AnalyzeOptions::default())
}

fn apply_fixes(text: &str, report: &Report) -> String {
    let edits = collect_fix_edits(report);
    let patched = apply_edits(text, &edits).expect("apply fix edits");
    let src = SourceFile::new("fixture.go", patched.clone());
    parse_file(&src).expect("patched source must re-parse");
    patched
}

#[test]
fn direct_guard_for_thunk_shaped_callee() {
    let text = "package main\n\nfunc failingClose() error {\n\treturn nil\n}\n\nfunc run() (int, error) {\n\tdefer failingClose()\n\treturn 0, nil\n}\n";
    let report = analyze(text);
    assert_eq!(report.diagnostics.len(), 1, "{:?}", report.diagnostics);

    let d = &report.diagnostics[0];
    assert_eq!(d.code, MISSED_ERROR_CODE);
    assert_eq!(d.message, "missed error in defer statement: failingClose()");
    assert!(d.fix.is_some(), "expected a suggested fix");

    let patched = apply_fixes(text, &report);
    assert!(patched.contains("import \"github.com/defercheck/collector\""));
    assert!(patched.contains("func run() (_ int, err error) {"));
    assert!(patched.contains("g := collector.New()"));
    assert!(patched.contains("defer g.Collect(&err)"));
    assert!(patched.contains("defer g.Guard(failingClose)"));
    assert!(!patched.contains("defer failingClose()"));

    let after = analyze(&patched);
    assert!(
        after.diagnostics.is_empty(),
        "patched source must be clean: {:?}",
        after.diagnostics
    );
}

#[test]
fn closure_guard_for_parameterized_callee() {
    let text = "package main\n\nfunc report(msg string) error {\n\treturn nil\n}\n\nfunc run() (int, error) {\n\tdefer report(\"done\")\n\treturn 0, nil\n}\n";
    let report = analyze(text);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(
        report.diagnostics[0].message,
        "missed error in defer statement: report(\"done\")"
    );

    let patched = apply_fixes(text, &report);
    assert!(
        patched.contains("defer g.Guard(func() error {\n\treturn report(\"done\")\n})"),
        "expected closure form, got:\n{patched}"
    );
    assert!(!patched.contains("defer g.Guard(report)"));

    let after = analyze(&patched);
    assert!(after.diagnostics.is_empty(), "{:?}", after.diagnostics);
}

#[test]
fn sentinel_name_collision_stays_fixable() {
    let text = "package main\n\nfunc g(s string) error {\n\treturn nil\n}\n\nfunc run() (int, error) {\n\tdefer g(\"hello\")\n\treturn 0, nil\n}\n";
    let report = analyze(text);
    assert_eq!(report.diagnostics.len(), 1);

    let patched = apply_fixes(text, &report);
    assert!(patched.contains("defer g.Guard(func() error {\n\treturn g(\"hello\")\n})"));

    let after = analyze(&patched);
    assert!(after.diagnostics.is_empty(), "{:?}", after.diagnostics);
}

#[test]
fn mixed_shapes_share_one_setup() {
    let text = "package main\n\nfunc f() error {\n\treturn nil\n}\n\nfunc h(s string) error {\n\treturn nil\n}\n\ntype S struct{}\n\nfunc (S) f() error {\n\treturn nil\n}\n\nfunc (S) g(s string) error {\n\treturn nil\n}\n\nfunc run() (int, error) {\n\tdefer f()\n\tdefer h(\"hello\")\n\n\ts := S{}\n\tdefer s.f()\n\tdefer s.g(\"world\")\n\n\treturn 0, nil\n}\n";
    let report = analyze(text);
    assert_eq!(report.diagnostics.len(), 4, "{:?}", report.diagnostics);
    for d in &report.diagnostics {
        assert_eq!(d.code, MISSED_ERROR_CODE);
        assert!(d.fix.is_some());
    }

    let patched = apply_fixes(text, &report);
    assert!(patched.contains("func run() (_ int, err error) {"));
    assert!(patched.contains("defer g.Guard(f)"));
    assert!(patched.contains("defer g.Guard(func() error {\n\treturn h(\"hello\")\n})"));
    assert!(patched.contains("defer g.Guard(s.f)"));
    assert!(patched.contains("defer g.Guard(func() error {\n\treturn s.g(\"world\")\n})"));
    // four findings, one signature rewrite, one prologue, one import
    assert_eq!(patched.matches("g := collector.New()").count(), 1);
    assert_eq!(patched.matches("defer g.Collect(&err)").count(), 1);
    assert_eq!(
        patched
            .matches("import \"github.com/defercheck/collector\"")
            .count(),
        1
    );

    let after = analyze(&patched);
    assert!(after.diagnostics.is_empty(), "{:?}", after.diagnostics);
}

#[test]
fn unfixable_without_error_result() {
    let text = "package main\n\nfunc cleanup() error {\n\treturn nil\n}\n\nfunc logStuff() {\n\tdefer cleanup()\n}\n";
    let report = analyze(text);
    assert_eq!(report.diagnostics.len(), 1);

    let d = &report.diagnostics[0];
    assert_eq!(d.code, CANNOT_AUTOFIX_CODE);
    assert_eq!(
        d.message,
        "missed error in defer statement, but cannot autofix because enclosing function logStuff does not return an error: cleanup()"
    );
    assert!(d.fix.is_none(), "unfixable finding must carry no fix");
}

#[test]
fn idempotent_on_patched_source() {
    let text = "package main\n\nimport \"github.com/defercheck/collector\"\n\nfunc failingClose() error {\n\treturn nil\n}\n\nfunc run() (_ int, err error) {\n\tg := collector.New()\n\tdefer g.Collect(&err)\n\n\tdefer g.Guard(failingClose)\n\treturn 0, nil\n}\n";
    let report = analyze(text);
    assert!(
        report.diagnostics.is_empty(),
        "already patched source must be clean: {:?}",
        report.diagnostics
    );
}

#[test]
fn import_emitted_once_across_findings() {
    let text = "package main\n\nfunc a() error {\n\treturn nil\n}\n\nfunc b() error {\n\treturn nil\n}\n\nfunc run() (int, error) {\n\tdefer a()\n\tdefer b()\n\treturn 0, nil\n}\n";
    let report = analyze(text);
    assert_eq!(report.diagnostics.len(), 2);

    let import_edits = report
        .diagnostics
        .iter()
        .filter_map(|d| d.fix.as_ref())
        .flat_map(|f| &f.edits)
        .filter(|e| e.new_text.contains("github.com/defercheck/collector"))
        .count();
    assert_eq!(import_edits, 1, "exactly one import edit across findings");

    let patched = apply_fixes(text, &report);
    assert_eq!(
        patched
            .matches("import \"github.com/defercheck/collector\"")
            .count(),
        1
    );
    assert!(patched.contains("defer g.Guard(a)"));
    assert!(patched.contains("defer g.Guard(b)"));

    let after = analyze(&patched);
    assert!(after.diagnostics.is_empty(), "{:?}", after.diagnostics);
}

#[test]
fn present_import_suppresses_import_edit() {
    let text = "package main\n\nimport (\n\t\"github.com/defercheck/collector\"\n)\n\nfunc a() error {\n\treturn nil\n}\n\nfunc b() error {\n\treturn nil\n}\n\nfunc run() (err error) {\n\tg := collector.New()\n\tdefer g.Collect(&err)\n\n\tdefer a()\n\tdefer b()\n\treturn nil\n}\n";
    let report = analyze(text);
    assert_eq!(report.diagnostics.len(), 2);

    for d in &report.diagnostics {
        let fix = d.fix.as_ref().expect("fixable finding");
        assert_eq!(
            fix.edits.len(),
            1,
            "patched function needs only the defer rewrite: {:?}",
            fix.edits
        );
        assert!(fix.edits[0].new_text.starts_with("defer g.Guard("));
    }

    let patched = apply_fixes(text, &report);
    assert_eq!(
        patched.matches("github.com/defercheck/collector").count(),
        1
    );

    let after = analyze(&patched);
    assert!(after.diagnostics.is_empty(), "{:?}", after.diagnostics);
}

#[test]
fn method_value_guard_through_local_binding() {
    let text = "package main\n\ntype Store struct{}\n\nfunc (s *Store) Close() error {\n\treturn nil\n}\n\nfunc run() error {\n\ts := &Store{}\n\tdefer s.Close()\n\treturn nil\n}\n";
    let report = analyze(text);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(
        report.diagnostics[0].message,
        "missed error in defer statement: s.Close()"
    );

    let patched = apply_fixes(text, &report);
    assert!(patched.contains("func run() (err error) {"));
    assert!(patched.contains("defer g.Guard(s.Close)"));

    let after = analyze(&patched);
    assert!(after.diagnostics.is_empty(), "{:?}", after.diagnostics);
}

#[test]
fn unresolved_callees_are_skipped() {
    let text = "package main\n\nimport \"os\"\n\nfunc run() error {\n\tdefer os.Remove(\"x\")\n\tdefer unknownHelper()\n\treturn nil\n}\n";
    let report = analyze(text);
    assert!(
        report.diagnostics.is_empty(),
        "unknown signatures must not be reported: {:?}",
        report.diagnostics
    );
}

#[test]
fn non_error_callee_is_not_a_finding() {
    let text = "package main\n\nfunc tick() {\n}\n\nfunc run() error {\n\tdefer tick()\n\treturn nil\n}\n";
    let report = analyze(text);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn harness_override_renames_everything() {
    let text = "package main\n\nfunc failingClose() error {\n\treturn nil\n}\n\nfunc run() (int, error) {\n\tdefer failingClose()\n\treturn 0, nil\n}\n";
    let src = SourceFile::new("fixture.go", text.to_string());
    let opts = AnalyzeOptions {
        harness: HarnessSpec::with_import_path("example.com/q/trap"),
    };
    let report = check_source(&src, &opts);
    assert_eq!(report.diagnostics.len(), 1);
    let fix = report.diagnostics[0].fix.as_ref().expect("fix");
    assert_eq!(fix.message, "Handle defer with trap");

    let patched = apply_edits(text, &collect_fix_edits(&report)).expect("apply");
    assert!(patched.contains("import \"example.com/q/trap\""));
    assert!(patched.contains("g := trap.New()"));
    assert!(patched.contains("defer g.Guard(failingClose)"));

    let patched_src = SourceFile::new("fixture.go", patched.clone());
    let after = check_source(&patched_src, &opts);
    assert!(after.diagnostics.is_empty(), "{:?}", after.diagnostics);
}

#[test]
fn defer_inside_nested_block_patches_enclosing_function() {
    let text = "package main\n\nfunc flush() error {\n\treturn nil\n}\n\nfunc run(ok bool) (int, error) {\n\tif ok {\n\t\tdefer flush()\n\t}\n\treturn 0, nil\n}\n";
    let report = analyze(text);
    assert_eq!(report.diagnostics.len(), 1);

    let patched = apply_fixes(text, &report);
    assert!(patched.contains("func run(ok bool) (_ int, err error) {"));
    assert!(patched.contains("g := collector.New()"));
    assert!(patched.contains("defer g.Guard(flush)"));

    let after = analyze(&patched);
    assert!(after.diagnostics.is_empty(), "{:?}", after.diagnostics);
}

#[test]
fn parse_failure_is_a_lone_error_diagnostic() {
    let text = "package main\n\nfunc broken( {\n";
    let report = analyze(text);
    assert!(!report.ok);
    assert_eq!(report.diagnostics.len(), 1);
    let d = &report.diagnostics[0];
    assert_eq!(d.code, PARSE_ERROR_CODE);
    assert_eq!(d.severity, Severity::Error);
    assert!(d.fix.is_none());
}

#[test]
fn lint_findings_keep_report_ok() {
    let text = "package main\n\nfunc cleanup() error {\n\treturn nil\n}\n\nfunc logStuff() {\n\tdefer cleanup()\n}\n";
    let report = analyze(text);
    assert!(report.ok, "warnings alone do not flip the ok flag");
    assert_eq!(report.diagnostics.len(), 1);
}

#[test]
fn diagnostics_sorted_by_position() {
    let text = "package main\n\nfunc a() error {\n\treturn nil\n}\n\nfunc z() (int, error) {\n\tdefer a()\n\treturn 0, nil\n}\n\nfunc b() (int, error) {\n\tdefer a()\n\treturn 0, nil\n}\n";
    let report = analyze(text);
    assert_eq!(report.diagnostics.len(), 2);
    assert!(
        report.diagnostics[0].pos.line < report.diagnostics[1].pos.line,
        "source order, not name order"
    );
    assert!(report.diagnostics[0].message.contains("a()"));
}
