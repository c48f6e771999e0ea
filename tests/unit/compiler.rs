use super::*;
use crate::cancel::CancelToken;
use crate::diagnostic::Severity;
use crate::foundation::core::Canvas;
use crate::render::display_list::DisplayList;

fn outcome(src: &str) -> CompilationOutcome {
    ScriptCompiler::new()
        .compile_blocking(src, &CancelSignal::never())
        .unwrap()
}

#[test]
fn empty_source_compiles_to_a_noop_artifact() {
    let out = outcome("");
    assert!(!out.has_errors());
    assert!(out.diagnostics().is_empty());
    let artifact = out.artifact().unwrap();
    let mut list = DisplayList::new(Canvas::default());
    artifact.draw(&mut list).unwrap();
    assert!(list.items().is_empty());
}

#[test]
fn diagnostics_carry_line_and_column() {
    let out = outcome("clear(rgb(0, 0, 0));\n  let x = 1;\n  bogus(2);");
    assert!(out.has_errors());
    assert!(out.artifact().is_none());

    let d = out.diagnostics();
    assert_eq!(d.len(), 2);
    assert_eq!(d[0].severity(), Severity::Warning);
    let loc = d[0].location().unwrap();
    assert_eq!((loc.line, loc.column), (2, 7));
    assert_eq!(d[1].severity(), Severity::Error);
    assert_eq!(d[1].to_string(), "error[3:3]: unknown draw command `bogus`");
}

#[test]
fn runtime_faults_are_located() {
    let out = outcome("clear(rgb(0, 0, 0));\nfail(\"boom\");");
    let artifact = out.artifact().unwrap();
    let mut list = DisplayList::new(Canvas::default());
    let fault = artifact.draw(&mut list).unwrap_err();
    assert_eq!(fault.message, "boom");
    assert_eq!(fault.location.map(|l| l.line), Some(2));
    assert_eq!(
        fault.to_diagnostic().text(),
        "runtime error: boom"
    );
}

#[test]
fn artifact_runs_under_configured_limits() {
    let compiler = ScriptCompiler::with_limits(ExecLimits {
        max_steps: 10,
        ..ExecLimits::default()
    });
    let out = compiler
        .compile_blocking("for i in 0..50 { save(); restore(); }", &CancelSignal::never())
        .unwrap();
    let mut list = DisplayList::new(Canvas::default());
    let fault = out.artifact().unwrap().draw(&mut list).unwrap_err();
    assert!(fault.message.contains("step limit"));
}

#[tokio::test]
async fn async_compile_matches_blocking_compile() {
    let compiler = ScriptCompiler::new();
    let out = compiler
        .compile("let a = 1;".to_owned(), CancelSignal::never())
        .await
        .unwrap();
    assert!(!out.has_errors());
    assert_eq!(out.diagnostics().len(), 1);
}

#[tokio::test]
async fn cancelled_before_start_yields_cancelled() {
    let token = CancelToken::new();
    token.cancel();
    let res = ScriptCompiler::new()
        .compile("clear(rgb(0, 0, 0));".to_owned(), token.signal())
        .await;
    assert_eq!(res.unwrap_err(), Cancelled);
}

#[tokio::test]
async fn deeply_nested_source_is_a_diagnostic() {
    let src = format!(
        "let a = {}1{};\nclear(rgb(0, 0, 0));",
        "(".repeat(10_000),
        ")".repeat(10_000)
    );
    let out = ScriptCompiler::new()
        .compile(src, CancelSignal::never())
        .await
        .unwrap();
    assert!(out.has_errors());
    let errors: Vec<_> = out.diagnostics().iter().filter(|d| d.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].text().contains("nested too deeply"));
    assert_eq!(errors[0].location().map(|l| l.line), Some(1));
}
