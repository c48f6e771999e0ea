use super::*;
use crate::artifact::{Artifact, DrawTarget, ExecutionFault};

struct Noop;

impl Artifact for Noop {
    fn draw(&self, _target: &mut dyn DrawTarget) -> Result<(), ExecutionFault> {
        Ok(())
    }
}

#[test]
fn outcome_has_errors_is_derived_from_severity() {
    let artifact: Arc<dyn Artifact> = Arc::new(Noop);

    let ok = CompilationOutcome::new(
        Some(artifact.clone()),
        vec![Diagnostic::warning(None, "unused"), Diagnostic::info(None, "fyi")],
    );
    assert!(!ok.has_errors());
    assert!(ok.artifact().is_some());

    let bad = CompilationOutcome::new(
        Some(artifact),
        vec![Diagnostic::warning(None, "w"), Diagnostic::error(None, "e")],
    );
    assert!(bad.has_errors());
    assert!(bad.artifact().is_none(), "errors must drop the artifact");
    assert_eq!(bad.diagnostics().len(), 2);
    assert_eq!(bad.diagnostics()[0].severity(), Severity::Warning);
}

#[test]
fn internal_failure_is_an_error_outcome() {
    let o = CompilationOutcome::internal_failure("internal compiler error");
    assert!(o.has_errors());
    assert!(o.artifact().is_none());
    assert_eq!(o.diagnostics()[0].text(), "internal compiler error");
}

#[test]
fn line_index_reports_one_based_line_and_char_column() {
    let src = "let a = 1;\n  fill_rect(é, 0);\nx";
    let idx = LineIndex::new(src);

    let loc = idx.location(Span::new(0, 3));
    assert_eq!((loc.line, loc.column), (1, 1));

    let fill = src.find("fill_rect").unwrap();
    let loc = idx.location(Span::new(fill, fill + 9));
    assert_eq!((loc.line, loc.column), (2, 3));
    assert_eq!(loc.span, Some(Span::new(fill, fill + 9)));

    let zero = src.find(", 0").unwrap() + 2;
    let loc = idx.location(Span::new(zero, zero + 1));
    assert_eq!((loc.line, loc.column), (2, 16));

    let loc = idx.location(Span::new(src.len() - 1, src.len()));
    assert_eq!((loc.line, loc.column), (3, 1));
}

#[test]
fn display_includes_severity_and_position() {
    let d = Diagnostic::error(
        Some(Location {
            line: 3,
            column: 7,
            span: None,
        }),
        "boom",
    );
    assert_eq!(d.to_string(), "error[3:7]: boom");
    assert_eq!(Diagnostic::warning(None, "hm").to_string(), "warning: hm");
}

#[test]
fn span_to_covers_both() {
    assert_eq!(Span::new(4, 6).to(Span::new(1, 5)), Span::new(1, 6));
}
