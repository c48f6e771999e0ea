use super::*;
use crate::cancel::CancelToken;

fn compile(src: &str) -> CompiledScript {
    compile_script(src, &CancelSignal::never()).unwrap()
}

fn texts(c: &CompiledScript) -> Vec<String> {
    c.messages.iter().map(|m| m.message.clone()).collect()
}

#[test]
fn clean_program_compiles_without_messages() {
    let c = compile(
        "let r = min(width, height) / 4;\n\
         clear(hex(\"#101010\"));\n\
         fill_circle(width / 2, height / 2, r, rgb(255, 0, 0));",
    );
    assert!(c.messages.is_empty(), "{:?}", texts(&c));
    let p = c.program.unwrap();
    assert!(!p.ops.is_empty());
    assert_eq!(p.ops.len(), p.spans.len());
    assert!(matches!(
        p.ops.last(),
        Some(Op::Draw {
            cmd: DrawCmd::FillCircle,
            argc: 4
        })
    ));
}

#[test]
fn unused_let_is_a_warning_not_an_error() {
    let c = compile("let unused = 3;\nlet _quiet = 4;\nclear(rgb(0, 0, 0));");
    assert!(c.program.is_some());
    assert_eq!(c.messages.len(), 1);
    assert_eq!(c.messages[0].severity, Severity::Warning);
    assert_eq!(c.messages[0].message, "unused variable `unused`");
    assert_eq!(c.messages[0].span.start, 4);
}

#[test]
fn shadowed_unused_binding_warns() {
    let c = compile("let a = 1;\nlet a = 2;\nfill_rect(a, a, 1, 1, rgb(0, 0, 0));");
    assert!(c.program.is_some());
    let warnings: Vec<_> = c
        .messages
        .iter()
        .filter(|m| m.severity == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].span.start, 4);
}

#[test]
fn loop_variable_is_never_reported_unused() {
    let c = compile("for i in 0..3 { clear(rgb(0, 0, 0)); }");
    assert!(c.messages.is_empty(), "{:?}", texts(&c));
}

#[test]
fn unknown_names_are_errors_and_drop_the_program() {
    let c = compile("fill_rect(x, 0, 1, 1, nope(1));\nsplat(1);");
    assert!(c.program.is_none());
    assert_eq!(
        texts(&c),
        vec![
            "unknown identifier `x`".to_owned(),
            "unknown function `nope`".to_owned(),
            "unknown draw command `splat`".to_owned(),
        ]
    );
    assert!(c.messages.iter().all(|m| m.severity == Severity::Error));
}

#[test]
fn arity_mismatch_reports_expected_count() {
    let c = compile("clear();\nlet v = abs(1, 2);\nfill_rect(0, 0, v, 1, rgb(0,0,0));");
    assert_eq!(
        texts(&c),
        vec![
            "`clear` expects 1 argument, got 0".to_owned(),
            "`abs` expects 1 argument, got 2".to_owned(),
        ]
    );
}

#[test]
fn value_and_command_positions_are_checked() {
    let c = compile("min(1, 2);\nlet v = save();\ntranslate(v, v);");
    assert_eq!(
        texts(&c),
        vec![
            "`min` produces a value; only draw commands can be used as statements".to_owned(),
            "`save` is a draw command and does not produce a value".to_owned(),
        ]
    );
}

#[test]
fn environment_names_cannot_be_rebound() {
    let c = compile("let width = 3;\ntranslate(width, 0);");
    assert!(c.program.is_none());
    assert!(texts(&c)[0].contains("`width` is provided by the surface"));
}

#[test]
fn hex_is_checked_at_compile_time() {
    let bad = compile("clear(hex(\"#12\"));");
    assert!(bad.program.is_none());
    assert_eq!(bad.messages[0].span.start, 10);

    let not_literal = compile("let s = 1;\nclear(hex(s));");
    assert!(
        texts(&not_literal)
            .iter()
            .any(|t| t == "`hex` expects a single string literal")
    );

    let good = compile("clear(hex(\"#ff000080\"));");
    let p = good.program.unwrap();
    assert!(p.consts.iter().any(|v| matches!(v, Value::Color(_))));
}

#[test]
fn messages_are_sorted_by_position() {
    let c = compile("let a = 1;\nfoo(1);\nlet b = bar;");
    let starts: Vec<usize> = c.messages.iter().map(|m| m.span.start).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);
    assert!(c.messages.len() >= 3);
}

#[test]
fn parse_errors_flow_into_messages() {
    let c = compile("let = 3;\nclear(rgb(0, 0, 0));");
    assert!(c.program.is_none());
    assert_eq!(c.messages[0].severity, Severity::Error);
}

#[test]
fn cancelled_compile_returns_cancelled() {
    let token = CancelToken::new();
    token.cancel();
    let res = compile_script("clear(rgb(0, 0, 0));", &token.signal());
    assert_eq!(res.unwrap_err(), Cancelled);
}

#[test]
fn if_and_ternary_emit_patched_jumps() {
    let c = compile(
        "let big = width > 100;\n\
         if big { clear(rgb(0, 0, 0)); } else { clear(rgb(255, 255, 255)); }\n\
         translate(big ? 1 : 2, 0);",
    );
    let p = c.program.unwrap();
    let len = p.ops.len() as u32;
    for op in &p.ops {
        if let Op::Jump(t) | Op::JumpIfFalse(t) = op {
            assert!(*t > 0 && *t <= len, "jump target {t} out of range");
        }
    }
}
