use super::*;
use crate::cancel::CancelSignal;
use crate::foundation::core::Canvas;
use crate::render::display_list::{DisplayList, DrawItem};
use crate::script::codegen::compile_script;

fn program(src: &str) -> BytecodeProgram {
    let c = compile_script(src, &CancelSignal::never()).unwrap();
    assert!(
        c.program.is_some(),
        "unexpected compile errors: {:?}",
        c.messages
    );
    c.program.unwrap()
}

fn exec(src: &str) -> (DisplayList, Result<(), VmFault>) {
    exec_with(src, ExecLimits::default())
}

fn exec_with(src: &str, limits: ExecLimits) -> (DisplayList, Result<(), VmFault>) {
    let p = program(src);
    let mut list = DisplayList::new(Canvas {
        width: 200,
        height: 100,
    });
    let res = run(&p, &mut list, limits);
    (list, res)
}

fn fault(src: &str) -> String {
    exec(src).1.unwrap_err().message
}

#[test]
fn environment_and_arithmetic() {
    let (list, res) = exec("fill_rect(0, 0, width / 2, height % 30, rgb(255, 0, 0));");
    res.unwrap();
    let DrawItem::Fill { path, color, .. } = &list.items()[0] else {
        panic!("expected fill");
    };
    let bbox = kurbo::Shape::bounding_box(path);
    assert_eq!((bbox.width(), bbox.height()), (100.0, 10.0));
    assert_eq!(*color, Color::rgba(1.0, 0.0, 0.0, 1.0));
}

#[test]
fn clear_discards_earlier_items() {
    let (list, res) = exec(
        "fill_circle(10, 10, 5, rgb(0, 0, 0));\n\
         clear(hex(\"#00ff00\"));\n\
         line(0, 0, 10, 10, 2, rgb(0, 0, 0));",
    );
    res.unwrap();
    assert_eq!(list.items().len(), 2);
    assert!(matches!(list.items()[0], DrawItem::Clear(_)));
    assert!(matches!(
        list.items()[1],
        DrawItem::Stroke { line_width, .. } if line_width == 2.0
    ));
}

#[test]
fn loops_and_branches() {
    let (list, res) = exec(
        "for i in 0..5 {\n\
           if i % 2 == 0 { fill_rect(i * 10, 0, 5, 5, rgb(0, 0, 0)); }\n\
           else if i == 3 { stroke_circle(0, 0, 3, 1, rgb(0, 0, 0)); }\n\
         }",
    );
    res.unwrap();
    let fills = list
        .items()
        .iter()
        .filter(|i| matches!(i, DrawItem::Fill { .. }))
        .count();
    let strokes = list
        .items()
        .iter()
        .filter(|i| matches!(i, DrawItem::Stroke { .. }))
        .count();
    assert_eq!((fills, strokes), (3, 1));
}

#[test]
fn save_restore_scopes_transforms() {
    let (list, res) = exec(
        "save();\n\
         translate(10, 20);\n\
         fill_rect(0, 0, 1, 1, rgb(0, 0, 0));\n\
         restore();\n\
         fill_rect(0, 0, 1, 1, rgb(0, 0, 0));",
    );
    res.unwrap();
    let transforms: Vec<Affine> = list
        .items()
        .iter()
        .filter_map(|i| match i {
            DrawItem::Fill { transform, .. } => Some(*transform),
            _ => None,
        })
        .collect();
    assert_eq!(transforms, vec![Affine::translate((10.0, 20.0)), Affine::IDENTITY]);
}

#[test]
fn ternary_and_builtins() {
    let (list, res) = exec(
        "let r = width > 100 ? clamp(lerp(0, 40, 0.5), 0, 15) : 1;\n\
         fill_circle(0, 0, max(r, abs(-2)), hsl(120, 1, 0.5));",
    );
    res.unwrap();
    let DrawItem::Fill { path, color, .. } = &list.items()[0] else {
        panic!("expected fill");
    };
    let bbox = kurbo::Shape::bounding_box(path);
    assert!((bbox.width() - 30.0).abs() < 1e-2);
    assert!((color.g - 1.0).abs() < 1e-9);
}

#[test]
fn runtime_faults_report_the_failing_op() {
    assert_eq!(fault("let z = 0;\ntranslate(1 / z, 0);"), "division by zero");
    assert_eq!(fault("let z = 0;\ntranslate(1 % z, 0);"), "modulo by zero");
    assert_eq!(
        fault("fill_rect(0, 0, 1, 1, 3);"),
        "expected color, got number"
    );
    assert_eq!(
        fault("translate(rgb(0, 0, 0) + 1, 0);"),
        "expected number, got color"
    );
    assert_eq!(fault("fail(\"nope\");"), "nope");
    assert_eq!(
        fault("assert(width < 10, \"too wide\");"),
        "assertion failed: too wide"
    );
    assert_eq!(
        fault("restore();"),
        "`restore` called without a matching `save`"
    );
    assert!(fault("fill_circle(0, 0, -1, rgb(0, 0, 0));").contains("radius"));
    assert!(fault("line(0, 0, 1, 1, 0, rgb(0, 0, 0));").contains("line width"));
    assert!(fault("translate(sqrt(-1), 0);").contains("non-finite"));
    assert!(fault("if 1 { save(); }").contains("condition must be a bool"));
}

#[test]
fn fault_keeps_earlier_drawing() {
    let (list, res) = exec(
        "fill_rect(0, 0, 5, 5, rgb(0, 0, 0));\n\
         fail(\"stop\");\n\
         fill_rect(0, 0, 5, 5, rgb(0, 0, 0));",
    );
    let f = res.unwrap_err();
    assert_eq!(list.items().len(), 1);
    let p = program("fill_rect(0, 0, 5, 5, rgb(0, 0, 0));\nfail(\"stop\");");
    assert!(matches!(p.ops[f.op], Op::Draw { cmd: DrawCmd::Fail, .. }));
}

#[test]
fn step_budget_stops_long_loops() {
    let limits = ExecLimits {
        max_steps: 1_000,
        ..ExecLimits::default()
    };
    let (_, res) = exec_with("for i in 0..100000 { translate(1, 0); }", limits);
    assert!(res.unwrap_err().message.contains("step limit"));
}

#[test]
fn save_depth_is_bounded() {
    let limits = ExecLimits {
        max_save_depth: 4,
        ..ExecLimits::default()
    };
    let (_, res) = exec_with("for i in 0..10 { save(); }", limits);
    assert!(res.unwrap_err().message.contains("deeper than 4"));
}

#[test]
fn transform_overflow_faults() {
    let (list, res) = exec(
        "scale(1e200, 1e200);\n\
         scale(1e200, 1e200);\n\
         fill_rect(0, 0, 10, 10, rgb(0, 0, 0));",
    );
    let f = res.unwrap_err();
    assert_eq!(f.message, "`scale` produced a non-finite transform");
    assert!(list.items().is_empty());
}

#[test]
fn geometry_outside_drawable_range_faults() {
    let msg = fault("line(0, 0, 1e30, 1e30, 1e20, rgb(0, 0, 255));");
    assert!(msg.starts_with("`line` line width"), "{msg}");

    let msg = fault("line(0, 0, 1e30, 1e30, 1, rgb(0, 0, 255));");
    assert!(msg.contains("drawable range"), "{msg}");

    let msg = fault("fill_circle(0, 0, 2e6, rgb(0, 0, 0));");
    assert!(msg.starts_with("`fill_circle` geometry"), "{msg}");

    // In range before the transform, out of range after it.
    let msg = fault("scale(1e4, 1e4);\nfill_rect(0, 0, 500, 500, rgb(0, 0, 0));");
    assert!(msg.contains("drawable range"), "{msg}");

    let msg = fault("scale(1e5, 1);\nstroke_rect(0, 0, 1, 1, 20, rgb(0, 0, 0));");
    assert!(msg.contains("line width"), "{msg}");
}

#[test]
fn geometry_near_the_bound_is_drawn() {
    let (list, res) = exec(
        "fill_rect(-900000, -900000, 1800000, 1800000, rgb(0, 0, 0));\n\
         line(0, 0, 1000, 0, 1000, rgb(0, 0, 0));",
    );
    res.unwrap();
    assert_eq!(list.items().len(), 2);
    assert!(MAX_DEVICE_EXTENT >= 1.0e6);
}
