use std::sync::Arc;

use crate::diagnostic::Span;
use crate::foundation::core::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConstIdx(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LocalSlot(pub(crate) u32);

/// Runtime value. Strings only appear as literal arguments (messages).
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Num(f64),
    Bool(bool),
    Color(Color),
    Str(Arc<str>),
}

impl Value {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Num(_) => "number",
            Self::Bool(_) => "bool",
            Self::Color(_) => "color",
            Self::Str(_) => "string",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnvField {
    Width,
    Height,
}

/// Value-producing functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuiltinId {
    Min,
    Max,
    Clamp,
    Abs,
    Sin,
    Cos,
    Sqrt,
    Floor,
    Lerp,
    Rgb,
    Rgba,
    Hsl,
}

impl BuiltinId {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "min" => Self::Min,
            "max" => Self::Max,
            "clamp" => Self::Clamp,
            "abs" => Self::Abs,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "sqrt" => Self::Sqrt,
            "floor" => Self::Floor,
            "lerp" => Self::Lerp,
            "rgb" => Self::Rgb,
            "rgba" => Self::Rgba,
            "hsl" => Self::Hsl,
            _ => return None,
        })
    }

    pub(crate) fn arity(self) -> u8 {
        match self {
            Self::Abs | Self::Sin | Self::Cos | Self::Sqrt | Self::Floor => 1,
            Self::Min | Self::Max => 2,
            Self::Clamp | Self::Lerp | Self::Rgb | Self::Hsl => 3,
            Self::Rgba => 4,
        }
    }
}

/// Statement-level commands with side effects on the surface or the VM state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrawCmd {
    Clear,
    FillRect,
    StrokeRect,
    FillRoundRect,
    FillCircle,
    StrokeCircle,
    Line,
    Translate,
    Rotate,
    Scale,
    Save,
    Restore,
    Fail,
    Assert,
}

impl DrawCmd {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "clear" => Self::Clear,
            "fill_rect" => Self::FillRect,
            "stroke_rect" => Self::StrokeRect,
            "fill_round_rect" => Self::FillRoundRect,
            "fill_circle" => Self::FillCircle,
            "stroke_circle" => Self::StrokeCircle,
            "line" => Self::Line,
            "translate" => Self::Translate,
            "rotate" => Self::Rotate,
            "scale" => Self::Scale,
            "save" => Self::Save,
            "restore" => Self::Restore,
            "fail" => Self::Fail,
            "assert" => Self::Assert,
            _ => return None,
        })
    }

    pub(crate) fn arity(self) -> u8 {
        match self {
            Self::Save | Self::Restore => 0,
            Self::Clear | Self::Rotate | Self::Fail => 1,
            Self::Translate | Self::Scale | Self::Assert => 2,
            Self::FillCircle => 4,
            Self::FillRect | Self::StrokeCircle => 5,
            Self::StrokeRect | Self::FillRoundRect | Self::Line => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    PushConst(ConstIdx),
    LoadLocal(LocalSlot),
    StoreLocal(LocalSlot),
    LoadEnv(EnvField),

    Neg,
    Not,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,

    /// Unconditional jump to an op index.
    Jump(u32),
    /// Pop a bool; jump when it is `false`.
    JumpIfFalse(u32),

    CallBuiltin { id: BuiltinId, argc: u8 },
    Draw { cmd: DrawCmd, argc: u8 },
}

/// A compiled program. `spans[i]` is the source range that produced `ops[i]`.
#[derive(Debug, Clone)]
pub(crate) struct BytecodeProgram {
    pub(crate) ops: Vec<Op>,
    pub(crate) spans: Vec<Span>,
    pub(crate) consts: Vec<Value>,
    pub(crate) locals: u32,
}

impl BytecodeProgram {
    pub(crate) fn new() -> Self {
        Self {
            ops: Vec::new(),
            spans: Vec::new(),
            consts: Vec::new(),
            locals: 0,
        }
    }

    pub(crate) fn push_const(&mut self, c: Value) -> ConstIdx {
        let idx = ConstIdx(self.consts.len() as u32);
        self.consts.push(c);
        idx
    }

    /// Append an op and return its index.
    pub(crate) fn emit(&mut self, op: Op, span: Span) -> u32 {
        let idx = self.ops.len() as u32;
        self.ops.push(op);
        self.spans.push(span);
        idx
    }

    /// Index the next emitted op will get.
    pub(crate) fn next_index(&self) -> u32 {
        self.ops.len() as u32
    }

    /// Point the jump at `at` to `target`.
    pub(crate) fn patch_jump(&mut self, at: u32, target: u32) {
        match &mut self.ops[at as usize] {
            Op::Jump(t) | Op::JumpIfFalse(t) => *t = target,
            other => debug_assert!(false, "patching non-jump op {other:?}"),
        }
    }
}
