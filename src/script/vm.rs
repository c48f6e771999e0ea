use kurbo::{Circle, Line, Rect, RoundedRect, Shape};

use crate::artifact::DrawTarget;
use crate::foundation::core::{Affine, BezPath, Color};
use crate::script::bytecode::{BuiltinId, BytecodeProgram, DrawCmd, EnvField, Op, Value};
use crate::script::color::{from_byte_channels, hsl_to_color};

/// Curve flattening tolerance used when building shapes, in pixels.
const SHAPE_TOLERANCE: f64 = 0.1;

/// Largest device-space coordinate or stroke width a draw command may reach, in pixels.
const MAX_DEVICE_EXTENT: f64 = 1.0e6;

/// Resource bounds for one program run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExecLimits {
    /// Maximum number of instructions executed before the run is aborted.
    pub max_steps: u64,
    /// Maximum depth of nested `save()` calls.
    pub max_save_depth: usize,
}

impl Default for ExecLimits {
    fn default() -> Self {
        Self {
            max_steps: 5_000_000,
            max_save_depth: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VmFault {
    pub(crate) message: String,
    /// Index of the faulting op.
    pub(crate) op: usize,
}

/// Run `program` to completion against `target`.
pub(crate) fn run(
    program: &BytecodeProgram,
    target: &mut dyn DrawTarget,
    limits: ExecLimits,
) -> Result<(), VmFault> {
    let mut vm = Interp {
        program,
        target,
        limits,
        locals: vec![Value::Num(0.0); program.locals as usize],
        stack: Vec::with_capacity(16),
        transform: Affine::IDENTITY,
        saved: Vec::new(),
    };

    let mut pc = 0usize;
    let mut steps = 0u64;
    while let Some(&op) = program.ops.get(pc) {
        steps += 1;
        if steps > limits.max_steps {
            return Err(VmFault {
                message: format!(
                    "step limit of {} instructions exceeded",
                    limits.max_steps
                ),
                op: pc,
            });
        }
        match vm.exec(op) {
            Ok(Some(target)) => pc = target as usize,
            Ok(None) => pc += 1,
            Err(message) => return Err(VmFault { message, op: pc }),
        }
    }
    Ok(())
}

struct Interp<'p, 't> {
    program: &'p BytecodeProgram,
    target: &'t mut dyn DrawTarget,
    limits: ExecLimits,
    locals: Vec<Value>,
    stack: Vec<Value>,
    transform: Affine,
    saved: Vec<Affine>,
}

impl Interp<'_, '_> {
    /// Execute one op; `Some(i)` is a jump target.
    fn exec(&mut self, op: Op) -> Result<Option<u32>, String> {
        match op {
            Op::PushConst(idx) => {
                let c = self
                    .program
                    .consts
                    .get(idx.0 as usize)
                    .ok_or("const idx out of range")?
                    .clone();
                self.stack.push(c);
            }
            Op::LoadLocal(slot) => {
                let v = self
                    .locals
                    .get(slot.0 as usize)
                    .ok_or("local slot out of range")?
                    .clone();
                self.stack.push(v);
            }
            Op::StoreLocal(slot) => {
                let v = self.pop()?;
                *self
                    .locals
                    .get_mut(slot.0 as usize)
                    .ok_or("local slot out of range")? = v;
            }
            Op::LoadEnv(field) => {
                let canvas = self.target.canvas();
                let v = match field {
                    EnvField::Width => canvas.width,
                    EnvField::Height => canvas.height,
                };
                self.stack.push(Value::Num(f64::from(v)));
            }

            Op::Neg => {
                let v = self.pop_num()?;
                self.stack.push(Value::Num(-v));
            }
            Op::Not => {
                let v = self.pop_bool()?;
                self.stack.push(Value::Bool(!v));
            }
            Op::Add => self.bin_num(|a, b| Ok(a + b))?,
            Op::Sub => self.bin_num(|a, b| Ok(a - b))?,
            Op::Mul => self.bin_num(|a, b| Ok(a * b))?,
            Op::Div => self.bin_num(|a, b| {
                if b == 0.0 {
                    Err("division by zero".to_owned())
                } else {
                    Ok(a / b)
                }
            })?,
            Op::Mod => self.bin_num(|a, b| {
                if b == 0.0 {
                    Err("modulo by zero".to_owned())
                } else {
                    Ok(a % b)
                }
            })?,

            Op::Eq => self.bin_eq(true)?,
            Op::Ne => self.bin_eq(false)?,
            Op::Lt => self.bin_cmp(|a, b| a < b)?,
            Op::Le => self.bin_cmp(|a, b| a <= b)?,
            Op::Gt => self.bin_cmp(|a, b| a > b)?,
            Op::Ge => self.bin_cmp(|a, b| a >= b)?,
            Op::And => {
                let b = self.pop_bool()?;
                let a = self.pop_bool()?;
                self.stack.push(Value::Bool(a && b));
            }
            Op::Or => {
                let b = self.pop_bool()?;
                let a = self.pop_bool()?;
                self.stack.push(Value::Bool(a || b));
            }

            Op::Jump(target) => return Ok(Some(target)),
            Op::JumpIfFalse(target) => {
                let cond = self
                    .pop_bool()
                    .map_err(|_| "condition must be a bool".to_owned())?;
                if !cond {
                    return Ok(Some(target));
                }
            }

            Op::CallBuiltin { id, argc } => self.call_builtin(id, argc)?,
            Op::Draw { cmd, argc } => self.draw(cmd, argc)?,
        }
        Ok(None)
    }

    fn pop(&mut self) -> Result<Value, String> {
        self.stack.pop().ok_or_else(|| "stack underflow".to_owned())
    }

    fn pop_num(&mut self) -> Result<f64, String> {
        match self.pop()? {
            Value::Num(v) => Ok(v),
            other => Err(format!("expected number, got {}", other.type_name())),
        }
    }

    fn pop_bool(&mut self) -> Result<bool, String> {
        match self.pop()? {
            Value::Bool(v) => Ok(v),
            other => Err(format!("expected bool, got {}", other.type_name())),
        }
    }

    fn pop_color(&mut self) -> Result<Color, String> {
        match self.pop()? {
            Value::Color(c) => Ok(c),
            other => Err(format!("expected color, got {}", other.type_name())),
        }
    }

    /// Pop `N` numbers, returned in push order.
    fn pop_nums<const N: usize>(&mut self) -> Result<[f64; N], String> {
        let mut out = [0.0; N];
        for slot in out.iter_mut().rev() {
            *slot = self.pop_num()?;
        }
        Ok(out)
    }

    /// Like [`Self::pop_nums`] but rejects NaN and infinities.
    fn pop_finite<const N: usize>(&mut self, what: &str) -> Result<[f64; N], String> {
        let vals = self.pop_nums::<N>()?;
        if vals.iter().any(|v| !v.is_finite()) {
            return Err(format!("non-finite argument to `{what}`"));
        }
        Ok(vals)
    }

    fn bin_num(&mut self, f: impl FnOnce(f64, f64) -> Result<f64, String>) -> Result<(), String> {
        let b = self.pop_num()?;
        let a = self.pop_num()?;
        self.stack.push(Value::Num(f(a, b)?));
        Ok(())
    }

    fn bin_cmp(&mut self, f: impl FnOnce(f64, f64) -> bool) -> Result<(), String> {
        let b = self.pop_num()?;
        let a = self.pop_num()?;
        self.stack.push(Value::Bool(f(a, b)));
        Ok(())
    }

    fn bin_eq(&mut self, is_eq: bool) -> Result<(), String> {
        let b = self.pop()?;
        let a = self.pop()?;
        let res = match (&a, &b) {
            (Value::Num(x), Value::Num(y)) => x == y,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Color(x), Value::Color(y)) => x == y,
            (Value::Str(x), Value::Str(y)) => x == y,
            _ => {
                return Err(format!(
                    "cannot compare {} with {}",
                    a.type_name(),
                    b.type_name()
                ));
            }
        };
        self.stack.push(Value::Bool(res == is_eq));
        Ok(())
    }

    fn call_builtin(&mut self, id: BuiltinId, argc: u8) -> Result<(), String> {
        if self.stack.len() < usize::from(argc) {
            return Err("stack underflow in builtin call".to_owned());
        }
        let v = match id {
            BuiltinId::Abs => Value::Num(self.pop_num()?.abs()),
            BuiltinId::Sin => Value::Num(self.pop_num()?.sin()),
            BuiltinId::Cos => Value::Num(self.pop_num()?.cos()),
            BuiltinId::Sqrt => Value::Num(self.pop_num()?.sqrt()),
            BuiltinId::Floor => Value::Num(self.pop_num()?.floor()),
            BuiltinId::Min => {
                let [a, b] = self.pop_nums::<2>()?;
                Value::Num(a.min(b))
            }
            BuiltinId::Max => {
                let [a, b] = self.pop_nums::<2>()?;
                Value::Num(a.max(b))
            }
            BuiltinId::Clamp => {
                let [x, lo, hi] = self.pop_nums::<3>()?;
                if lo > hi || lo.is_nan() || hi.is_nan() {
                    return Err(format!("clamp bounds are inverted ({lo} > {hi})"));
                }
                Value::Num(x.clamp(lo, hi))
            }
            BuiltinId::Lerp => {
                let [a, b, t] = self.pop_nums::<3>()?;
                Value::Num(a + (b - a) * t)
            }
            BuiltinId::Rgb => {
                let [r, g, b] = self.pop_nums::<3>()?;
                Value::Color(from_byte_channels(r, g, b, 255.0))
            }
            BuiltinId::Rgba => {
                let [r, g, b, a] = self.pop_nums::<4>()?;
                Value::Color(from_byte_channels(r, g, b, a))
            }
            BuiltinId::Hsl => {
                let [h, s, l] = self.pop_nums::<3>()?;
                Value::Color(hsl_to_color(h, s, l))
            }
        };
        self.stack.push(v);
        Ok(())
    }

    fn draw(&mut self, cmd: DrawCmd, argc: u8) -> Result<(), String> {
        if self.stack.len() < usize::from(argc) {
            return Err("stack underflow in draw command".to_owned());
        }
        match cmd {
            DrawCmd::Clear => {
                let c = self.pop_color()?;
                self.target.clear(c);
            }
            DrawCmd::FillRect => {
                let c = self.pop_color()?;
                let [x, y, w, h] = self.pop_finite::<4>("fill_rect")?;
                self.fill(
                    "fill_rect",
                    &Rect::new(x, y, x + w, y + h).to_path(SHAPE_TOLERANCE),
                    c,
                )?;
            }
            DrawCmd::StrokeRect => {
                let c = self.pop_color()?;
                let [x, y, w, h, lw] = self.pop_finite::<5>("stroke_rect")?;
                let lw = positive("stroke_rect", "line width", lw)?;
                self.stroke(
                    "stroke_rect",
                    &Rect::new(x, y, x + w, y + h).to_path(SHAPE_TOLERANCE),
                    lw,
                    c,
                )?;
            }
            DrawCmd::FillRoundRect => {
                let c = self.pop_color()?;
                let [x, y, w, h, r] = self.pop_finite::<5>("fill_round_rect")?;
                if r < 0.0 {
                    return Err("`fill_round_rect` radius must be >= 0".to_owned());
                }
                self.fill(
                    "fill_round_rect",
                    &RoundedRect::new(x, y, x + w, y + h, r).to_path(SHAPE_TOLERANCE),
                    c,
                )?;
            }
            DrawCmd::FillCircle => {
                let c = self.pop_color()?;
                let [cx, cy, r] = self.pop_finite::<3>("fill_circle")?;
                if r < 0.0 {
                    return Err("`fill_circle` radius must be >= 0".to_owned());
                }
                self.fill(
                    "fill_circle",
                    &Circle::new((cx, cy), r).to_path(SHAPE_TOLERANCE),
                    c,
                )?;
            }
            DrawCmd::StrokeCircle => {
                let c = self.pop_color()?;
                let [cx, cy, r, lw] = self.pop_finite::<4>("stroke_circle")?;
                if r < 0.0 {
                    return Err("`stroke_circle` radius must be >= 0".to_owned());
                }
                let lw = positive("stroke_circle", "line width", lw)?;
                self.stroke(
                    "stroke_circle",
                    &Circle::new((cx, cy), r).to_path(SHAPE_TOLERANCE),
                    lw,
                    c,
                )?;
            }
            DrawCmd::Line => {
                let c = self.pop_color()?;
                let [x0, y0, x1, y1, lw] = self.pop_finite::<5>("line")?;
                let lw = positive("line", "line width", lw)?;
                self.stroke(
                    "line",
                    &Line::new((x0, y0), (x1, y1)).to_path(SHAPE_TOLERANCE),
                    lw,
                    c,
                )?;
            }
            DrawCmd::Translate => {
                let [dx, dy] = self.pop_finite::<2>("translate")?;
                self.transform *= Affine::translate((dx, dy));
                self.check_transform("translate")?;
            }
            DrawCmd::Rotate => {
                let [angle] = self.pop_finite::<1>("rotate")?;
                self.transform *= Affine::rotate(angle);
                self.check_transform("rotate")?;
            }
            DrawCmd::Scale => {
                let [sx, sy] = self.pop_finite::<2>("scale")?;
                self.transform *= Affine::scale_non_uniform(sx, sy);
                self.check_transform("scale")?;
            }
            DrawCmd::Save => {
                if self.saved.len() >= self.limits.max_save_depth {
                    return Err(format!(
                        "`save` nested deeper than {} levels",
                        self.limits.max_save_depth
                    ));
                }
                self.saved.push(self.transform);
            }
            DrawCmd::Restore => {
                self.transform = self
                    .saved
                    .pop()
                    .ok_or("`restore` called without a matching `save`")?;
            }
            DrawCmd::Fail => {
                let msg = self.pop()?;
                return Err(display_value(&msg));
            }
            DrawCmd::Assert => {
                let msg = self.pop()?;
                let cond = self.pop_bool()?;
                if !cond {
                    return Err(format!("assertion failed: {}", display_value(&msg)));
                }
            }
        }
        Ok(())
    }

    fn fill(&mut self, what: &str, path: &BezPath, color: Color) -> Result<(), String> {
        self.check_extent(what, path, 0.0)?;
        self.target.fill_path(path, self.transform, color);
        Ok(())
    }

    fn stroke(
        &mut self,
        what: &str,
        path: &BezPath,
        line_width: f64,
        color: Color,
    ) -> Result<(), String> {
        // Sum of the linear coefficients bounds how far the transform can stretch a length.
        let [a, b, c, d, _, _] = self.transform.as_coeffs();
        let device_width = line_width * (a.abs() + b.abs() + c.abs() + d.abs());
        if device_width > MAX_DEVICE_EXTENT {
            return Err(format!(
                "`{what}` line width of {line_width} exceeds {MAX_DEVICE_EXTENT} px on the device"
            ));
        }
        self.check_extent(what, path, device_width / 2.0)?;
        self.target
            .stroke_path(path, self.transform, line_width, color);
        Ok(())
    }

    /// Fault when the device-space bounds of `path`, grown by `margin`, leave the drawable range.
    fn check_extent(&self, what: &str, path: &BezPath, margin: f64) -> Result<(), String> {
        let r = self
            .transform
            .transform_rect_bbox(path.bounding_box())
            .inflate(margin, margin);
        let within = |v: f64| v.abs() <= MAX_DEVICE_EXTENT;
        if within(r.x0) && within(r.y0) && within(r.x1) && within(r.y1) {
            Ok(())
        } else {
            Err(format!(
                "`{what}` geometry exceeds the drawable range of ±{MAX_DEVICE_EXTENT} px"
            ))
        }
    }

    fn check_transform(&self, what: &str) -> Result<(), String> {
        if self.transform.is_finite() {
            Ok(())
        } else {
            Err(format!("`{what}` produced a non-finite transform"))
        }
    }
}

fn positive(what: &str, arg: &str, v: f64) -> Result<f64, String> {
    if v > 0.0 {
        Ok(v)
    } else {
        Err(format!("`{what}` {arg} must be > 0, got {v}"))
    }
}

fn display_value(v: &Value) -> String {
    match v {
        Value::Str(s) => s.to_string(),
        Value::Num(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Color(c) => {
            let [r, g, b, a] = c.to_rgba8();
            format!("rgba({r}, {g}, {b}, {a})")
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/vm.rs"]
mod tests;
