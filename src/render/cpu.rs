use crate::artifact::DrawTarget;
use crate::foundation::core::{Affine, BezPath, Canvas, Color, Point};

/// A [`DrawTarget`] that forwards to a `vello_cpu` render context.
pub(crate) struct CpuTarget<'a> {
    ctx: &'a mut vello_cpu::RenderContext,
    canvas: Canvas,
}

impl<'a> CpuTarget<'a> {
    pub(crate) fn new(ctx: &'a mut vello_cpu::RenderContext, canvas: Canvas) -> Self {
        Self { ctx, canvas }
    }
}

impl DrawTarget for CpuTarget<'_> {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn clear(&mut self, color: Color) {
        // Drop everything recorded so far, then paint the whole canvas.
        self.ctx.reset();
        if color.a > 0.0 {
            self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            self.ctx.set_paint(paint(color));
            self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(self.canvas.width),
                f64::from(self.canvas.height),
            ));
        }
    }

    fn fill_path(&mut self, path: &BezPath, transform: Affine, color: Color) {
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(paint(color));
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    fn stroke_path(&mut self, path: &BezPath, transform: Affine, line_width: f64, color: Color) {
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(paint(color));
        self.ctx
            .set_stroke(vello_cpu::kurbo::Stroke::new(line_width));
        self.ctx.stroke_path(&bezpath_to_cpu(path));
    }
}

/// Reuse `slot`'s context when the size matches, otherwise allocate a new one.
pub(crate) fn take_context(
    slot: &mut Option<vello_cpu::RenderContext>,
    width: u16,
    height: u16,
) -> vello_cpu::RenderContext {
    let mut ctx = match slot.take() {
        Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
        _ => vello_cpu::RenderContext::new(width, height),
    };
    ctx.reset();
    ctx
}

/// Flush `ctx` and read back premultiplied RGBA8.
pub(crate) fn finish(ctx: &mut vello_cpu::RenderContext, width: u16, height: u16) -> Vec<u8> {
    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    pixmap.data_as_u8_slice().to_vec()
}

fn paint(color: Color) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = color.to_rgba8();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
