use crate::artifact::DrawTarget;
use crate::foundation::core::{Affine, BezPath, Canvas, Color};

/// One recorded drawing call.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DrawItem {
    Clear(Color),
    Fill {
        path: BezPath,
        transform: Affine,
        color: Color,
    },
    Stroke {
        path: BezPath,
        transform: Affine,
        line_width: f64,
        color: Color,
    },
}

/// Records drawing calls for later replay on a real device.
#[derive(Clone, Debug)]
pub(crate) struct DisplayList {
    canvas: Canvas,
    items: Vec<DrawItem>,
}

impl DisplayList {
    pub(crate) fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            items: Vec::new(),
        }
    }

    pub(crate) fn items(&self) -> &[DrawItem] {
        &self.items
    }

    pub(crate) fn replay(&self, target: &mut dyn DrawTarget) {
        for item in &self.items {
            match item {
                DrawItem::Clear(c) => target.clear(*c),
                DrawItem::Fill {
                    path,
                    transform,
                    color,
                } => target.fill_path(path, *transform, *color),
                DrawItem::Stroke {
                    path,
                    transform,
                    line_width,
                    color,
                } => target.stroke_path(path, *transform, *line_width, *color),
            }
        }
    }
}

impl DrawTarget for DisplayList {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn clear(&mut self, color: Color) {
        // Nothing before a clear can be visible.
        self.items.clear();
        self.items.push(DrawItem::Clear(color));
    }

    fn fill_path(&mut self, path: &BezPath, transform: Affine, color: Color) {
        self.items.push(DrawItem::Fill {
            path: path.clone(),
            transform,
            color,
        });
    }

    fn stroke_path(&mut self, path: &BezPath, transform: Affine, line_width: f64, color: Color) {
        self.items.push(DrawItem::Stroke {
            path: path.clone(),
            transform,
            line_width,
            color,
        });
    }
}
