//! Draw sink abstraction.
//!
//! The core never rasterizes. Shapes describe themselves as Bézier paths and
//! hand them to a [`DrawSink`] supplied by the host.

use kurbo::BezPath;
use peniko::Color;

/// Receiver of draw calls, implemented by the host renderer.
pub trait DrawSink {
    /// Stroke `path` with a hairline of `color`, optionally dashed.
    fn stroke_path(&mut self, path: &BezPath, color: Color, dashed: bool);

    /// Fill `path` with `color` using the non-zero rule.
    fn fill_path(&mut self, path: &BezPath, color: Color);
}

/// A recorded draw call.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Stroke {
        path: BezPath,
        color: Color,
        dashed: bool,
    },
    Fill {
        path: BezPath,
        color: Color,
    },
}

impl DrawCommand {
    pub fn path(&self) -> &BezPath {
        match self {
            DrawCommand::Stroke { path, .. } | DrawCommand::Fill { path, .. } => path,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            DrawCommand::Stroke { color, .. } | DrawCommand::Fill { color, .. } => *color,
        }
    }

    pub fn is_dashed(&self) -> bool {
        matches!(self, DrawCommand::Stroke { dashed: true, .. })
    }
}

/// Sink that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Vec<DrawCommand>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn strokes(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { .. }))
    }

    pub fn fills(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Fill { .. }))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl DrawSink for RecordingSink {
    fn stroke_path(&mut self, path: &BezPath, color: Color, dashed: bool) {
        self.commands.push(DrawCommand::Stroke {
            path: path.clone(),
            color,
            dashed,
        });
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) {
        self.commands.push(DrawCommand::Fill {
            path: path.clone(),
            color,
        });
    }
}
