//! Session replayer for the inkflow engine.
//!
//! A session is a JSON array of pointer events. Replaying it drives a fresh
//! engine exactly as a windowing host would, then reports what was drawn.

use inkflow_core::{
    ConfigError, DrawCommand, DrawingEvent, Engine, EngineConfig, EngineError, GestureEvent, MouseButton,
    PointerEvent, RecordingSink, Rgba8,
};
use kurbo::{Point, Rect};
use std::cell::RefCell;
use std::fmt::Write as _;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid session JSON: {0}")]
    Session(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Outcome of a replay.
#[derive(Debug, Default)]
pub struct Report {
    pub drawing_events: Vec<DrawingEvent>,
    pub gesture_events: Vec<GestureEvent>,
    pub shape_count: usize,
    /// Union of every shape's bounds, `None` for an empty canvas.
    pub extent: Option<Rect>,
    pub commands: Vec<DrawCommand>,
}

impl Report {
    /// Human-readable summary, one line per draw command.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "shapes: {}", self.shape_count);
        if let Some(extent) = self.extent {
            let _ = writeln!(
                out,
                "extent: [{:.1}, {:.1}, {:.1}, {:.1}]",
                extent.x0, extent.y0, extent.x1, extent.y1
            );
        }
        for event in &self.gesture_events {
            let _ = writeln!(out, "gesture: {event:?}");
        }
        for command in &self.commands {
            let bounds = kurbo::Shape::bounding_box(command.path());
            let Rgba8 { r, g, b, a } = Rgba8::from(command.color());
            let kind = match command {
                DrawCommand::Stroke { .. } if command.is_dashed() => "stroke (dashed)",
                DrawCommand::Stroke { .. } => "stroke",
                DrawCommand::Fill { .. } => "fill",
            };
            let _ = writeln!(
                out,
                "{kind} #{r:02x}{g:02x}{b:02x}{a:02x} [{:.1}, {:.1}, {:.1}, {:.1}]",
                bounds.x0, bounds.y0, bounds.x1, bounds.y1
            );
        }
        out
    }
}

pub fn load_config(path: &Path) -> AppResult<EngineConfig> {
    let json = std::fs::read_to_string(path)?;
    Ok(EngineConfig::from_json(&json)?)
}

pub fn load_session(path: &Path) -> AppResult<Vec<PointerEvent>> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Built-in session: two rectangles, one moved, then an up-down gesture.
pub fn demo_session() -> Vec<PointerEvent> {
    let down = |x, y, button| PointerEvent::Down { position: Point::new(x, y), button };
    let up = |x, y, button| PointerEvent::Up { position: Point::new(x, y), button };
    let mv = |x, y| PointerEvent::Move { position: Point::new(x, y) };
    vec![
        mv(10.0, 10.0),
        down(20.0, 20.0, MouseButton::Left),
        mv(60.0, 50.0),
        mv(120.0, 100.0),
        up(120.0, 100.0, MouseButton::Left),
        down(200.0, 40.0, MouseButton::Left),
        mv(260.0, 90.0),
        up(260.0, 90.0, MouseButton::Left),
        down(70.0, 60.0, MouseButton::Left),
        mv(90.0, 80.0),
        up(90.0, 80.0, MouseButton::Left),
        down(400.0, 400.0, MouseButton::Right),
        mv(400.0, 360.0),
        mv(400.0, 400.0),
        up(400.0, 400.0, MouseButton::Right),
    ]
}

/// Feed `events` through a fresh engine built from `config`.
pub fn replay(config: EngineConfig, events: &[PointerEvent]) -> AppResult<Report> {
    let mut engine = Engine::new(config)?;

    let drawing_events = Rc::new(RefCell::new(Vec::new()));
    let gesture_events = Rc::new(RefCell::new(Vec::new()));
    let _drawing_sub = {
        let seen = Rc::clone(&drawing_events);
        engine.events().subscribe(move |e: &DrawingEvent| {
            log::debug!("drawing: {e:?}");
            seen.borrow_mut().push(e.clone());
        })
    };
    let _gesture_sub = {
        let seen = Rc::clone(&gesture_events);
        engine.gesture_events().subscribe(move |e: &GestureEvent| {
            log::info!("gesture: {e:?}");
            seen.borrow_mut().push(e.clone());
        })
    };

    engine.start()?;
    for event in events {
        log::trace!("pointer: {event:?}");
        engine.handle_pointer_event(event);
    }
    engine.stop();

    let mut sink = RecordingSink::new();
    engine.draw(&mut sink);
    let (shape_count, extent) = {
        let drawing = engine.drawing();
        (drawing.canvas().len(), drawing.canvas().bounds())
    };

    Ok(Report {
        drawing_events: drawing_events.take(),
        gesture_events: gesture_events.take(),
        shape_count,
        extent,
        commands: sink.commands().to_vec(),
    })
}
