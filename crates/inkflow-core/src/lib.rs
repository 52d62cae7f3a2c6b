//! inkflow core library
//!
//! Reactive pointer pipeline, mouse gestures and shape manipulation for an
//! interactive vector drawing surface. Rendering and windowing are left to the host.

pub mod canvas;
pub mod composite;
pub mod config;
pub mod drag;
pub mod draw;
pub mod engine;
pub mod geometry;
pub mod gesture;
pub mod input;
pub mod manager;
pub mod shapes;
pub mod source;
pub mod stream;

pub use canvas::Canvas;
pub use composite::CompositeDraggable;
pub use config::{ConfigError, ConfigResult, EngineConfig, GestureBindings, GestureCommand};
pub use drag::{DragEvent, DragPhase, DragPipeline};
pub use draw::{DrawCommand, DrawSink, RecordingSink};
pub use engine::{Engine, EngineError, EngineResult};
pub use geometry::{raw_frame, RectExt};
pub use gesture::{Direction, GestureError, GestureEvent, GestureRecognizer, GestureResult, GestureTable, MouseGesture};
pub use input::{ButtonSet, MouseButton, MouseEvent, PointerEvent};
pub use manager::{ActiveTarget, DrawingEvent, DrawingManager};
pub use shapes::{
    CursorIcon, Draggable, Dropped, HandleAlignment, Hit, Pen, PenKind, ResizeHandle, Rgba8, Shape, ShapeId,
    ShapeKind,
};
pub use source::PointerSource;
pub use stream::{EventStream, StreamError, StreamResult, Subject, Subscription, SubscriptionSet};
