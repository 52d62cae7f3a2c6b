//! Wiring of pointer input, drawing manager and gesture recognizer.

use crate::config::{ConfigError, EngineConfig};
use crate::drag::{DragPhase, DragPipeline};
use crate::draw::DrawSink;
use crate::gesture::{GestureError, GestureEvent, MouseGesture};
use crate::input::{MouseButton, PointerEvent};
use crate::manager::{DrawingEvent, DrawingManager};
use crate::source::PointerSource;
use crate::stream::{EventStream, StreamError, Subject, SubscriptionSet};
use kurbo::Point;
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use thiserror::Error;

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Gesture error: {0}")]
    Gesture(#[from] GestureError),
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Interactive drawing engine.
///
/// The host feeds pointer events in and draws through [`Engine::draw`];
/// everything in between runs synchronously on the calling thread.
pub struct Engine {
    config: EngineConfig,
    source: PointerSource,
    drawing: Rc<RefCell<DrawingManager>>,
    gestures: MouseGesture,
    bus: Subject<DrawingEvent>,
    subscriptions: SubscriptionSet,
}

impl Engine {
    /// Build an engine and register the configured gesture commands.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let drawing = Rc::new(RefCell::new(DrawingManager::new(config.pen(config.default_pen))));
        let mut engine = Self {
            config,
            source: PointerSource::new(),
            drawing,
            gestures: MouseGesture::new(),
            bus: Subject::new(),
            subscriptions: SubscriptionSet::new(),
        };

        let commands: Vec<_> = engine
            .config
            .gestures
            .iter()
            .map(|(pattern, command)| (pattern.clone(), command.clone()))
            .collect();
        for (pattern, command) in commands {
            let config = engine.config.clone();
            engine.add_gesture(&pattern, move |manager| command.apply(manager, &config))?;
        }
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register an extra gesture command. Fails while the engine is running.
    pub fn add_gesture(
        &mut self,
        pattern: &str,
        mut action: impl FnMut(&mut DrawingManager) + 'static,
    ) -> EngineResult<()> {
        let drawing = Rc::clone(&self.drawing);
        let bus = self.bus.clone();
        self.gestures
            .add(pattern, move || update(&drawing, &bus, |manager| action(manager)))?;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Attach to the pointer source. Does nothing if already running.
    pub fn start(&mut self) -> EngineResult<()> {
        if self.is_running() {
            return Ok(());
        }

        let hover = {
            let drawing = Rc::clone(&self.drawing);
            let bus = self.bus.clone();
            self.source
                .mouse_moves()
                .filter(|e| e.held.is_empty())
                .subscribe(move |e| update(&drawing, &bus, |m| {
                    m.hover(e.position);
                }))
        };

        let pipeline = DragPipeline::new(&self.source, self.config.drag_button);
        let cycles = {
            let drawing = Rc::clone(&self.drawing);
            let bus = self.bus.clone();
            pipeline.cycles().subscribe(move |phase| {
                update(&drawing, &bus, |m| match phase {
                    DragPhase::Started(down) => m.press(down.position),
                    DragPhase::Moved(event) => m.drag(event),
                    DragPhase::Ended(_) => m.release(),
                })
            })
        };

        self.gestures.run(
            &self.source,
            self.config.gesture_button,
            self.config.gesture_interval,
        )?;

        self.subscriptions.add(hover);
        self.subscriptions.add(cycles);
        log::info!(
            "engine started: drawing on {:?}, gestures on {:?}",
            self.config.drag_button,
            self.config.gesture_button
        );
        Ok(())
    }

    /// Detach from the pointer source. Safe to call repeatedly or before start.
    pub fn stop(&mut self) {
        if self.is_running() {
            log::info!("engine stopped");
        }
        self.subscriptions.clear();
        self.gestures.stop();
    }

    /// Feed one host pointer event.
    pub fn handle_pointer_event(&self, event: &PointerEvent) {
        self.source.dispatch(event);
    }

    pub fn pointer_down(&self, position: Point, button: MouseButton) {
        self.handle_pointer_event(&PointerEvent::Down { position, button });
    }

    pub fn pointer_move(&self, position: Point) {
        self.handle_pointer_event(&PointerEvent::Move { position });
    }

    pub fn pointer_up(&self, position: Point, button: MouseButton) {
        self.handle_pointer_event(&PointerEvent::Up { position, button });
    }

    /// Pointer input cannot be rewound.
    pub fn reset(&self) -> EngineResult<()> {
        self.source.reset()?;
        Ok(())
    }

    /// Issue draw calls for every shape, then the default tool.
    pub fn draw(&self, sink: &mut dyn DrawSink) {
        match self.drawing.try_borrow() {
            Ok(drawing) => drawing.draw(sink),
            Err(_) => log::error!("draw requested while the drawing is being updated"),
        }
    }

    /// Drawing notifications, delivered after each update completes.
    pub fn events(&self) -> EventStream<DrawingEvent> {
        self.bus.stream()
    }

    /// Gesture notifications.
    pub fn gesture_events(&self) -> EventStream<GestureEvent> {
        self.gestures.events()
    }

    pub fn drawing(&self) -> Ref<'_, DrawingManager> {
        self.drawing.borrow()
    }

    /// Shared handle to the drawing, for observers that outlive a borrow of the engine.
    pub fn drawing_handle(&self) -> Rc<RefCell<DrawingManager>> {
        Rc::clone(&self.drawing)
    }

    /// Mutate the drawing directly and publish the resulting notifications.
    pub fn update(&self, f: impl FnOnce(&mut DrawingManager)) {
        update(&self.drawing, &self.bus, f);
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run `f` on the drawing, then publish its notifications once the borrow has ended.
fn update(
    drawing: &RefCell<DrawingManager>,
    bus: &Subject<DrawingEvent>,
    f: impl FnOnce(&mut DrawingManager),
) {
    let events = match drawing.try_borrow_mut() {
        Ok(mut manager) => {
            f(&mut manager);
            manager.take_events()
        }
        Err(_) => {
            log::error!("drawing is already borrowed; dropping update");
            return;
        }
    };
    for event in &events {
        bus.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::RecordingSink;
    use crate::shapes::{Draggable, Pen, PenKind, Rgba8, Shape};
    use kurbo::Rect;
    use peniko::Color;
    use std::cell::Cell;

    fn started() -> Engine {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.start().unwrap();
        engine
    }

    fn stroke(engine: &Engine, button: MouseButton, points: &[(f64, f64)]) {
        let (x, y) = points[0];
        engine.pointer_move(Point::new(x, y));
        engine.pointer_down(Point::new(x, y), button);
        for &(x, y) in &points[1..] {
            engine.pointer_move(Point::new(x, y));
        }
        let (x, y) = points[points.len() - 1];
        engine.pointer_up(Point::new(x, y), button);
    }

    fn record(engine: &Engine) -> (Rc<RefCell<Vec<DrawingEvent>>>, crate::stream::Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = engine.events().subscribe(move |e| sink.borrow_mut().push(e.clone()));
        (log, sub)
    }

    #[test]
    fn test_left_drag_draws_rectangle() {
        let engine = started();
        let (log, _sub) = record(&engine);

        stroke(&engine, MouseButton::Left, &[(10.0, 10.0), (40.0, 30.0), (110.0, 90.0)]);

        let drawing = engine.drawing();
        assert_eq!(drawing.canvas().len(), 1);
        let shape = drawing.canvas().shapes_ordered().next().unwrap();
        assert_eq!(shape.bounds(), Rect::new(10.0, 10.0, 110.0, 90.0));
        assert_eq!(Rgba8::from(shape.color()), Rgba8::BLUE);
        assert!(log.borrow().contains(&DrawingEvent::ShapeAdded(shape.id())));
    }

    #[test]
    fn test_clear_gesture() {
        let engine = started();
        engine.update(|m| {
            m.add_shape(Shape::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK));
        });
        let (log, _sub) = record(&engine);

        stroke(
            &engine,
            MouseButton::Right,
            &[(200.0, 200.0), (240.0, 200.0), (200.0, 200.0), (240.0, 200.0)],
        );

        assert!(engine.drawing().canvas().is_empty());
        assert!(log.borrow().contains(&DrawingEvent::Cleared));
    }

    #[test]
    fn test_up_down_gesture_recolors_pen() {
        let engine = started();
        let executed = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let executed = Rc::clone(&executed);
            engine.gesture_events().subscribe(move |e| {
                if let GestureEvent::CommandExecuted(p) = e {
                    executed.borrow_mut().push(p.clone());
                }
            })
        };

        stroke(
            &engine,
            MouseButton::Right,
            &[(200.0, 200.0), (200.0, 160.0), (200.0, 120.0), (200.0, 160.0)],
        );

        assert_eq!(*executed.borrow(), vec!["↑↓".to_string()]);
        assert_eq!(Rgba8::from(engine.drawing().default_tool().color()), Rgba8::RED);
        // The gesture did not draw anything.
        assert!(engine.drawing().canvas().is_empty());
    }

    #[test]
    fn test_observers_can_read_drawing() {
        let engine = started();
        let handle = engine.drawing_handle();
        let seen = Rc::new(Cell::new(0));
        let _sub = {
            let seen = Rc::clone(&seen);
            engine.events().subscribe(move |e| {
                if let DrawingEvent::ShapeAdded(_) = e {
                    seen.set(handle.borrow().canvas().len());
                }
            })
        };

        stroke(&engine, MouseButton::Left, &[(0.0, 0.0), (30.0, 30.0)]);
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn test_move_existing_shape() {
        let engine = started();
        stroke(&engine, MouseButton::Left, &[(0.0, 0.0), (100.0, 100.0)]);
        stroke(&engine, MouseButton::Left, &[(50.0, 50.0), (70.0, 60.0)]);

        let drawing = engine.drawing();
        assert_eq!(drawing.canvas().len(), 1);
        let shape = drawing.canvas().shapes_ordered().next().unwrap();
        assert_eq!(shape.bounds(), Rect::new(20.0, 10.0, 120.0, 110.0));
    }

    #[test]
    fn test_overlapping_press_keeps_first_target() {
        let engine = started();
        let id = {
            let mut id = None;
            engine.update(|m| {
                id = Some(m.add_shape(Shape::rectangle(Rect::new(100.0, 100.0, 200.0, 200.0), Color::BLACK)));
            });
            id.unwrap()
        };

        engine.pointer_down(Point::new(0.0, 0.0), MouseButton::Left);
        engine.pointer_move(Point::new(20.0, 20.0));
        engine.pointer_down(Point::new(150.0, 150.0), MouseButton::Left);
        engine.pointer_move(Point::new(160.0, 160.0));
        engine.pointer_up(Point::new(160.0, 160.0), MouseButton::Left);

        let drawing = engine.drawing();
        assert_eq!(
            drawing.shape(id).unwrap().bounds(),
            Rect::new(100.0, 100.0, 200.0, 200.0)
        );
        assert_eq!(drawing.canvas().len(), 2);
        let added = drawing.canvas().shapes_ordered().last().unwrap();
        assert_eq!(added.bounds(), Rect::new(0.0, 0.0, 160.0, 160.0));
        assert!(!drawing.default_tool().is_dragging());
    }

    #[test]
    fn test_start_twice_and_stop_twice() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.stop();
        engine.start().unwrap();
        engine.start().unwrap();
        assert!(engine.is_running());

        engine.stop();
        engine.stop();
        assert!(!engine.is_running());

        stroke(&engine, MouseButton::Left, &[(0.0, 0.0), (100.0, 100.0)]);
        assert!(engine.drawing().canvas().is_empty());
    }

    #[test]
    fn test_custom_gesture_and_lock() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine
            .add_gesture("↓", |m| m.set_default_tool(Pen::ellipse(Color::BLACK)))
            .unwrap();
        assert!(matches!(
            engine.add_gesture("↓", |_| {}),
            Err(EngineError::Gesture(GestureError::DuplicatePattern(_)))
        ));

        engine.start().unwrap();
        assert!(matches!(
            engine.add_gesture("←", |_| {}),
            Err(EngineError::Gesture(GestureError::TableLocked))
        ));

        stroke(&engine, MouseButton::Right, &[(0.0, 0.0), (0.0, 50.0)]);
        assert_eq!(engine.drawing().default_tool().kind(), PenKind::Ellipse);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            gesture_button: MouseButton::Left,
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::new(config),
            Err(EngineError::Config(ConfigError::ButtonConflict(_)))
        ));
    }

    #[test]
    fn test_reset_is_rejected() {
        let engine = started();
        assert!(matches!(engine.reset(), Err(EngineError::Stream(StreamError::ForwardOnly))));
    }

    #[test]
    fn test_draw_during_drag_shows_dashed_rubber_band() {
        let engine = started();
        engine.pointer_down(Point::new(0.0, 0.0), MouseButton::Left);
        engine.pointer_move(Point::new(20.0, 20.0));

        let mut sink = RecordingSink::new();
        engine.draw(&mut sink);
        assert_eq!(sink.len(), 1);
        assert!(sink.commands()[0].is_dashed());

        engine.pointer_up(Point::new(20.0, 20.0), MouseButton::Left);
        sink.clear();
        engine.draw(&mut sink);
        // New shape is selected: outline plus eight handles.
        assert_eq!(sink.len(), 1 + 8 * 2);
    }
}
