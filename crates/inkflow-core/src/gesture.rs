//! Directional mouse gestures.
//!
//! While the gesture button is held, pointer motion is quantized into compass
//! directions and accumulated into an arrow string such as `"→←→"`. On release
//! the string is looked up in a [`GestureTable`] and the matching action runs.

use crate::drag::{DragEvent, DragPipeline};
use crate::input::MouseButton;
use crate::source::PointerSource;
use crate::stream::{EventStream, Subject, SubscriptionSet};
use kurbo::{Point, Vec2};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Gesture errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GestureError {
    #[error("Gesture pattern is empty")]
    EmptyPattern,
    #[error("Gesture pattern {0:?} contains characters other than ↑ ↓ ← →")]
    InvalidPattern(String),
    #[error("Gesture pattern {0:?} is already registered")]
    DuplicatePattern(String),
    #[error("Gesture interval must be positive, got {0}")]
    InvalidInterval(f64),
    #[error("Gesture table cannot change while recognition is running")]
    TableLocked,
}

/// Result type for gesture operations.
pub type GestureResult<T> = Result<T, GestureError>;

/// Compass direction of one gesture stroke. Screen coordinates, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn arrow(self) -> char {
        match self {
            Direction::Up => '↑',
            Direction::Down => '↓',
            Direction::Left => '←',
            Direction::Right => '→',
        }
    }

    pub fn from_arrow(c: char) -> Option<Self> {
        match c {
            '↑' => Some(Direction::Up),
            '↓' => Some(Direction::Down),
            '←' => Some(Direction::Left),
            '→' => Some(Direction::Right),
            _ => None,
        }
    }

    /// Quantize a displacement into a direction.
    ///
    /// Returns `None` until the dominant axis has moved at least `interval`.
    /// Ties go to the vertical axis.
    pub fn quantize(delta: Vec2, interval: f64) -> Option<Self> {
        let px = delta.x.abs();
        let py = delta.y.abs();
        if px > py {
            if px < interval {
                return None;
            }
            Some(if delta.x > 0.0 { Direction::Right } else { Direction::Left })
        } else {
            if py < interval {
                return None;
            }
            Some(if delta.y > 0.0 { Direction::Down } else { Direction::Up })
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.arrow())
    }
}

/// Parse an arrow string into directions.
pub fn parse_pattern(pattern: &str) -> GestureResult<Vec<Direction>> {
    if pattern.is_empty() {
        return Err(GestureError::EmptyPattern);
    }
    pattern
        .chars()
        .map(|c| Direction::from_arrow(c).ok_or_else(|| GestureError::InvalidPattern(pattern.to_string())))
        .collect()
}

type Action = Rc<RefCell<dyn FnMut()>>;

/// Map from arrow strings to actions.
#[derive(Default)]
pub struct GestureTable {
    commands: HashMap<String, Action>,
    max_len: usize,
}

impl GestureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` under `pattern`. Patterns are never overwritten.
    pub fn insert(&mut self, pattern: &str, action: impl FnMut() + 'static) -> GestureResult<()> {
        let directions = parse_pattern(pattern)?;
        if self.commands.contains_key(pattern) {
            return Err(GestureError::DuplicatePattern(pattern.to_string()));
        }
        self.max_len = self.max_len.max(directions.len());
        self.commands.insert(pattern.to_string(), Rc::new(RefCell::new(action)));
        Ok(())
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.commands.contains_key(pattern)
    }

    /// Length, in directions, of the longest registered pattern.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Handle to the action registered under `pattern`.
    pub fn action(&self, pattern: &str) -> Option<Action> {
        self.commands.get(pattern).cloned()
    }

    /// Run the action for `pattern`, if any. Returns whether one ran.
    pub fn invoke(&self, pattern: &str) -> bool {
        self.action(pattern).is_some_and(|action| run_action(pattern, &action))
    }
}

/// Call `action` unless it is already running further up the stack.
fn run_action(pattern: &str, action: &RefCell<dyn FnMut()>) -> bool {
    match action.try_borrow_mut() {
        Ok(mut action) => {
            (&mut *action)();
            true
        }
        Err(_) => {
            log::warn!("gesture {pattern} re-entered its own action; skipped");
            false
        }
    }
}

impl fmt::Debug for GestureTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut patterns: Vec<&String> = self.commands.keys().collect();
        patterns.sort();
        f.debug_struct("GestureTable")
            .field("patterns", &patterns)
            .field("max_len", &self.max_len)
            .finish()
    }
}

/// Recognizer phase within one press/release cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Accumulating,
}

/// Pattern accumulator for a single gesture cycle.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    interval: f64,
    anchor: Option<Point>,
    directions: Vec<Direction>,
}

impl GestureRecognizer {
    pub fn new(interval: f64) -> GestureResult<Self> {
        if interval.is_nan() || interval <= 0.0 {
            return Err(GestureError::InvalidInterval(interval));
        }
        Ok(Self {
            interval,
            anchor: None,
            directions: Vec::new(),
        })
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn phase(&self) -> GesturePhase {
        if self.anchor.is_some() {
            GesturePhase::Accumulating
        } else {
            GesturePhase::Idle
        }
    }

    /// The arrow string accumulated so far.
    pub fn pattern(&self) -> String {
        self.directions.iter().map(|d| d.arrow()).collect()
    }

    /// Feed one drag step. Returns the running pattern when a direction was appended.
    ///
    /// The anchor moves to the current location whenever a direction is
    /// recognized, even if it repeats the previous one or the pattern is full.
    pub fn feed(&mut self, event: &DragEvent, max_len: usize) -> Option<String> {
        let anchor = *self.anchor.get_or_insert(event.start);
        let direction = Direction::quantize(event.current - anchor, self.interval)?;
        self.anchor = Some(event.current);

        if self.directions.len() >= max_len || self.directions.last() == Some(&direction) {
            return None;
        }
        self.directions.push(direction);
        Some(self.pattern())
    }

    /// End the cycle and return the accumulated pattern, resetting to idle.
    pub fn finish(&mut self) -> String {
        let pattern = self.pattern();
        self.anchor = None;
        self.directions.clear();
        pattern
    }
}

/// Notification published by [`MouseGesture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureEvent {
    /// A direction was appended; carries the running pattern.
    DirectionCaptured(String),
    /// A registered action ran; carries its pattern.
    CommandExecuted(String),
}

/// Mouse gesture recognizer bound to a pointer source.
pub struct MouseGesture {
    table: Rc<RefCell<GestureTable>>,
    events: Subject<GestureEvent>,
    subscriptions: SubscriptionSet,
}

impl Default for MouseGesture {
    fn default() -> Self {
        Self::new()
    }
}

impl MouseGesture {
    pub fn new() -> Self {
        Self {
            table: Rc::new(RefCell::new(GestureTable::new())),
            events: Subject::new(),
            subscriptions: SubscriptionSet::new(),
        }
    }

    /// Register a command. Fails while recognition is running.
    pub fn add(&mut self, pattern: &str, action: impl FnMut() + 'static) -> GestureResult<()> {
        if self.is_running() {
            return Err(GestureError::TableLocked);
        }
        self.table.borrow_mut().insert(pattern, action)
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.table.borrow().contains(pattern)
    }

    /// Direction-captured and command-executed notifications.
    pub fn events(&self) -> EventStream<GestureEvent> {
        self.events.stream()
    }

    pub fn is_running(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Start recognizing gestures drawn with `button`.
    ///
    /// Calling this while already running is a no-op.
    pub fn run(&mut self, source: &PointerSource, button: MouseButton, interval: f64) -> GestureResult<()> {
        let recognizer = Rc::new(RefCell::new(GestureRecognizer::new(interval)?));
        if self.is_running() {
            log::debug!("mouse gesture already running");
            return Ok(());
        }
        let pipeline = DragPipeline::new(source, button);

        let on_drag = {
            let recognizer = Rc::clone(&recognizer);
            let table = Rc::clone(&self.table);
            let events = self.events.clone();
            pipeline.drags().subscribe(move |event| {
                let max_len = table.borrow().max_len();
                let captured = recognizer.borrow_mut().feed(event, max_len);
                if let Some(pattern) = captured {
                    log::trace!("gesture direction captured: {pattern}");
                    events.emit(&GestureEvent::DirectionCaptured(pattern));
                }
            })
        };

        let on_release = {
            let table = Rc::clone(&self.table);
            let events = self.events.clone();
            pipeline.releases().subscribe(move |_| {
                let pattern = recognizer.borrow_mut().finish();
                if pattern.is_empty() {
                    return;
                }
                // Look up under a short borrow so the action may use the table.
                let action = table.borrow().action(&pattern);
                let matched = action.is_some_and(|action| run_action(&pattern, &action));
                if matched {
                    log::debug!("gesture command executed: {pattern}");
                    events.emit(&GestureEvent::CommandExecuted(pattern));
                } else {
                    log::debug!("unrecognized gesture {pattern}");
                }
            })
        };

        self.subscriptions.add(on_drag);
        self.subscriptions.add(on_release);
        log::debug!("mouse gesture running on {button:?} with interval {interval}");
        Ok(())
    }

    /// Stop recognizing. Safe to call repeatedly or before [`MouseGesture::run`].
    pub fn stop(&mut self) {
        if self.is_running() {
            log::debug!("mouse gesture stopped");
        }
        self.subscriptions.clear();
    }
}
