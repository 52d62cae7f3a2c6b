//! Drag pipeline: turns down/move/up into per-cycle drag events.

use crate::input::{MouseButton, MouseEvent};
use crate::source::PointerSource;
use crate::stream::{EventStream, Observer, StreamError, StreamResult, Subscription};
use kurbo::{Point, Vec2};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// One step of a drag.
///
/// `last` is the location of the previous step in the same cycle, or `start`
/// for the first step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEvent {
    pub start: Point,
    pub last: Point,
    pub current: Point,
}

impl DragEvent {
    pub fn new(start: Point, last: Point, current: Point) -> Self {
        Self {
            start,
            last,
            current,
        }
    }

    /// Movement since the previous step.
    pub fn delta(&self) -> Vec2 {
        self.current - self.last
    }

    /// The same event shifted by `offset`.
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            start: self.start + offset,
            last: self.last + offset,
            current: self.current + offset,
        }
    }
}

/// Stage of a drag cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragPhase {
    /// The press that opened the cycle.
    Started(MouseEvent),
    Moved(DragEvent),
    /// The release that closed the cycle.
    Ended(MouseEvent),
}

/// Drag streams for a single mouse button.
#[derive(Clone)]
pub struct DragPipeline {
    button: MouseButton,
    presses: EventStream<MouseEvent>,
    moves: EventStream<MouseEvent>,
    releases: EventStream<MouseEvent>,
}

impl DragPipeline {
    pub fn new(source: &PointerSource, button: MouseButton) -> Self {
        Self {
            button,
            presses: source.mouse_downs().filter(move |e| e.is_button(button)),
            moves: source.mouse_moves(),
            releases: source.mouse_ups().filter(move |e| e.is_button(button)),
        }
    }

    pub fn button(&self) -> MouseButton {
        self.button
    }

    /// Downs of this pipeline's button.
    pub fn presses(&self) -> EventStream<MouseEvent> {
        self.presses.clone()
    }

    /// Ups of this pipeline's button.
    pub fn releases(&self) -> EventStream<MouseEvent> {
        self.releases.clone()
    }

    /// Drag events for every down/up cycle.
    ///
    /// Each press opens a cycle that forwards every move until the matching
    /// release. A press that arrives while a cycle is open is ignored.
    pub fn drags(&self) -> EventStream<DragEvent> {
        self.cycles().filter_map(|phase| match phase {
            DragPhase::Moved(event) => Some(*event),
            DragPhase::Started(_) | DragPhase::Ended(_) => None,
        })
    }

    /// Full lifecycle of every down/up cycle.
    ///
    /// `Started` is emitted only for the press that opens a cycle and `Ended`
    /// only for the release that closes it, so a consumer never sees a press
    /// or release outside a cycle.
    pub fn cycles(&self) -> EventStream<DragPhase> {
        let presses = self.presses.clone();
        let moves = self.moves.clone();
        let releases = self.releases.clone();

        EventStream::new(move |observer: Observer<DragPhase>| {
            let observer = Rc::new(RefCell::new(observer));
            let active = Rc::new(Cell::new(false));
            let cycle: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

            let press_subscription = {
                let moves = moves.clone();
                let releases = releases.clone();
                let active = Rc::clone(&active);
                let cycle = Rc::clone(&cycle);
                presses.subscribe(move |down| {
                    if active.get() {
                        log::debug!("ignoring press while a drag cycle is open");
                        return;
                    }
                    active.set(true);
                    let start = down.position;
                    log::trace!("drag cycle started at {start:?}");
                    deliver(&observer, &DragPhase::Started(*down));

                    let closed = {
                        let active = Rc::clone(&active);
                        let observer = Rc::clone(&observer);
                        releases.inspect(move |up| {
                            active.set(false);
                            log::trace!("drag cycle ended at {:?}", up.position);
                            deliver(&observer, &DragPhase::Ended(*up));
                        })
                    };
                    let observer = Rc::clone(&observer);
                    let subscription = moves
                        .scan(start, move |last, moved| {
                            let event = DragEvent::new(start, *last, moved.position);
                            *last = moved.position;
                            event
                        })
                        .take_until(&closed)
                        .subscribe(move |event| deliver(&observer, &DragPhase::Moved(*event)));

                    let previous = cycle.borrow_mut().replace(subscription);
                    drop(previous);
                })
            };

            Subscription::new(move || {
                drop(press_subscription);
                let open = cycle.borrow_mut().take();
                drop(open);
                active.set(false);
            })
        })
    }

    /// Pointer input cannot be rewound.
    pub fn reset(&self) -> StreamResult<()> {
        Err(StreamError::ForwardOnly)
    }
}

fn deliver(observer: &RefCell<Observer<DragPhase>>, phase: &DragPhase) {
    match observer.try_borrow_mut() {
        Ok(mut observer) => (&mut *observer)(phase),
        Err(_) => log::warn!("dropping re-entrant drag notification"),
    }
}
