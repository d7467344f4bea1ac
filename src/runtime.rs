//! Tokio driver for a viewport
//!
//! The driver owns the [`Viewport`] and runs it on a single task: input
//! events arrive over an mpsc channel, a frame interval advances the clock
//! (firing timers and applying fetch completions), and every pass publishes
//! the resulting [`ViewportState`] on a watch channel.

use crate::core::viewport::{Viewport, ViewportState};
use crate::input::events::ViewerEvent;
use crate::rendering::RenderCollaborator;
use crate::tiles::loader::FetchCollaborator;
use crate::{Error, Result};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

/// Capacity of the event queue between the host and the driver.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Host side of a running [`ViewportDriver`].
#[derive(Debug, Clone)]
pub struct DriverHandle {
    events: mpsc::Sender<ViewerEvent>,
    state: watch::Receiver<ViewportState>,
}

impl DriverHandle {
    pub async fn send(&self, event: ViewerEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| Error::Runtime("viewport driver stopped".into()))
    }

    /// Queue an event without waiting; fails when the queue is full or the
    /// driver has stopped.
    pub fn try_send(&self, event: ViewerEvent) -> Result<()> {
        self.events
            .try_send(event)
            .map_err(|e| Error::Runtime(format!("event not queued: {}", e)))
    }

    /// Latest published state
    pub fn state(&self) -> ViewportState {
        *self.state.borrow()
    }

    /// A receiver that is notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ViewportState> {
        self.state.clone()
    }
}

pub struct ViewportDriver<F: FetchCollaborator> {
    viewport: Viewport<F>,
    events: mpsc::Receiver<ViewerEvent>,
    state: watch::Sender<ViewportState>,
}

impl<F: FetchCollaborator> ViewportDriver<F> {
    pub fn new(viewport: Viewport<F>) -> (Self, DriverHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (state_tx, state_rx) = watch::channel(viewport.state());
        let driver = Self {
            viewport,
            events: event_rx,
            state: state_tx,
        };
        let handle = DriverHandle {
            events: event_tx,
            state: state_rx,
        };
        (driver, handle)
    }

    /// Run until every [`DriverHandle`] is dropped, then hand the viewport back.
    pub async fn run(self) -> Viewport<F> {
        self.run_inner(None::<&mut NoRender>).await
    }

    /// Like [`run`](Self::run), drawing a frame on every pass.
    pub async fn run_with_renderer<R: RenderCollaborator>(self, renderer: &mut R) -> Viewport<F> {
        self.run_inner(Some(renderer)).await
    }

    async fn run_inner<R: RenderCollaborator>(mut self, mut renderer: Option<&mut R>) -> Viewport<F> {
        self.viewport.reset_clock(Instant::now().into_std());

        let mut interval = tokio::time::interval(self.viewport.options().frame_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::debug!("viewport driver started, frame interval {:?}", interval.period());

        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => {
                        log::debug!("event {:?}", event);
                        self.viewport.handle_event(event, Instant::now().into_std());
                    }
                    None => break,
                },
                _ = interval.tick() => {}
            }

            let report = self.viewport.tick(Instant::now().into_std());
            if report.refreshed || report.settled.is_some() {
                log::debug!("tick {:?}", report);
            }
            if let Some(renderer) = renderer.as_mut() {
                self.viewport.render(&mut **renderer);
            }
            self.state.send_if_modified(|state| {
                let next = self.viewport.state();
                let changed = *state != next;
                *state = next;
                changed
            });
        }

        log::debug!("viewport driver stopped");
        self.viewport
    }
}

struct NoRender;

impl RenderCollaborator for NoRender {
    fn begin_frame(&mut self, _state: &ViewportState) {}

    fn draw_tile(&mut self, _level: i32, _priority: i32, _handle: &crate::layers::types::TileHandle, _x: i64, _y: i64) {}
}
