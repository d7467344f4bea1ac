//! Mapping of input events onto viewport operations
//!
//! Drags move the view immediately and push the tile refresh back by the
//! debounce delay; releasing the pointer refreshes right away unless the
//! debounced refresh already ran. Zoom gestures go through the centered
//! zoom helpers.
//!
//! Every event carries the instant it happened at. The viewport clock moves
//! to it before the event is applied, so debounce and settle deadlines are
//! measured from the event rather than from the last tick.

use super::events::{EventHandled, ViewerEvent};
use crate::core::viewport::Viewport;
use crate::tiles::loader::FetchCollaborator;
use std::time::Instant;

impl<F: FetchCollaborator> Viewport<F> {
    pub fn handle_event(&mut self, event: ViewerEvent, now: Instant) -> EventHandled {
        self.advance_clock(now);
        match event {
            ViewerEvent::DragStart => EventHandled::Handled,
            ViewerEvent::DragMove { dx, dy } => {
                // content follows the pointer, so the scroll moves against it
                self.scroll_by(-dx, -dy);
                self.schedule_refresh();
                EventHandled::Handled
            }
            ViewerEvent::DragEnd => {
                self.refresh_now();
                EventHandled::Handled
            }
            ViewerEvent::Wheel {
                delta,
                offset_x,
                offset_y,
            } => {
                if delta == 0 {
                    return EventHandled::NotHandled;
                }
                let (scroll_x, scroll_y) = self.scroll();
                self.zoom_center_to(
                    scroll_x.saturating_add(offset_x),
                    scroll_y.saturating_add(offset_y),
                    delta.signum(),
                )
                .into()
            }
            ViewerEvent::DoubleClick { offset_x, offset_y } => {
                let (scroll_x, scroll_y) = self.scroll();
                self.center_and_zoom_in(scroll_x.saturating_add(offset_x), scroll_y.saturating_add(offset_y));
                EventHandled::Handled
            }
            ViewerEvent::Resize { width, height } => {
                self.resize(width, height);
                EventHandled::Handled
            }
            ViewerEvent::ZoomIn => self.zoom_in().into(),
            ViewerEvent::ZoomOut => self.zoom_out().into(),
        }
    }

    /// Apply a batch of events that arrived together at `now`.
    pub fn handle_events<I>(&mut self, events: I, now: Instant) -> usize
    where
        I: IntoIterator<Item = ViewerEvent>,
    {
        events
            .into_iter()
            .filter(|event| self.handle_event(*event, now) == EventHandled::Handled)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ViewportOptions;
    use crate::tiles::loader::QueuedFetcher;
    use crate::tiles::source::TileSource;
    use std::sync::Arc;
    use std::time::Duration;

    fn viewport() -> Viewport<QueuedFetcher> {
        let source = TileSource::builder("/tiles")
            .zoom_range(-1, 2)
            .image_size(4096, 4096)
            .build()
            .unwrap();
        let options = ViewportOptions::default()
            .with_view_size(400, 300)
            .with_initial_center(1000, 1000);
        Viewport::new(Arc::new(source), options, QueuedFetcher::new()).unwrap()
    }

    fn wheel(delta: i32, offset_x: i64, offset_y: i64) -> ViewerEvent {
        ViewerEvent::Wheel {
            delta,
            offset_x,
            offset_y,
        }
    }

    #[test]
    fn test_drag_scrolls_and_debounces() {
        let mut vp = viewport();
        let now = vp.now();
        let start = vp.scroll();
        let passes = vp.refresh_passes();

        vp.handle_event(ViewerEvent::DragStart, now);
        vp.handle_event(ViewerEvent::DragMove { dx: 30, dy: -10 }, now);
        vp.handle_event(ViewerEvent::DragMove { dx: 20, dy: 0 }, now);
        assert_eq!(vp.scroll(), (start.0 - 50, start.1 + 10));
        assert_eq!(vp.refresh_passes(), passes);
        assert!(vp.is_refresh_pending());

        vp.handle_event(ViewerEvent::DragEnd, now);
        assert_eq!(vp.refresh_passes(), passes + 1);
        assert!(!vp.is_refresh_pending());
    }

    #[test]
    fn test_drag_end_after_debounce_does_not_refresh_twice() {
        let mut vp = viewport();
        let t0 = vp.now();
        vp.handle_event(ViewerEvent::DragMove { dx: 300, dy: 0 }, t0);
        assert!(vp.tick(t0 + Duration::from_millis(150)).refreshed);

        let passes = vp.refresh_passes();
        vp.handle_event(ViewerEvent::DragEnd, t0 + Duration::from_millis(160));
        assert_eq!(vp.refresh_passes(), passes);
    }

    #[test]
    fn test_drag_after_idle_debounces_from_event_time() {
        let mut vp = viewport();
        let t0 = vp.now();
        let passes = vp.refresh_passes();

        // nothing ticks for a second before the drag starts
        let start = t0 + Duration::from_secs(1);
        for i in 0..10u64 {
            let at = start + Duration::from_millis(i * 50);
            vp.handle_event(ViewerEvent::DragMove { dx: -10, dy: 0 }, at);
            assert!(!vp.tick(at).refreshed, "refreshed mid-burst at step {}", i);
        }
        assert_eq!(vp.refresh_passes(), passes);

        let report = vp.tick(start + Duration::from_millis(550));
        assert!(report.refreshed);
        assert_eq!(vp.refresh_passes(), passes + 1);
    }

    #[test]
    fn test_zoom_after_idle_settles_from_event_time() {
        let mut vp = viewport();
        let t0 = vp.now();
        let at = t0 + Duration::from_secs(5);

        vp.handle_event(ViewerEvent::ZoomIn, at);
        assert_eq!(vp.tick(at + Duration::from_millis(999)).settled, None);
        assert_eq!(vp.enabled_levels(), vec![0, 1]);
        assert_eq!(vp.tick(at + Duration::from_millis(1000)).settled, Some(0));
    }

    #[test]
    fn test_wheel_zooms_around_pointer() {
        let mut vp = viewport();
        let now = vp.now();
        let (sx, sy) = vp.scroll();

        assert_eq!(vp.handle_event(wheel(120, 10, 20), now), EventHandled::Handled);
        assert_eq!(vp.active_zoom(), 1);
        assert_eq!(vp.center(), ((sx + 10) * 2, (sy + 20) * 2));

        vp.handle_event(wheel(-3, 0, 0), now);
        assert_eq!(vp.active_zoom(), 0);

        assert_eq!(vp.handle_event(wheel(0, 0, 0), now), EventHandled::NotHandled);
    }

    #[test]
    fn test_double_click_centers_and_zooms() {
        let mut vp = viewport();
        let now = vp.now();
        let (sx, sy) = vp.scroll();
        vp.handle_event(
            ViewerEvent::DoubleClick {
                offset_x: 100,
                offset_y: 50,
            },
            now,
        );
        assert_eq!(vp.active_zoom(), 1);
        assert_eq!(vp.center(), ((sx + 100) * 2, (sy + 50) * 2));
    }

    #[test]
    fn test_zoom_buttons_at_bounds() {
        let mut vp = viewport();
        let now = vp.now();
        assert_eq!(vp.handle_event(ViewerEvent::ZoomOut, now), EventHandled::Handled);
        assert_eq!(vp.handle_event(ViewerEvent::ZoomOut, now), EventHandled::NotHandled);
        assert_eq!(vp.active_zoom(), -1);

        let zoom_ins = [ViewerEvent::ZoomIn; 4];
        assert_eq!(vp.handle_events(zoom_ins, now), 3);
        assert_eq!(vp.active_zoom(), 2);
    }

    #[test]
    fn test_resize_event() {
        let mut vp = viewport();
        let now = vp.now();
        vp.handle_event(
            ViewerEvent::Resize {
                width: 801,
                height: 601,
            },
            now,
        );
        assert_eq!(vp.center_offset(), (400, 300));
    }

    #[test]
    fn test_events_never_move_the_clock_back() {
        let mut vp = viewport();
        let later = vp.now() + Duration::from_millis(400);
        vp.tick(later);
        vp.handle_event(ViewerEvent::DragMove { dx: 1, dy: 1 }, later - Duration::from_millis(300));
        assert_eq!(vp.now(), later);
    }
}
