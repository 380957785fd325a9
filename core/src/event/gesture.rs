//! Drag/tap session state.
//!
//! Lives only between a pointer-down and the matching pointer-up. The
//! transitions themselves are driven from `Runtime::dispatch`.

use core::fmt;

use super::{DragData, Handler};
use crate::{config::GestureConfig, id::IdPath};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    x: f64,
    y: f64,
    time: f64,
}

/// Listeners armed by the last pointer-down plus the sampling state.
#[derive(Default)]
pub struct DragSession {
    origin: Option<Sample>,
    last: Option<Sample>,
    armed_drag: Vec<(IdPath, Handler)>,
    armed_done: Vec<(IdPath, Handler)>,
}

/// What to deliver once the pointer is released.
pub(crate) struct Release {
    pub drag_done: Vec<(IdPath, Handler)>,
    pub data: DragData,
    pub tap: bool,
}

impl DragSession {
    /// Returns `true` between a pointer-down and the matching pointer-up.
    #[must_use]
    pub const fn is_pressing(&self) -> bool {
        self.origin.is_some()
    }

    /// Number of armed drag listeners.
    #[must_use]
    pub fn armed(&self) -> usize {
        self.armed_drag.len()
    }

    /// Enters the pressing state at the given position.
    pub(crate) fn press(
        &mut self,
        x: f64,
        y: f64,
        time: f64,
        drag: Vec<(IdPath, Handler)>,
        done: Vec<(IdPath, Handler)>,
    ) {
        let sample = Sample { x, y, time };
        self.origin = Some(sample);
        self.last = Some(sample);
        self.armed_drag = drag;
        self.armed_done = done;
    }

    /// Applies the sampling policy to a move. Returns the drag payload and the
    /// listeners to notify, or `None` when the sample is dropped.
    pub(crate) fn sample(
        &mut self,
        x: f64,
        y: f64,
        time: f64,
        config: &GestureConfig,
    ) -> Option<(DragData, Vec<(IdPath, Handler)>)> {
        if self.armed_drag.is_empty() {
            return None;
        }
        let origin = self.origin?;
        let last = self.last.unwrap_or(origin);
        let moved = (x - last.x).hypot(y - last.y);
        let elapsed = time - last.time;
        if moved < config.drag_min_px && elapsed < config.drag_min_ms {
            return None;
        }
        self.last = Some(Sample { x, y, time });
        let data = DragData {
            start_x: origin.x,
            start_y: origin.y,
            x,
            y,
        };
        Some((data, self.armed_drag.clone()))
    }

    /// Leaves the pressing state, clearing everything unconditionally.
    pub(crate) fn release(&mut self, x: f64, y: f64, config: &GestureConfig) -> Option<Release> {
        let origin = self.origin.take();
        self.last = None;
        self.armed_drag.clear();
        let armed_done = core::mem::take(&mut self.armed_done);

        let origin = origin?;
        let displacement = (x - origin.x).hypot(y - origin.y);
        let drag_done = if displacement > config.drag_done_px {
            armed_done
        } else {
            Vec::new()
        };
        Some(Release {
            drag_done,
            data: DragData {
                start_x: origin.x,
                start_y: origin.y,
                x,
                y,
            },
            tap: displacement < config.tap_max_px,
        })
    }
}

impl fmt::Debug for DragSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragSession")
            .field("origin", &self.origin)
            .field("last", &self.last)
            .field(
                "armed_drag",
                &self.armed_drag.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .field(
                "armed_done",
                &self.armed_done.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::handler;

    fn armed() -> Vec<(IdPath, Handler)> {
        vec![(IdPath::root("top"), handler(|_, _| Ok(())))]
    }

    #[test]
    fn small_fast_moves_are_dropped() {
        let config = GestureConfig::default();
        let mut session = DragSession::default();
        session.press(0.0, 0.0, 0.0, armed(), Vec::new());
        assert!(session.sample(1.0, 0.0, 1.0, &config).is_none());
        let (data, targets) = session.sample(20.0, 0.0, 2.0, &config).unwrap();
        assert_eq!(data.delta_x(), 20.0);
        assert_eq!(targets.len(), 1);
        // slow but small still goes through once the time threshold passes
        assert!(session.sample(21.0, 0.0, 2.0 + config.drag_min_ms, &config).is_some());
    }

    #[test]
    fn release_clears_and_classifies() {
        let config = GestureConfig::default();
        let mut session = DragSession::default();
        session.press(10.0, 10.0, 0.0, armed(), armed());
        let release = session.release(11.0, 10.0, &config).unwrap();
        assert!(release.tap);
        assert!(release.drag_done.is_empty());
        assert!(!session.is_pressing());
        assert_eq!(session.armed(), 0);

        session.press(10.0, 10.0, 0.0, armed(), armed());
        let release = session.release(80.0, 10.0, &config).unwrap();
        assert!(!release.tap);
        assert_eq!(release.drag_done.len(), 1);

        assert!(session.release(0.0, 0.0, &config).is_none());
    }
}
