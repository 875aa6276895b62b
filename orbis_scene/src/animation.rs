//! Fly-to camera animation: when a marker is picked, the eye lerps from its
//! current position toward the marker direction scaled to a fixed viewing
//! distance. The orbit target is untouched while the animation runs and is
//! restored exactly once on completion; the restore lives inside the
//! animation value, so replacing a running `FlyTo` with a new one discards
//! the stale restore instead of letting it fire later.

use std::time::{Duration, Instant};

use glam::Vec3;

/// Eye distance from the origin at the end of the animation.
pub const FLY_TO_DISTANCE: f32 = 14.0;
pub const FLY_TO_DURATION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct FlyTo {
    start_position: Vec3,
    end_position: Vec3,
    started_at: Instant,
    restore_target: Vec3,
    restore_taken: bool,
}

impl FlyTo {
    /// Begin an animation toward `marker_position`, scaled out to
    /// [`FLY_TO_DISTANCE`]. `restore_target` is the orbit target to put back
    /// when the animation completes.
    pub fn start(
        start_position: Vec3,
        marker_position: Vec3,
        restore_target: Vec3,
        now: Instant,
    ) -> Self {
        Self {
            start_position,
            end_position: marker_position.normalize() * FLY_TO_DISTANCE,
            started_at: now,
            restore_target,
            restore_taken: false,
        }
    }

    fn progress(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / FLY_TO_DURATION.as_secs_f32()).min(1.0)
    }

    /// Eye position at `now`: linear interpolation from start to the scaled
    /// end position, clamped to the end once the duration elapses.
    pub fn sample(&self, now: Instant) -> Vec3 {
        self.start_position.lerp(self.end_position, self.progress(now))
    }

    pub fn finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Yield the orbit-target restore, exactly once, and only after the
    /// animation finishes. Dropping the `FlyTo` before completion (e.g. when
    /// a second pick supersedes it) drops the pending restore with it.
    pub fn take_restore(&mut self, now: Instant) -> Option<Vec3> {
        if self.restore_taken || !self.finished(now) {
            return None;
        }
        self.restore_taken = true;
        Some(self.restore_target)
    }
}
