//! Popup label state machine. Hiding is deadline-based: leaving the popup's
//! screen rectangle arms a deadline 200 ms out, re-entering (or picking a new
//! marker) disarms it, and the frame loop polls for expiry. The reveal runs a
//! fixed 250 ms grow transition.

use std::time::{Duration, Instant};

pub const HIDE_DELAY: Duration = Duration::from_millis(200);
pub const GROW_DURATION: Duration = Duration::from_millis(250);

#[derive(Debug, Default)]
pub struct PopupState {
    active: Option<String>,
    visible: bool,
    shown_at: Option<Instant>,
    hide_deadline: Option<Instant>,
}

impl PopupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display the popup for a marker. Restarts the grow transition and
    /// cancels any pending hide.
    pub fn show(&mut self, marker_id: &str, now: Instant) {
        self.active = Some(marker_id.to_string());
        self.visible = true;
        self.shown_at = Some(now);
        self.hide_deadline = None;
    }

    /// Immediate hide, bypassing the deadline (close-button path).
    pub fn close(&mut self) {
        self.visible = false;
        self.hide_deadline = None;
    }

    /// Track pointer movement relative to the popup's screen rectangle.
    /// Outside arms the deferred hide; inside cancels it.
    pub fn pointer_moved(&mut self, inside_popup: bool, now: Instant) {
        if !self.visible {
            return;
        }
        if inside_popup {
            self.hide_deadline = None;
        } else if self.hide_deadline.is_none() {
            self.hide_deadline = Some(now + HIDE_DELAY);
        }
    }

    /// Apply an expired hide deadline. Returns true when visibility changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.hide_deadline {
            Some(deadline) if self.visible && now >= deadline => {
                self.visible = false;
                self.hide_deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Progress of the reveal transition in [0, 1].
    pub fn grow_progress(&self, now: Instant) -> f32 {
        match self.shown_at {
            Some(shown_at) => {
                let elapsed = now.saturating_duration_since(shown_at);
                (elapsed.as_secs_f32() / GROW_DURATION.as_secs_f32()).min(1.0)
            }
            None => 0.0,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }
}

#[cfg(test)]
mod popup_tests {
    use super::*;

    #[test]
    fn show_makes_the_popup_visible_with_fresh_transition() {
        let now = Instant::now();
        let mut popup = PopupState::new();
        popup.show("Venezuela", now);

        assert!(popup.visible());
        assert_eq!(popup.active_id(), Some("Venezuela"));
        assert_eq!(popup.grow_progress(now), 0.0);
        assert_eq!(popup.grow_progress(now + GROW_DURATION), 1.0);
        assert_eq!(popup.grow_progress(now + GROW_DURATION * 4), 1.0);
    }

    #[test]
    fn leaving_the_popup_hides_it_after_the_delay() {
        let now = Instant::now();
        let mut popup = PopupState::new();
        popup.show("Mexico", now);

        popup.pointer_moved(false, now);
        assert!(!popup.poll(now + HIDE_DELAY / 2), "too early to hide");
        assert!(popup.visible());

        assert!(popup.poll(now + HIDE_DELAY), "deadline reached");
        assert!(!popup.visible());
    }

    #[test]
    fn re_entering_before_the_deadline_cancels_the_hide() {
        let now = Instant::now();
        let mut popup = PopupState::new();
        popup.show("Mexico", now);

        popup.pointer_moved(false, now);
        popup.pointer_moved(true, now + HIDE_DELAY / 2);

        assert!(!popup.poll(now + HIDE_DELAY * 2));
        assert!(popup.visible(), "re-entry should keep the popup visible");
    }

    #[test]
    fn leaving_again_rearms_from_the_new_departure_time() {
        let now = Instant::now();
        let mut popup = PopupState::new();
        popup.show("Mexico", now);

        popup.pointer_moved(false, now);
        popup.pointer_moved(true, now + Duration::from_millis(100));
        popup.pointer_moved(false, now + Duration::from_millis(150));

        // Old deadline (now + 200ms) must not apply.
        assert!(!popup.poll(now + Duration::from_millis(200)));
        assert!(popup.poll(now + Duration::from_millis(350)));
    }

    #[test]
    fn a_new_pick_cancels_the_pending_hide() {
        let now = Instant::now();
        let mut popup = PopupState::new();
        popup.show("Mexico", now);
        popup.pointer_moved(false, now);

        popup.show("Venezuela", now + Duration::from_millis(100));
        assert!(!popup.poll(now + HIDE_DELAY * 2));
        assert!(popup.visible());
        assert_eq!(popup.active_id(), Some("Venezuela"));
    }

    #[test]
    fn close_hides_immediately_and_disarms_the_timer() {
        let now = Instant::now();
        let mut popup = PopupState::new();
        popup.show("Mexico", now);
        popup.pointer_moved(false, now);

        popup.close();
        assert!(!popup.visible());
        assert!(!popup.poll(now + HIDE_DELAY * 2));
    }

    #[test]
    fn pointer_moves_while_hidden_do_not_arm_a_deadline() {
        let now = Instant::now();
        let mut popup = PopupState::new();
        popup.pointer_moved(false, now);
        assert!(!popup.poll(now + HIDE_DELAY * 2));
        assert!(!popup.visible());
    }
}
