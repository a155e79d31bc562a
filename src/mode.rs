use std::time::{Duration, Instant};

/// How long the tree gets to assemble before the blessing is revealed.
pub(crate) const REVEAL_DELAY: Duration = Duration::from_millis(2800);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Input,
    Transition,
    Display,
}

/// A one-shot deadline. It knows nothing about the particles, so the reveal
/// happens on time whether or not the springs have settled.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Timer {
    due: Instant,
}

impl Timer {
    pub(crate) fn after(now: Instant, delay: Duration) -> Self {
        Self { due: now + delay }
    }

    pub(crate) fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }
}

#[derive(Debug)]
pub(crate) struct ModeController {
    mode: Mode,
    loading: bool,
    reveal: Option<Timer>,
}

impl ModeController {
    pub(crate) fn new() -> Self {
        Self {
            mode: Mode::Input,
            loading: false,
            reveal: None,
        }
    }

    pub(crate) fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns false when a request is already out or the form is gone.
    pub(crate) fn begin_loading(&mut self) -> bool {
        if self.loading || self.mode != Mode::Input {
            return false;
        }
        self.loading = true;
        true
    }

    pub(crate) fn begin_transition(&mut self, now: Instant) {
        self.loading = false;
        if self.mode != Mode::Input {
            return;
        }
        self.set(Mode::Transition);
        self.reveal = Some(Timer::after(now, REVEAL_DELAY));
    }

    pub(crate) fn poll(&mut self, now: Instant) -> Mode {
        if let Some(t) = self.reveal {
            if t.is_due(now) {
                self.reveal = None;
                self.set(Mode::Display);
            }
        }
        self.mode
    }

    pub(crate) fn reset(&mut self) {
        self.loading = false;
        self.reveal = None;
        self.set(Mode::Input);
    }

    fn set(&mut self, mode: Mode) {
        if self.mode != mode {
            log::info!("mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_input() {
        let mut c = ModeController::new();
        assert_eq!(c.poll(Instant::now()), Mode::Input);
        assert!(!c.is_loading());
    }

    #[test]
    fn reveal_waits_the_full_delay() {
        let t0 = Instant::now();
        let mut c = ModeController::new();
        assert!(c.begin_loading());
        c.begin_transition(t0);
        assert_eq!(c.mode(), Mode::Transition);
        assert!(!c.is_loading());

        assert_eq!(c.poll(t0), Mode::Transition);
        assert_eq!(c.poll(t0 + Duration::from_millis(2799)), Mode::Transition);
        assert_eq!(c.poll(t0 + REVEAL_DELAY), Mode::Display);
        assert_eq!(c.poll(t0 + Duration::from_secs(60)), Mode::Display);
    }

    #[test]
    fn second_submit_is_ignored_while_loading() {
        let mut c = ModeController::new();
        assert!(c.begin_loading());
        assert!(!c.begin_loading());
    }

    #[test]
    fn late_result_does_not_rearm_the_timer() {
        let t0 = Instant::now();
        let mut c = ModeController::new();
        c.begin_transition(t0);
        c.poll(t0 + REVEAL_DELAY);
        c.begin_transition(t0 + REVEAL_DELAY);
        assert_eq!(c.poll(t0 + REVEAL_DELAY), Mode::Display);
    }

    #[test]
    fn reset_cancels_pending_reveal() {
        let t0 = Instant::now();
        let mut c = ModeController::new();
        c.begin_transition(t0);
        c.reset();
        assert_eq!(c.poll(t0 + REVEAL_DELAY * 2), Mode::Input);
        assert!(c.begin_loading());
    }
}
