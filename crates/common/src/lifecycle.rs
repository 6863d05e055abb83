//! Progress tracking for one asynchronous operation.
//!
//! Every network-bound step (log in, fetch identity, sign up, key directory
//! calls) owns one [`Lifecycle`]. It is the only thing standing between a
//! double trigger and two overlapping requests for the same resource.
//!
//! # State Machine
//!
//! ```text
//!             start()                 succeed()/fail()
//! ┌──────┐ ───────────> ┌─────────┐ ──────────────────> ┌──────┐
//! │ Idle │              │ Pending │                     │ Idle │  (repeatable)
//! └──────┘ <─ ─ ─ ─ ─ ─ └─────────┘ ──────────────────> ┌────────┐
//!                                                       │ Finish │  (session scoped / one shot)
//!                                                       └────────┘
//! ```
//!
//! Rejected transitions are silent no-ops that report `false`: a second
//! `start()` while pending is dropped, not queued.

use tracing::debug;

/// Where a lifecycle currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadingState {
    /// Nothing in flight; ready to start
    Idle,
    /// A request is in flight
    Pending,
    /// Settled into the terminal variant
    Finish,
}

/// How a lifecycle settles and whether it may start again from `Finish`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restart {
    /// Settles back into `Idle`
    Repeatable,
    /// Settles into `Finish`, may start again from there (log in, fetch current identity)
    SessionScoped,
    /// Settles into `Finish` and stays there
    OneShot,
}

/// One asynchronous operation: state, last result, last error
///
/// `start()` clears the previous outcome. `succeed()`/`fail()` only land while
/// `Pending`, so a late or duplicate settle cannot clobber a newer run.
#[derive(Debug, Clone)]
pub struct Lifecycle<T, E> {
    name: &'static str,
    restart: Restart,
    state: LoadingState,
    result: Option<T>,
    error: Option<E>,
}

impl<T, E> Lifecycle<T, E> {
    pub fn new(name: &'static str, restart: Restart) -> Self {
        Self {
            name,
            restart,
            state: LoadingState::Idle,
            result: None,
            error: None,
        }
    }

    pub fn repeatable(name: &'static str) -> Self {
        Self::new(name, Restart::Repeatable)
    }

    pub fn session_scoped(name: &'static str) -> Self {
        Self::new(name, Restart::SessionScoped)
    }

    pub fn one_shot(name: &'static str) -> Self {
        Self::new(name, Restart::OneShot)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> LoadingState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == LoadingState::Pending
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }

    fn can_start(&self) -> bool {
        match (self.state, self.restart) {
            (LoadingState::Idle, _) => true,
            (LoadingState::Finish, Restart::SessionScoped) => true,
            _ => false,
        }
    }

    fn settled_state(&self) -> LoadingState {
        match self.restart {
            Restart::Repeatable => LoadingState::Idle,
            Restart::SessionScoped | Restart::OneShot => LoadingState::Finish,
        }
    }

    /// Move into `Pending`, clearing the previous outcome
    ///
    /// Returns `false` (and changes nothing) when the transition is not allowed.
    pub fn start(&mut self) -> bool {
        if !self.can_start() {
            debug!(operation = self.name, state = ?self.state, "start dropped");
            return false;
        }
        self.result = None;
        self.error = None;
        self.state = LoadingState::Pending;
        true
    }

    /// Store a successful outcome; only accepted while `Pending`
    pub fn succeed(&mut self, result: T) -> bool {
        if !self.is_pending() {
            debug!(operation = self.name, state = ?self.state, "success dropped");
            return false;
        }
        self.result = Some(result);
        self.state = self.settled_state();
        true
    }

    /// Store a failed outcome; only accepted while `Pending`
    pub fn fail(&mut self, error: E) -> bool {
        if !self.is_pending() {
            debug!(operation = self.name, state = ?self.state, "failure dropped");
            return false;
        }
        self.error = Some(error);
        self.state = self.settled_state();
        true
    }

    /// Settle without an outcome
    ///
    /// Used when the outcome was absorbed elsewhere (session termination).
    pub fn abandon(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.state = self.settled_state();
        true
    }

    /// Drop the stored outcome and rest in `state`
    ///
    /// A pending run is left alone: it still owns the lifecycle until it
    /// settles, so no second run can start meanwhile.
    pub(crate) fn rest(&mut self, state: LoadingState) -> bool {
        if self.is_pending() {
            debug!(operation = self.name, "rest deferred, run in flight");
            return false;
        }
        self.result = None;
        self.error = None;
        self.state = state;
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_double_start_is_single_pending() {
        let mut op: Lifecycle<u32, String> = Lifecycle::repeatable("fetch");
        assert!(op.start());
        assert!(!op.start());
        assert_eq!(op.state(), LoadingState::Pending);

        assert!(op.succeed(7));
        assert_eq!(op.state(), LoadingState::Idle);
        assert_eq!(op.result(), Some(&7));
    }

    #[test]
    fn test_rest_leaves_pending_run_alone() {
        let mut op: Lifecycle<u32, String> = Lifecycle::session_scoped("fetch");
        op.start();
        assert!(op.succeed(1));

        assert!(op.rest(LoadingState::Finish));
        assert_eq!(op.state(), LoadingState::Finish);
        assert!(op.result().is_none());

        op.start();
        assert!(!op.rest(LoadingState::Finish));
        assert!(op.is_pending());
        assert!(!op.start());
        assert!(op.abandon());
        assert_eq!(op.state(), LoadingState::Finish);
    }

    #[test]
    fn test_settle_requires_pending() {
        let mut op: Lifecycle<u32, String> = Lifecycle::repeatable("fetch");
        assert!(!op.succeed(1));
        assert!(!op.fail("boom".into()));
        assert_eq!(op.state(), LoadingState::Idle);
        assert!(op.result().is_none());
        assert!(op.error().is_none());

        op.start();
        assert!(op.fail("boom".into()));
        // late duplicate settle is ignored
        assert!(!op.succeed(2));
        assert_eq!(op.error().map(String::as_str), Some("boom"));
        assert!(op.result().is_none());
    }

    #[test]
    fn test_start_clears_previous_outcome() {
        let mut op: Lifecycle<u32, String> = Lifecycle::repeatable("fetch");
        op.start();
        op.fail("first".into());
        assert!(op.start());
        assert!(op.error().is_none());
        assert!(op.result().is_none());
    }

    #[test]
    fn test_session_scoped_restarts_from_finish() {
        let mut op: Lifecycle<u32, String> = Lifecycle::session_scoped("identity");
        op.start();
        op.succeed(1);
        assert_eq!(op.state(), LoadingState::Finish);
        assert!(op.start());
        assert_eq!(op.state(), LoadingState::Pending);
    }

    #[test]
    fn test_one_shot_stays_finished() {
        let mut op: Lifecycle<u32, String> = Lifecycle::one_shot("bootstrap");
        op.start();
        op.fail("nope".into());
        assert_eq!(op.state(), LoadingState::Finish);
        assert!(!op.start());
        assert_eq!(op.error().map(String::as_str), Some("nope"));
    }

    #[test]
    fn test_abandon_settles_without_outcome() {
        let mut op: Lifecycle<u32, String> = Lifecycle::repeatable("publish");
        assert!(!op.abandon());
        op.start();
        assert!(op.abandon());
        assert_eq!(op.state(), LoadingState::Idle);
        assert!(op.result().is_none() && op.error().is_none());
    }
}
