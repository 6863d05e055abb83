//! Cross-cutting failure policy applied to every settled remote outcome.
//!
//! Interceptors run in a fixed order. Each one looks at the failure (if any)
//! and either lets the outcome continue to its subscriber or swallows it.
//!
//! | # | Interceptor | Matches | Effect | Outcome |
//! |---|---|---|---|---|
//! | 1 | [`ForbiddenInterceptor`] | `Forbidden` | terminate session | suppressed |
//! | 2 | [`TransportInterceptor`] | `Transport` | one transient notice | continues |
//!
//! Anything else continues untouched. New operation kinds get this policy
//! for free because it never looks at which operation produced the outcome.

use tracing::warn;

use crate::remote::RemoteFailure;

/// Notice shown for connectivity failures
pub const NETWORK_ERROR_NOTICE: &str = "Network error";

/// State the router is allowed to act on
pub trait RouterTarget {
    fn terminate_session(&mut self);
    fn notify(&mut self, message: &str);
}

/// What an interceptor decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Suppress,
}

pub trait Interceptor: Send + Sync {
    /// Called with the failure carried by the outcome, `None` on success
    fn intercept(&self, failure: Option<&RemoteFailure>, target: &mut dyn RouterTarget) -> Flow;
}

/// Forbidden means the session is gone: reset it, the failure goes nowhere else
#[derive(Debug, Default, Clone, Copy)]
pub struct ForbiddenInterceptor;

impl Interceptor for ForbiddenInterceptor {
    fn intercept(&self, failure: Option<&RemoteFailure>, target: &mut dyn RouterTarget) -> Flow {
        match failure {
            Some(RemoteFailure::Forbidden) => {
                warn!("forbidden response, terminating session");
                target.terminate_session();
                Flow::Suppress
            }
            _ => Flow::Continue,
        }
    }
}

/// Connectivity failures get a notice; the outcome still reaches its subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TransportInterceptor;

impl Interceptor for TransportInterceptor {
    fn intercept(&self, failure: Option<&RemoteFailure>, target: &mut dyn RouterTarget) -> Flow {
        if let Some(RemoteFailure::Transport(reason)) = failure {
            warn!("transport failure: {}", reason);
            target.notify(NETWORK_ERROR_NOTICE);
        }
        Flow::Continue
    }
}

/// The ordered interceptor chain
pub struct ErrorRouter {
    chain: Vec<Box<dyn Interceptor>>,
}

impl Default for ErrorRouter {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ForbiddenInterceptor),
            Box::new(TransportInterceptor),
        ])
    }
}

impl std::fmt::Debug for ErrorRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorRouter")
            .field("interceptors", &self.chain.len())
            .finish()
    }
}

impl ErrorRouter {
    pub fn new(chain: Vec<Box<dyn Interceptor>>) -> Self {
        Self { chain }
    }

    /// Pass `outcome` through the chain
    ///
    /// Returns `None` when an interceptor suppressed it; later interceptors
    /// do not run in that case.
    pub fn route<T>(
        &self,
        outcome: Result<T, RemoteFailure>,
        target: &mut dyn RouterTarget,
    ) -> Option<Result<T, RemoteFailure>> {
        let failure = outcome.as_ref().err();
        for interceptor in &self.chain {
            if interceptor.intercept(failure, target) == Flow::Suppress {
                return None;
            }
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        terminated: u32,
        notices: Vec<String>,
    }

    impl RouterTarget for Recorder {
        fn terminate_session(&mut self) {
            self.terminated += 1;
        }
        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    #[test]
    fn test_forbidden_terminates_and_suppresses() {
        let router = ErrorRouter::default();
        let mut target = Recorder::default();

        let routed = router.route::<()>(Err(RemoteFailure::Forbidden), &mut target);
        assert!(routed.is_none());
        assert_eq!(target.terminated, 1);
        assert!(target.notices.is_empty());
    }

    #[test]
    fn test_transport_notifies_once_and_continues() {
        let router = ErrorRouter::default();
        let mut target = Recorder::default();

        let failure = RemoteFailure::Transport("connection refused".into());
        let routed = router.route::<()>(Err(failure.clone()), &mut target);
        assert_eq!(routed, Some(Err(failure)));
        assert_eq!(target.notices, vec![NETWORK_ERROR_NOTICE.to_string()]);
        assert_eq!(target.terminated, 0);
    }

    #[test]
    fn test_other_outcomes_pass_untouched() {
        let router = ErrorRouter::default();
        let mut target = Recorder::default();

        assert_eq!(router.route(Ok(5), &mut target), Some(Ok(5)));
        assert_eq!(
            router.route::<()>(Err(RemoteFailure::Unauthorized), &mut target),
            Some(Err(RemoteFailure::Unauthorized))
        );
        assert_eq!(
            router.route::<()>(Err(RemoteFailure::Other("status 500".into())), &mut target),
            Some(Err(RemoteFailure::Other("status 500".into())))
        );
        assert_eq!(target.terminated, 0);
        assert!(target.notices.is_empty());
    }

    #[test]
    fn test_suppression_stops_the_chain() {
        struct Always;
        impl Interceptor for Always {
            fn intercept(&self, _: Option<&RemoteFailure>, target: &mut dyn RouterTarget) -> Flow {
                target.notify("after");
                Flow::Continue
            }
        }

        let router = ErrorRouter::new(vec![Box::new(ForbiddenInterceptor), Box::new(Always)]);
        let mut target = Recorder::default();
        router.route::<()>(Err(RemoteFailure::Forbidden), &mut target);
        assert!(target.notices.is_empty());

        router.route::<()>(Ok(()), &mut target);
        assert_eq!(target.notices, vec!["after".to_string()]);
    }
}
