//! Debounced username availability checking.
//!
//! Every keystroke calls [`AvailabilityChecker::on_username_changed`]. A check
//! is scheduled after a quiet period and replaces whatever was pending or in
//! flight for the previous value. Results travel through a
//! [`tokio::sync::watch`] channel stamped with a generation number, and a
//! result is only written if its generation is still the current one, so a
//! superseded check can never overwrite the state for a newer value.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::ports::UsernameAvailability;

use super::fields::Username;

/// Default quiet period before a check is sent.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Availability of the username currently in the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvailabilityState {
    /// No check has completed for the current value.
    #[default]
    Unknown,
    /// A check for the current value is in flight.
    Checking,
    /// The current value is free.
    Available,
    /// The current value belongs to another account.
    Taken,
    /// The check failed; treated as non-blocking.
    CheckFailed,
}

impl AvailabilityState {
    /// Whether this state prevents submission.
    #[must_use]
    pub fn blocks_submission(self) -> bool {
        matches!(self, Self::Taken)
    }
}

/// Availability state together with the input it describes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AvailabilitySnapshot {
    /// Bumped on every username change.
    pub generation: u64,
    /// The username value this state belongs to.
    pub username: String,
    /// Current availability.
    pub state: AvailabilityState,
}

/// Owns the pending check for one registration session.
///
/// At most one scheduled or in-flight check exists at a time. Dropping the
/// checker cancels it.
pub struct AvailabilityChecker<A> {
    service: Arc<A>,
    quiet_period: Duration,
    status: Arc<watch::Sender<AvailabilitySnapshot>>,
    pending: Option<JoinHandle<()>>,
}

impl<A> AvailabilityChecker<A>
where
    A: UsernameAvailability + 'static,
{
    /// Create a checker that waits `quiet_period` before asking `service`.
    pub fn new(service: Arc<A>, quiet_period: Duration) -> Self {
        let (status, _) = watch::channel(AvailabilitySnapshot::default());
        Self {
            service,
            quiet_period,
            status: Arc::new(status),
            pending: None,
        }
    }

    /// Record a new username value and schedule a check if it is well formed.
    ///
    /// Any earlier scheduled or in-flight check is cancelled. Must be called
    /// from within a Tokio runtime for the check to be scheduled; otherwise
    /// the state becomes [`AvailabilityState::CheckFailed`].
    pub fn on_username_changed(&mut self, value: &str) {
        self.cancel_pending();
        let generation = self.begin(value);

        let Ok(username) = Username::new(value) else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!("no async runtime available; skipping username availability check");
            apply(&self.status, generation, AvailabilityState::CheckFailed);
            return;
        };

        let service = Arc::clone(&self.service);
        let status = Arc::clone(&self.status);
        let quiet_period = self.quiet_period;
        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(quiet_period).await;
            if !apply(&status, generation, AvailabilityState::Checking) {
                return;
            }
            let state = match service.check_username_available(&username).await {
                Ok(true) => AvailabilityState::Available,
                Ok(false) => AvailabilityState::Taken,
                Err(error) => {
                    warn!(%error, username = %username, "username availability check failed");
                    AvailabilityState::CheckFailed
                }
            };
            if !apply(&status, generation, state) {
                debug!(username = %username, "discarding superseded availability result");
            }
        }));
    }

    /// Wait for the pending check, if any, to finish.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.pending.take() {
            if let Err(error) = handle.await {
                if !error.is_cancelled() {
                    warn!(%error, "username availability task failed");
                }
            }
        }
    }
}

impl<A> AvailabilityChecker<A> {
    /// Latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AvailabilitySnapshot {
        self.status.borrow().clone()
    }

    /// Availability of the most recent username value.
    #[must_use]
    pub fn state(&self) -> AvailabilityState {
        self.status.borrow().state
    }

    /// Observe snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AvailabilitySnapshot> {
        self.status.subscribe()
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    fn begin(&self, value: &str) -> u64 {
        let mut generation = 0;
        self.status.send_modify(|snapshot| {
            snapshot.generation = snapshot.generation.wrapping_add(1);
            snapshot.username = value.to_owned();
            snapshot.state = AvailabilityState::Unknown;
            generation = snapshot.generation;
        });
        generation
    }
}

impl<A> Drop for AvailabilityChecker<A> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

/// Write `state` only if `generation` is still current.
fn apply(
    status: &watch::Sender<AvailabilitySnapshot>,
    generation: u64,
    state: AvailabilityState,
) -> bool {
    status.send_if_modified(|snapshot| {
        if snapshot.generation != generation {
            return false;
        }
        snapshot.state = state;
        true
    })
}

#[cfg(test)]
mod tests {
    //! Debounce and supersession behaviour under a paused clock.
    use super::*;
    use crate::domain::ports::{AvailabilityCheckError, MockUsernameAvailability};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn checker(mock: MockUsernameAvailability) -> AvailabilityChecker<MockUsernameAvailability> {
        AvailabilityChecker::new(Arc::new(mock), DEFAULT_QUIET_PERIOD)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_changes_issue_a_single_check_for_the_last_value() {
        let mut mock = MockUsernameAvailability::new();
        mock.expect_check_username_available()
            .withf(|username: &Username| username.as_ref() == "user123")
            .times(1)
            .returning(|_| Ok(true));
        let mut checker = checker(mock);

        checker.on_username_changed("user1");
        checker.on_username_changed("user12");
        checker.on_username_changed("user123");
        checker.settle().await;

        let snapshot = checker.snapshot();
        assert_eq!(snapshot.username, "user123");
        assert_eq!(snapshot.state, AvailabilityState::Available);
    }

    #[tokio::test(start_paused = true)]
    async fn changes_within_the_quiet_period_restart_the_timer() {
        let mut mock = MockUsernameAvailability::new();
        mock.expect_check_username_available()
            .withf(|username: &Username| username.as_ref() == "second22")
            .times(1)
            .returning(|_| Ok(false));
        let mut checker = checker(mock);

        checker.on_username_changed("first111");
        tokio::time::sleep(Duration::from_millis(400)).await;
        checker.on_username_changed("second22");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(checker.state(), AvailabilityState::Unknown);

        checker.settle().await;
        assert_eq!(checker.state(), AvailabilityState::Taken);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_usernames_are_never_checked() {
        let mut mock = MockUsernameAvailability::new();
        mock.expect_check_username_available().times(0);
        let mut checker = checker(mock);

        checker.on_username_changed("abcdef");
        checker.settle().await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(checker.state(), AvailabilityState::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_checks_degrade_to_check_failed() {
        let mut mock = MockUsernameAvailability::new();
        mock.expect_check_username_available()
            .times(1)
            .returning(|_| Err(AvailabilityCheckError::transport("connection reset")));
        let mut checker = checker(mock);

        checker.on_username_changed("diner777");
        checker.settle().await;

        assert_eq!(checker.state(), AvailabilityState::CheckFailed);
        assert!(!checker.state().blocks_submission());
    }

    /// Answers after a per-call delay and records every username asked.
    struct SlowAvailability {
        delay: Duration,
        asked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl UsernameAvailability for SlowAvailability {
        async fn check_username_available(
            &self,
            username: &Username,
        ) -> Result<bool, AvailabilityCheckError> {
            self.asked
                .lock()
                .expect("asked lock")
                .push(username.as_ref().to_owned());
            tokio::time::sleep(self.delay).await;
            Ok(username.as_ref() != "taken111")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_result_for_a_superseded_value_is_never_applied() {
        let service = Arc::new(SlowAvailability {
            delay: Duration::from_millis(1_000),
            asked: Mutex::new(Vec::new()),
        });
        let mut checker = AvailabilityChecker::new(Arc::clone(&service), DEFAULT_QUIET_PERIOD);
        let mut updates = checker.subscribe();

        checker.on_username_changed("taken111");
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(checker.state(), AvailabilityState::Checking);

        checker.on_username_changed("fresh222");
        checker.settle().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let snapshot = updates.borrow_and_update().clone();
        assert_eq!(snapshot.username, "fresh222");
        assert_eq!(snapshot.state, AvailabilityState::Available);
        assert_eq!(
            *service.asked.lock().expect("asked lock"),
            vec!["taken111".to_owned(), "fresh222".to_owned()]
        );
    }

    #[test]
    fn stale_generation_cannot_write() {
        let (status, _) = watch::channel(AvailabilitySnapshot {
            generation: 4,
            username: "fresh222".into(),
            state: AvailabilityState::Unknown,
        });

        assert!(!apply(&status, 3, AvailabilityState::Taken));
        assert_eq!(status.borrow().state, AvailabilityState::Unknown);
        assert!(apply(&status, 4, AvailabilityState::Available));
        assert_eq!(status.borrow().state, AvailabilityState::Available);
    }

    #[test]
    fn without_a_runtime_the_check_degrades_instead_of_panicking() {
        let mut checker = AvailabilityChecker::new(
            Arc::new(MockUsernameAvailability::new()),
            DEFAULT_QUIET_PERIOD,
        );
        checker.on_username_changed("diner777");
        assert_eq!(checker.state(), AvailabilityState::CheckFailed);
    }
}
