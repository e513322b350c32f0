//! Bounded submit-then-poll state machine.
//!
//! ```text
//! Submitted -> Polling -> Complete | Failed | TimedOut
//! ```
//!
//! All timeout and retry rules live in [`AsyncPollLoop::tick`]:
//! - `elapsed >= max_wait` ends the loop as `TimedOut` without querying
//! - a transient query failure leaves the state untouched
//! - `elapsed` grows by exactly one interval between ticks, however long
//!   the query itself took

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

/// Consecutive transient failures logged before the rest are suppressed.
const MAX_LOGGED_TRANSIENT_FAILURES: u32 = 3;

/// Counter of status queries issued by all poll loops.
pub const POLL_TICKS_METRIC: &str = "avgen_poll_ticks_total";

/// Tick interval and ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(120), // 2 minutes
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.interval.is_zero() {
            return Err(ClientError::config("poll interval must be positive"));
        }
        if self.max_wait < self.interval {
            return Err(ClientError::config(format!(
                "poll max_wait ({:?}) must be at least one interval ({:?})",
                self.max_wait, self.interval
            )));
        }
        Ok(())
    }
}

/// What one status query reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Still queued or running; carries the provider's status label
    Pending(String),
    /// Finished; the artifact can be fetched from `result_location`
    Complete { result_location: String },
    /// The provider gave up on the job
    Failed { payload: String },
}

/// Loop state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Submitted,
    Polling { elapsed: Duration },
    Complete { result_location: String },
    Failed { payload: String },
    TimedOut { elapsed: Duration },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Complete { .. } | PollState::Failed { .. } | PollState::TimedOut { .. }
        )
    }
}

/// Anything that can report the status of a submitted job.
#[async_trait]
pub trait StatusSource: Send + Sync {
    type Handle: fmt::Display + Send + Sync;

    async fn query(&self, handle: &Self::Handle) -> ClientResult<PollStatus>;
}

/// Drives one job handle to a terminal state.
pub struct AsyncPollLoop<'a, S: StatusSource> {
    source: &'a S,
    handle: S::Handle,
    config: PollConfig,
    state: PollState,
    queries: u32,
    /// Transient failures since the last answered query
    transient_streak: u32,
    transient_total: u32,
}

impl<'a, S: StatusSource> AsyncPollLoop<'a, S> {
    pub fn new(source: &'a S, handle: S::Handle, config: PollConfig) -> Self {
        Self {
            source,
            handle,
            config,
            state: PollState::Submitted,
            queries: 0,
            transient_streak: 0,
            transient_total: 0,
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Status queries issued so far.
    pub fn queries(&self) -> u32 {
        self.queries
    }

    /// Transient query failures seen so far.
    pub fn transient_failures(&self) -> u32 {
        self.transient_total
    }

    /// Transient failures in a row, reset by any answered query.
    pub fn consecutive_transient_failures(&self) -> u32 {
        self.transient_streak
    }

    /// Run one tick. A no-op once the state is terminal.
    pub async fn tick(&mut self) -> &PollState {
        let elapsed = match self.state {
            PollState::Submitted => Duration::ZERO,
            PollState::Polling { elapsed } => elapsed,
            _ => return &self.state,
        };

        if elapsed >= self.config.max_wait {
            warn!(
                request_id = %self.handle,
                elapsed_secs = elapsed.as_secs_f64(),
                "Job did not finish within {:?}",
                self.config.max_wait
            );
            self.state = PollState::TimedOut { elapsed };
            return &self.state;
        }

        self.queries += 1;
        counter!(POLL_TICKS_METRIC).increment(1);

        self.state = match self.source.query(&self.handle).await {
            Ok(PollStatus::Pending(status)) => {
                self.end_transient_streak();
                debug!(
                    request_id = %self.handle,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Status: {}",
                    status
                );
                PollState::Polling { elapsed }
            }
            Ok(PollStatus::Complete { result_location }) => {
                self.end_transient_streak();
                info!(
                    request_id = %self.handle,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Job complete"
                );
                PollState::Complete { result_location }
            }
            Ok(PollStatus::Failed { payload }) => {
                warn!(request_id = %self.handle, "Job failed: {}", payload);
                PollState::Failed { payload }
            }
            Err(e) if e.is_transient() => {
                self.transient_streak += 1;
                self.transient_total += 1;
                if self.transient_streak <= MAX_LOGGED_TRANSIENT_FAILURES {
                    warn!(
                        request_id = %self.handle,
                        elapsed_secs = elapsed.as_secs_f64(),
                        "Status check failed, retrying next tick: {}",
                        e
                    );
                } else if self.transient_streak == MAX_LOGGED_TRANSIENT_FAILURES + 1 {
                    warn!(
                        request_id = %self.handle,
                        "Status checks keep failing, suppressing further warnings until one succeeds"
                    );
                } else {
                    debug!(request_id = %self.handle, "Status check failed: {}", e);
                }
                PollState::Polling { elapsed }
            }
            Err(e) => {
                warn!(request_id = %self.handle, "Status check failed permanently: {}", e);
                PollState::Failed {
                    payload: e.to_string(),
                }
            }
        };

        &self.state
    }

    /// Tick until terminal, sleeping one interval between ticks.
    ///
    /// Returns the result location of a completed job.
    pub async fn run(mut self) -> ClientResult<String> {
        loop {
            self.tick().await;

            match &self.state {
                PollState::Complete { result_location } => return Ok(result_location.clone()),
                PollState::Failed { payload } => {
                    return Err(ClientError::provider(format!(
                        "job {} failed: {}",
                        self.handle, payload
                    )))
                }
                PollState::TimedOut { elapsed } => return Err(ClientError::Timeout(elapsed.as_secs())),
                PollState::Submitted | PollState::Polling { .. } => {}
            }

            tokio::time::sleep(self.config.interval).await;
            self.advance();
        }
    }

    fn end_transient_streak(&mut self) {
        if self.transient_streak > MAX_LOGGED_TRANSIENT_FAILURES {
            info!(
                request_id = %self.handle,
                "Status checks recovered after {} failed ticks",
                self.transient_streak
            );
        }
        self.transient_streak = 0;
    }

    fn advance(&mut self) {
        if let PollState::Polling { elapsed } = &mut self.state {
            *elapsed += self.config.interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted responses, then repeats the fallback forever.
    struct Scripted {
        responses: Mutex<VecDeque<ClientResult<PollStatus>>>,
        fallback: fn() -> ClientResult<PollStatus>,
    }

    impl Scripted {
        fn new(responses: Vec<ClientResult<PollStatus>>, fallback: fn() -> ClientResult<PollStatus>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                fallback,
            }
        }
    }

    #[async_trait]
    impl StatusSource for Scripted {
        type Handle = String;

        async fn query(&self, _handle: &String) -> ClientResult<PollStatus> {
            let next = self.responses.lock().unwrap().pop_front();
            next.unwrap_or_else(self.fallback)
        }
    }

    fn pending() -> ClientResult<PollStatus> {
        Ok(PollStatus::Pending("IN_PROGRESS".to_string()))
    }

    fn unavailable() -> ClientResult<PollStatus> {
        Err(ClientError::HttpStatus {
            status: 503,
            body: "upstream busy".to_string(),
        })
    }

    fn config() -> PollConfig {
        PollConfig::new(Duration::from_secs(2), Duration::from_secs(120))
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_after_pending_ticks() {
        let source = Scripted::new(
            vec![
                pending(),
                pending(),
                Ok(PollStatus::Complete {
                    result_location: "https://cdn/audio.mp3".to_string(),
                }),
            ],
            pending,
        );

        let location = AsyncPollLoop::new(&source, "req-1".to_string(), config())
            .run()
            .await
            .unwrap();

        assert_eq!(location, "https://cdn/audio.mp3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_enters_polling() {
        let source = Scripted::new(vec![], pending);
        let mut poll = AsyncPollLoop::new(&source, "req".to_string(), config());

        assert_eq!(poll.state(), &PollState::Submitted);
        let state = poll.tick().await.clone();
        assert_eq!(state, PollState::Polling { elapsed: Duration::ZERO });
        assert_eq!(poll.queries(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_is_terminal() {
        let source = Scripted::new(
            vec![
                pending(),
                Ok(PollStatus::Failed {
                    payload: r#"{"status":"FAILED"}"#.to_string(),
                }),
            ],
            pending,
        );

        let mut poll = AsyncPollLoop::new(&source, "req".to_string(), config());
        poll.tick().await;
        let state = poll.tick().await.clone();
        assert!(matches!(state, PollState::Failed { .. }));

        // Terminal states do not query again
        poll.tick().await;
        assert_eq!(poll.queries(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_at_max_wait() {
        let source = Scripted::new(vec![], pending);
        let start = tokio::time::Instant::now();

        let err = AsyncPollLoop::new(&source, "req".to_string(), config())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Timeout(120)));
        // Queries at 0, 2, ..., 118; the check at 120 stops without querying
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(120));
        assert!(waited < Duration::from_secs(122));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_never_overshoots_by_more_than_one_interval() {
        // max_wait that is not a multiple of the interval
        let config = PollConfig::new(Duration::from_secs(3), Duration::from_secs(10));
        let source = Scripted::new(vec![], pending);
        let mut poll = AsyncPollLoop::new(&source, "req".to_string(), config.clone());

        loop {
            poll.tick().await;
            if poll.state().is_terminal() {
                break;
            }
            poll.advance();
        }

        match poll.state() {
            PollState::TimedOut { elapsed } => {
                assert!(*elapsed >= config.max_wait);
                assert!(*elapsed < config.max_wait + config.interval);
            }
            other => panic!("expected TimedOut, got {:?}", other),
        }
        // Queries at 0, 3, 6, 9
        assert_eq!(poll.queries(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_keeps_state() {
        let source = Scripted::new(vec![pending(), unavailable()], pending);
        let mut poll = AsyncPollLoop::new(&source, "req".to_string(), config());

        let before = poll.tick().await.clone();
        poll.advance();
        let before_elapsed = match before {
            PollState::Polling { elapsed } => elapsed + Duration::from_secs(2),
            other => panic!("unexpected {:?}", other),
        };

        let after = poll.tick().await.clone();
        assert_eq!(after, PollState::Polling { elapsed: before_elapsed });
        assert_eq!(poll.transient_failures(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_answered_query_ends_transient_streak() {
        let source = Scripted::new(
            vec![unavailable(), unavailable(), unavailable(), unavailable(), unavailable()],
            pending,
        );
        let mut poll = AsyncPollLoop::new(&source, "req".to_string(), config());

        for _ in 0..5 {
            poll.tick().await;
            poll.advance();
        }
        assert_eq!(poll.consecutive_transient_failures(), 5);

        poll.tick().await;
        assert_eq!(poll.consecutive_transient_failures(), 0);
        assert_eq!(poll.transient_failures(), 5);
        assert_eq!(poll.state(), &PollState::Polling { elapsed: Duration::from_secs(10) });
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_count_like_pending() {
        let failing = Scripted::new(vec![], unavailable);
        let waiting = Scripted::new(vec![], pending);

        let mut a = AsyncPollLoop::new(&failing, "a".to_string(), config());
        let mut b = AsyncPollLoop::new(&waiting, "b".to_string(), config());
        for _ in 0..200 {
            a.tick().await;
            b.tick().await;
            if a.state().is_terminal() && b.state().is_terminal() {
                break;
            }
            a.advance();
            b.advance();
        }

        assert_eq!(a.state(), b.state());
        assert!(matches!(a.state(), PollState::TimedOut { .. }));
        assert_eq!(a.queries(), b.queries());
        assert_eq!(a.transient_failures(), a.queries());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_query_error_fails_loop() {
        let source = Scripted::new(
            vec![Err(ClientError::invalid_response("no audio_url in response"))],
            pending,
        );

        let err = AsyncPollLoop::new(&source, "req-9".to_string(), config())
            .run()
            .await
            .unwrap_err();

        match err {
            ClientError::Provider(msg) => {
                assert!(msg.contains("req-9"));
                assert!(msg.contains("no audio_url"));
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_poll_config_validation() {
        assert!(PollConfig::default().validate().is_ok());
        assert!(PollConfig::new(Duration::ZERO, Duration::from_secs(1)).validate().is_err());
        assert!(PollConfig::new(Duration::from_secs(5), Duration::from_secs(1)).validate().is_err());
    }
}
