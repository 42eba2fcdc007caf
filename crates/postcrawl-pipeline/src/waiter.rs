//! Bounded polling of asynchronous tasks.
//!
//! [`TaskWaiter`] knows *how* to poll (interval, optional deadline); callers
//! say *what* to sample and which states are terminal. The crawler wait and
//! the query wait share this one loop.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Shortest sleep between samples. A smaller configured interval is raised
/// to this so a bounded wait always makes progress toward its deadline.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Sampling interval and optional deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Sleep between samples.
    pub interval: Duration,
    /// Give up after this much accumulated sleep. `None` waits forever.
    pub max_wait: Option<Duration>,
}

impl PollSchedule {
    /// A schedule that stops after `max_wait` of accumulated sleep.
    pub fn bounded(interval: Duration, max_wait: Duration) -> Self {
        Self {
            interval,
            max_wait: Some(max_wait),
        }
    }

    /// A schedule that polls until a terminal state is seen.
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_wait: None,
        }
    }

    /// Sleep actually used between samples: `interval`, but at least
    /// [`MIN_POLL_INTERVAL`].
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }

    /// Number of samples taken before a bounded wait times out:
    /// `ceil(max_wait / interval)`, and never fewer than one.
    pub fn max_samples(&self) -> Option<u64> {
        let max_wait = self.max_wait?;
        let interval = self.effective_interval().as_nanos();
        let samples = max_wait.as_nanos().div_ceil(interval).max(1);
        Some(u64::try_from(samples).unwrap_or(u64::MAX))
    }
}

/// Outcome of a wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult<S> {
    /// The last observed state. Not terminal when `timed_out` is set.
    pub state: S,
    /// The deadline passed before a terminal state was observed.
    pub timed_out: bool,
    /// How many times the state was sampled.
    pub samples: u64,
    /// Accumulated sleep time.
    pub waited: Duration,
}

/// Repeatedly samples a task until it is terminal or the schedule runs out.
#[derive(Debug, Clone, Copy)]
pub struct TaskWaiter {
    schedule: PollSchedule,
}

impl TaskWaiter {
    pub fn new(schedule: PollSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> PollSchedule {
        self.schedule
    }

    /// Sample until `is_terminal` holds or the deadline is reached.
    ///
    /// A terminal first sample returns without sleeping. Timing out is not an
    /// error: the last state comes back with `timed_out = true` and the caller
    /// decides what that means. Errors from `sample` end the wait immediately.
    pub async fn wait<S, E, F, Fut, P>(
        &self,
        mut sample: F,
        is_terminal: P,
    ) -> Result<WaitResult<S>, E>
    where
        S: std::fmt::Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<S, E>>,
        P: Fn(&S) -> bool,
    {
        let mut waited = Duration::ZERO;
        let mut samples = 0u64;

        loop {
            let state = sample().await?;
            samples += 1;
            debug!(
                ?state,
                samples,
                waited_secs = waited.as_secs(),
                "Sampled task state"
            );

            if is_terminal(&state) {
                return Ok(WaitResult {
                    state,
                    timed_out: false,
                    samples,
                    waited,
                });
            }

            let interval = self.schedule.effective_interval();
            tokio::time::sleep(interval).await;
            waited += interval;

            if let Some(max_wait) = self.schedule.max_wait
                && waited >= max_wait
            {
                return Ok(WaitResult {
                    state,
                    timed_out: true,
                    samples,
                    waited,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::convert::Infallible;
    use tokio::time::Instant;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_max_samples() {
        assert_eq!(PollSchedule::bounded(secs(5), secs(90)).max_samples(), Some(18));
        assert_eq!(PollSchedule::bounded(secs(5), secs(7)).max_samples(), Some(2));
        assert_eq!(PollSchedule::bounded(secs(5), secs(0)).max_samples(), Some(1));
        assert_eq!(PollSchedule::unbounded(secs(5)).max_samples(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_first_sample_never_sleeps() {
        let waiter = TaskWaiter::new(PollSchedule::bounded(secs(5), secs(90)));
        let start = Instant::now();

        let result = waiter
            .wait(|| async { Ok::<_, Infallible>("READY") }, |s: &&str| *s == "READY")
            .await
            .unwrap();

        assert_eq!(result.state, "READY");
        assert!(!result.timed_out);
        assert_eq!(result.samples, 1);
        assert_eq!(result.waited, Duration::ZERO);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_terminal_times_out_after_ceil_samples() {
        for (interval, max_wait) in [(5, 90), (5, 7), (3, 10), (10, 10)] {
            let schedule = PollSchedule::bounded(secs(interval), secs(max_wait));
            let waiter = TaskWaiter::new(schedule);
            let calls = Cell::new(0u64);

            let result = waiter
                .wait(
                    || {
                        calls.set(calls.get() + 1);
                        async { Ok::<_, Infallible>("RUNNING") }
                    },
                    |s: &&str| *s == "READY",
                )
                .await
                .unwrap();

            assert!(result.timed_out);
            assert_eq!(result.state, "RUNNING");
            assert_eq!(Some(calls.get()), schedule.max_samples());
            assert_eq!(result.samples, calls.get());
            assert!(result.waited >= secs(max_wait));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_becomes_terminal_mid_wait() {
        let waiter = TaskWaiter::new(PollSchedule::bounded(secs(5), secs(90)));
        let calls = Cell::new(0u32);
        let start = Instant::now();

        let result = waiter
            .wait(
                || {
                    calls.set(calls.get() + 1);
                    let state = if calls.get() >= 3 { "READY" } else { "RUNNING" };
                    async move { Ok::<_, Infallible>(state) }
                },
                |s: &&str| *s == "READY",
            )
            .await
            .unwrap();

        assert!(!result.timed_out);
        assert_eq!(result.samples, 3);
        assert_eq!(result.waited, secs(10));
        assert!(start.elapsed() >= secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_waits_past_any_deadline() {
        let waiter = TaskWaiter::new(PollSchedule::unbounded(secs(5)));
        let calls = Cell::new(0u32);

        let result = waiter
            .wait(
                || {
                    calls.set(calls.get() + 1);
                    let state = if calls.get() > 100 { "SUCCEEDED" } else { "RUNNING" };
                    async move { Ok::<_, Infallible>(state) }
                },
                |s: &&str| *s == "SUCCEEDED",
            )
            .await
            .unwrap();

        assert!(!result.timed_out);
        assert_eq!(result.samples, 101);
        assert_eq!(result.waited, secs(500));
    }

    #[test]
    fn test_zero_interval_is_raised_to_minimum() {
        let schedule = PollSchedule::bounded(Duration::ZERO, secs(1));
        assert_eq!(schedule.effective_interval(), MIN_POLL_INTERVAL);
        assert_eq!(schedule.max_samples(), Some(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_bounded_wait_still_times_out() {
        let schedule = PollSchedule::bounded(Duration::ZERO, secs(1));
        let waiter = TaskWaiter::new(schedule);
        let calls = Cell::new(0u64);

        let result = tokio::time::timeout(
            secs(5),
            waiter.wait(
                || {
                    calls.set(calls.get() + 1);
                    async { Ok::<_, Infallible>("RUNNING") }
                },
                |s: &&str| *s == "READY",
            ),
        )
        .await
        .expect("bounded wait must finish before its deadline")
        .unwrap();

        assert!(result.timed_out);
        assert_eq!(Some(result.samples), schedule.max_samples());
        assert_eq!(result.waited, secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sample_error_stops_wait() {
        let waiter = TaskWaiter::new(PollSchedule::unbounded(secs(5)));
        let result: Result<WaitResult<&str>, &str> = waiter
            .wait(|| async { Err("throttled") }, |_: &&str| false)
            .await;
        assert_eq!(result.unwrap_err(), "throttled");
    }
}
