use std::{fmt, future::Future, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown refresh interval \"{0}\", expected off, 30s, 1m, 5m or 15m")]
pub struct InvalidRefreshInterval(pub String);

/// Auto-refresh choices offered by the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RefreshInterval {
    #[default]
    Off,
    S30,
    M1,
    M5,
    M15,
}

impl RefreshInterval {
    pub const ALL: [RefreshInterval; 5] = [Self::Off, Self::S30, Self::M1, Self::M5, Self::M15];

    pub fn period(self) -> Option<Duration> {
        match self {
            Self::Off => None,
            Self::S30 => Some(Duration::from_secs(30)),
            Self::M1 => Some(Duration::from_secs(60)),
            Self::M5 => Some(Duration::from_secs(5 * 60)),
            Self::M15 => Some(Duration::from_secs(15 * 60)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::S30 => "30s",
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
        }
    }

    /// Next choice, wrapping back to `Off`.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|i| *i == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RefreshInterval {
    type Err = InvalidRefreshInterval;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|i| i.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InvalidRefreshInterval(s.to_string()))
    }
}

impl TryFrom<String> for RefreshInterval {
    type Error = InvalidRefreshInterval;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RefreshInterval> for String {
    fn from(value: RefreshInterval) -> Self {
        value.label().to_string()
    }
}

/// Owner of the single auto-refresh task of a collection.
///
/// At most one task is alive: reconfiguring aborts the previous one before
/// spawning a new one, and dropping the timer aborts whatever is running.
#[derive(Debug, Default)]
pub struct RefreshTimer {
    interval: RefreshInterval,
    handle: Option<JoinHandle<()>>,
}

impl RefreshTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the running task, if any, with one calling `tick` every
    /// period of `choice`. The first call happens one full period from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_interval<F, Fut>(&mut self, choice: RefreshInterval, tick: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.interval = choice;

        let Some(period) = choice.period() else {
            tracing::info!("auto-refresh disabled");
            return;
        };

        tracing::info!(interval = %choice, "auto-refresh enabled");
        let start = Instant::now() + period;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tracing::debug!(interval = %choice, "auto-refresh triggered");
                tick().await;
            }
        }));
    }

    /// Stops the running task. Safe to call when nothing is running.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.interval = RefreshInterval::Off;
    }

    pub fn interval(&self) -> RefreshInterval {
        self.interval
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn ticker(count: &Arc<AtomicUsize>) -> impl Fn() -> std::future::Ready<()> + Send + 'static {
        let count = Arc::clone(count);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    // One extra millisecond keeps deadlines that land exactly on the step due.
    async fn advance(secs: u64) {
        tokio::time::advance(Duration::from_secs(secs) + Duration::from_millis(1)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn intervals_parse_from_labels() {
        for interval in RefreshInterval::ALL {
            assert_eq!(interval.label().parse::<RefreshInterval>(), Ok(interval));
        }
        assert!("2m".parse::<RefreshInterval>().is_err());
        assert_eq!(RefreshInterval::M15.next(), RefreshInterval::Off);
        assert_eq!(RefreshInterval::M1.period(), Some(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn reconfiguring_leaves_one_live_timer() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut timer = RefreshTimer::new();

        timer.set_interval(RefreshInterval::S30, ticker(&count));
        timer.set_interval(RefreshInterval::M1, ticker(&count));

        advance(30).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        advance(30).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        advance(60).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(timer.interval(), RefreshInterval::M1);
    }

    #[tokio::test(start_paused = true)]
    async fn off_cancels_the_running_timer() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut timer = RefreshTimer::new();

        timer.set_interval(RefreshInterval::S30, ticker(&count));
        advance(30).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        timer.set_interval(RefreshInterval::Off, || std::future::ready(()));
        assert!(!timer.is_active());
        advance(120).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_stops_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut timer = RefreshTimer::new();
        timer.set_interval(RefreshInterval::S30, ticker(&count));

        timer.cancel();
        timer.cancel();
        drop(timer);

        advance(90).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
