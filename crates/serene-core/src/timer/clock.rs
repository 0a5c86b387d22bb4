//! Tick sources for the session engine.
//!
//! A [`Clock`] hands out one [`TickSubscription`] per session. The
//! subscription is the only handle on the tick source: cancelling or
//! dropping it stops delivery, so a forgotten session cannot leak a
//! periodic callback.

use std::cell::RefCell;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Default tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub trait Clock {
    fn subscribe(&self, period: Duration) -> TickSubscription;
}

/// Receiving end of a tick source.
#[derive(Debug)]
pub struct TickSubscription {
    rx: mpsc::UnboundedReceiver<()>,
    task: Option<JoinHandle<()>>,
}

impl TickSubscription {
    fn new(rx: mpsc::UnboundedReceiver<()>, task: Option<JoinHandle<()>>) -> Self {
        Self { rx, task }
    }

    /// Wait for the next tick. `None` once the source is gone or cancelled.
    pub async fn next_tick(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Stop delivery. Ticks already queued are still drained by `next_tick`.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
    }
}

impl Drop for TickSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Wall-clock ticks from a tokio interval.
///
/// `subscribe` must be called from inside a tokio runtime with a non-zero
/// period.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalClock;

impl Clock for IntervalClock {
    fn subscribe(&self, period: Duration) -> TickSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
        TickSubscription::new(rx, Some(task))
    }
}

/// Ticks delivered on demand.
///
/// Used by tests and by scripted runs that should not wait on real time.
#[derive(Debug, Default)]
pub struct ManualClock {
    senders: RefCell<Vec<mpsc::UnboundedSender<()>>>,
    script: Option<usize>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subscription receives exactly `ticks` ticks and then closes.
    pub fn scripted(ticks: usize) -> Self {
        Self {
            senders: RefCell::default(),
            script: Some(ticks),
        }
    }

    /// Queue `n` ticks on every live subscription.
    pub fn advance(&self, n: usize) {
        let mut senders = self.senders.borrow_mut();
        senders.retain(|tx| !tx.is_closed());
        for tx in senders.iter() {
            for _ in 0..n {
                let _ = tx.send(());
            }
        }
    }

    /// Drop every sender. Subscriptions see `None` after draining.
    pub fn close(&self) {
        self.senders.borrow_mut().clear();
    }

    /// Subscriptions that are still able to receive ticks.
    pub fn live_subscriptions(&self) -> usize {
        self.senders
            .borrow()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }
}

impl Clock for ManualClock {
    fn subscribe(&self, _period: Duration) -> TickSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        match self.script {
            Some(ticks) => {
                for _ in 0..ticks {
                    let _ = tx.send(());
                }
            }
            None => self.senders.borrow_mut().push(tx),
        }
        TickSubscription::new(rx, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_clock_delivers_queued_ticks() {
        let clock = ManualClock::new();
        let mut sub = clock.subscribe(TICK_PERIOD);
        clock.advance(3);
        clock.close();

        let mut seen = 0;
        while sub.next_tick().await.is_some() {
            seen += 1;
        }
        assert_eq!(seen, 3);
    }

    #[tokio::test]
    async fn scripted_clock_closes_after_its_ticks() {
        let clock = ManualClock::scripted(2);
        let mut sub = clock.subscribe(TICK_PERIOD);
        assert!(sub.next_tick().await.is_some());
        assert!(sub.next_tick().await.is_some());
        assert!(sub.next_tick().await.is_none());
        assert_eq!(clock.live_subscriptions(), 0);
    }

    #[tokio::test]
    async fn dropping_subscription_releases_manual_source() {
        let clock = ManualClock::new();
        let sub = clock.subscribe(TICK_PERIOD);
        assert_eq!(clock.live_subscriptions(), 1);
        drop(sub);
        assert_eq!(clock.live_subscriptions(), 0);
    }

    #[tokio::test]
    async fn cancel_stops_delivery() {
        let clock = ManualClock::new();
        let mut sub = clock.subscribe(TICK_PERIOD);
        sub.cancel();
        clock.advance(2);
        assert!(sub.next_tick().await.is_none());
        assert_eq!(clock.live_subscriptions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_clock_ticks_once_per_period() {
        let start = Instant::now();
        let mut sub = IntervalClock.subscribe(TICK_PERIOD);

        sub.next_tick().await.unwrap();
        let first = start.elapsed();
        assert!(first >= TICK_PERIOD && first < TICK_PERIOD * 2, "{first:?}");
        sub.next_tick().await.unwrap();
        let second = start.elapsed();
        assert!(second >= TICK_PERIOD * 2 && second < TICK_PERIOD * 3, "{second:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn interval_clock_stops_after_cancel() {
        let mut sub = IntervalClock.subscribe(TICK_PERIOD);
        sub.next_tick().await.unwrap();
        sub.cancel();
        tokio::time::sleep(TICK_PERIOD * 5).await;
        assert!(sub.next_tick().await.is_none());
    }
}
