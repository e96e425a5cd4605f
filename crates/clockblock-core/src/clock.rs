//! Budget clock.
//!
//! A cancellable interval task that debits the shared engine once per
//! period while play is active. The engine itself has no timer; this is the
//! only asynchronous mutator.
//!
//! ## Guarantees
//!
//! - `start` on a running clock and `stop` on a stopped clock are no-ops.
//! - After `stop` returns, no tick is applied, including one whose timer
//!   already fired: every tick re-checks the run id under the engine lock,
//!   and `stop` bumps the run id under that same lock.
//! - Missed periods (host suspended) are skipped, not replayed.
//! - Dropping the clock cancels its task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::economy::EconomyEngine;
use crate::events::Event;

/// Engine handle shared between the clock task and its owner.
pub type SharedEngine = Arc<Mutex<EconomyEngine>>;

/// Default tick period: one minute of budget per minute of wall clock.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(60);

struct ClockHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ClockHandle {
    fn release(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        self.task.abort();
    }
}

pub struct BudgetClock {
    engine: SharedEngine,
    period: Duration,
    run_id: Arc<AtomicU64>,
    handle: Option<ClockHandle>,
    events: Option<mpsc::UnboundedSender<Event>>,
}

impl BudgetClock {
    pub fn new(engine: SharedEngine) -> Self {
        Self::with_period(engine, DEFAULT_TICK_PERIOD)
    }

    /// A clock with a custom period. Each period still debits one minute.
    pub fn with_period(engine: SharedEngine, period: Duration) -> Self {
        Self {
            engine,
            period,
            run_id: Arc::new(AtomicU64::new(0)),
            handle: None,
            events: None,
        }
    }

    /// Forward every tick event to `sink`.
    pub fn with_event_sink(mut self, sink: mpsc::UnboundedSender<Event>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// True while a tick task is alive.
    ///
    /// A task ends on its own when the engine stops playing underneath it
    /// (for example on settlement).
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|h| !h.task.is_finished())
    }

    /// Start debiting. Must be called inside a tokio runtime.
    pub fn start(&mut self) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        // Release a finished handle before creating a new one.
        if let Some(stale) = self.handle.take() {
            stale.release();
        }

        let (event, run) = {
            let mut engine = self.engine.lock();
            let run = self.run_id.fetch_add(1, Ordering::SeqCst) + 1;
            (engine.start_playing(), run)
        };

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(tick_loop(
            Arc::clone(&self.engine),
            Arc::clone(&self.run_id),
            run,
            self.period,
            cancel_rx,
            self.events.clone(),
        ));
        self.handle = Some(ClockHandle {
            cancel: Some(cancel_tx),
            task,
        });
        info!(run, period_ms = self.period.as_millis() as u64, "budget clock started");
        event
    }

    /// Stop debiting. No tick lands after this returns.
    pub fn stop(&mut self) -> Option<Event> {
        let handle = self.handle.take();
        let event = {
            let mut engine = self.engine.lock();
            self.run_id.fetch_add(1, Ordering::SeqCst);
            engine.stop_playing()
        };
        if let Some(handle) = handle {
            handle.release();
            info!("budget clock stopped");
        }
        event
    }
}

impl Drop for BudgetClock {
    fn drop(&mut self) {
        self.run_id.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
    }
}

async fn tick_loop(
    engine: SharedEngine,
    run_id: Arc<AtomicU64>,
    run: u64,
    period: Duration,
    mut cancel: oneshot::Receiver<()>,
    events: Option<mpsc::UnboundedSender<Event>>,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut cancel => break,
            _ = interval.tick() => {
                let event = {
                    let mut engine = engine.lock();
                    if run_id.load(Ordering::SeqCst) != run || !engine.is_playing() {
                        None
                    } else {
                        Some(engine.tick())
                    }
                };
                match event {
                    Some(event) => {
                        if let Some(sink) = &events {
                            let _ = sink.send(event);
                        }
                    }
                    None => {
                        debug!(run, "clock run superseded or play stopped; exiting");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::EconomyConfig;
    use crate::schedule::WeeklySchedule;
    use chrono::Weekday;

    const PERIOD: Duration = Duration::from_secs(60);

    fn shared_engine() -> SharedEngine {
        let engine = EconomyEngine::new(
            EconomyConfig::default(),
            &WeeklySchedule::default(),
            Weekday::Mon,
        )
        .unwrap();
        Arc::new(Mutex::new(engine))
    }

    async fn let_tasks_run() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let engine = shared_engine();
        let mut clock = BudgetClock::with_period(Arc::clone(&engine), PERIOD);
        assert!(clock.start().is_some());

        tokio::time::sleep(PERIOD * 3 + Duration::from_secs(5)).await;
        let_tasks_run().await;
        assert_eq!(engine.lock().current_budget(), 57);

        assert!(clock.stop().is_some());
        assert!(!engine.lock().is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_before_first_period() {
        let engine = shared_engine();
        let mut clock = BudgetClock::with_period(Arc::clone(&engine), PERIOD);
        clock.start();
        tokio::time::sleep(PERIOD - Duration::from_secs(1)).await;
        let_tasks_run().await;
        assert_eq!(engine.lock().current_budget(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_and_double_stop_are_noops() {
        let engine = shared_engine();
        let mut clock = BudgetClock::with_period(Arc::clone(&engine), PERIOD);
        assert!(clock.start().is_some());
        assert!(clock.start().is_none());
        assert!(clock.is_running());

        tokio::time::sleep(PERIOD * 2 + Duration::from_secs(5)).await;
        let_tasks_run().await;
        // A second start must not have created an overlapping clock.
        assert_eq!(engine.lock().current_budget(), 58);

        assert!(clock.stop().is_some());
        assert!(clock.stop().is_none());
        assert!(!clock.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_further_ticks() {
        let engine = shared_engine();
        let mut clock = BudgetClock::with_period(Arc::clone(&engine), PERIOD);
        clock.start();
        tokio::time::sleep(PERIOD + Duration::from_secs(5)).await;
        let_tasks_run().await;
        clock.stop();

        tokio::time::sleep(PERIOD * 5).await;
        let_tasks_run().await;
        assert_eq!(engine.lock().current_budget(), 59);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_toggle_leaves_single_clock() {
        let engine = shared_engine();
        let mut clock = BudgetClock::with_period(Arc::clone(&engine), PERIOD);
        for _ in 0..5 {
            clock.start();
            clock.stop();
        }
        clock.start();
        tokio::time::sleep(PERIOD * 2 + Duration::from_secs(5)).await;
        let_tasks_run().await;
        assert_eq!(engine.lock().current_budget(), 58);
    }

    #[tokio::test(start_paused = true)]
    async fn missed_periods_are_not_replayed() {
        let engine = shared_engine();
        let mut clock = BudgetClock::with_period(Arc::clone(&engine), PERIOD);
        clock.start();
        let_tasks_run().await;

        // Jump ten periods at once, as if the host had been suspended.
        tokio::time::advance(PERIOD * 10 + Duration::from_secs(5)).await;
        let_tasks_run().await;
        let budget = engine.lock().current_budget();
        assert!(budget >= 59, "lost ticks were replayed: budget {budget}");
    }

    #[tokio::test(start_paused = true)]
    async fn settlement_ends_the_run() {
        let engine = shared_engine();
        let mut clock = BudgetClock::with_period(Arc::clone(&engine), PERIOD);
        clock.start();
        engine.lock().settle_day_end(&WeeklySchedule::default());

        tokio::time::sleep(PERIOD * 2).await;
        let_tasks_run().await;
        assert!(!clock.is_running());
        // Tuesday's allowance, untouched by the stale run.
        assert_eq!(engine.lock().current_budget(), 60);

        // Starting again after settlement works.
        assert!(clock.start().is_some());
        tokio::time::sleep(PERIOD + Duration::from_secs(5)).await;
        let_tasks_run().await;
        assert_eq!(engine.lock().current_budget(), 59);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_task() {
        let engine = shared_engine();
        {
            let mut clock = BudgetClock::with_period(Arc::clone(&engine), PERIOD);
            clock.start();
        }
        tokio::time::sleep(PERIOD * 3).await;
        let_tasks_run().await;
        assert_eq!(engine.lock().current_budget(), 60);
        // Dropping does not touch the playing flag; the owner decides.
        assert!(engine.lock().is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_events_to_sink() {
        let engine = shared_engine();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = BudgetClock::with_period(Arc::clone(&engine), PERIOD).with_event_sink(tx);
        clock.start();
        tokio::time::sleep(PERIOD * 2 + Duration::from_secs(5)).await;
        let_tasks_run().await;
        clock.stop();

        let mut ticks = 0;
        while let Ok(ev) = rx.try_recv() {
            assert!(matches!(ev, Event::BudgetTicked { .. }));
            ticks += 1;
        }
        assert_eq!(ticks, 2);
    }
}
