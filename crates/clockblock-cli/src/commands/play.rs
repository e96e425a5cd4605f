use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use clockblock_core::{BudgetClock, Event, SharedEngine};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::info;

use super::{CliResult, Session};

/// Run the budget clock until Ctrl-C or SIGTERM, or until `minutes` ticks
/// have landed.
///
/// Each tick is applied to the stored engine, not to a copy held since
/// start, so adjustments made by other commands while playing survive. A
/// lease renewed on every tick marks this process as alive; if it dies
/// without stopping, the next command clears the playing flag once the
/// lease runs out.
pub fn run(minutes: Option<u32>) -> CliResult {
    let session = Session::open()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(play(session, minutes))
}

async fn play(mut session: Session, minutes: Option<u32>) -> CliResult {
    let shutdown = shutdown_signal()?;
    tokio::pin!(shutdown);

    let lease_live = session.play_lease_live()?;
    session.db.renew_play_lease(Utc::now())?;
    let started = session.update_with_lease(lease_live, |engine| {
        Ok(engine.start_playing().map(|event| (event, engine.clone())))
    })?;
    let Some((event, engine)) = started else {
        return Err("play is already running for this data directory".into());
    };
    emit(&event)?;

    // The clock drives a local mirror of the stored engine and only paces
    // the ticks; the mirror is already playing, so start() emits nothing.
    let mirror: SharedEngine = Arc::new(Mutex::new(engine));
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let mut clock = BudgetClock::with_period(Arc::clone(&mirror), session.config.clock.period())
        .with_event_sink(tx);
    clock.start();
    info!(tick_secs = session.config.clock.tick_secs, ?minutes, "playing");

    let mut ticks = 0u32;
    let mut ended_elsewhere = false;
    loop {
        if minutes.is_some_and(|limit| ticks >= limit) {
            break;
        }
        tokio::select! {
            _ = &mut shutdown => {
                info!("interrupted");
                break;
            }
            pulse = rx.recv() => {
                if pulse.is_none() {
                    break;
                }
                let ticked = session.update(|stored| {
                    Ok(stored.is_playing().then(|| (stored.tick(), stored.clone())))
                })?;
                let Some((event, stored)) = ticked else {
                    info!("play was stopped by another command");
                    ended_elsewhere = true;
                    break;
                };
                *mirror.lock() = stored;
                session.db.renew_play_lease(Utc::now())?;
                ticks += 1;
                emit(&event)?;
            }
        }
    }

    clock.stop();
    // A play started after ours was stopped elsewhere owns the flag and lease.
    if !ended_elsewhere {
        if let Some(event) = session.update(|engine| Ok(engine.stop_playing()))? {
            emit(&event)?;
            session.db.release_play_lease()?;
        }
    }
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM on unix.
///
/// The SIGTERM handler is installed before this returns.
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    #[cfg(unix)]
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    Ok(async move {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
    })
}

/// One compact JSON event per line while the clock runs.
fn emit(event: &Event) -> CliResult {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}
