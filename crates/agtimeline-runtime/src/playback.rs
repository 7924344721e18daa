use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::session::TimelineSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTick {
    /// 1-based tick counter since the timer started
    pub seq: u64,
}

/// Periodic playback ticks delivered over a channel.
///
/// The first tick arrives one full period after `start`. Stopping or
/// dropping the timer aborts the task, so no tick is delivered afterwards.
/// Must be started from within a tokio runtime.
pub struct PlaybackTimer {
    handle: Option<JoinHandle<()>>,
}

impl PlaybackTimer {
    pub fn start(period: Duration) -> (Self, mpsc::Receiver<PlaybackTick>) {
        let (tx, rx) = mpsc::channel(1);
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut seq = 0;
            loop {
                interval.tick().await;
                seq += 1;
                if tx.send(PlaybackTick { seq }).await.is_err() {
                    break;
                }
            }
        });

        (
            Self {
                handle: Some(handle),
            },
            rx,
        )
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PlaybackTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drive `session` playback from a timer until it stops or `max_ticks` is reached.
///
/// Calls `on_step` with every newly selected event id and returns how many
/// steps were taken. The timer is torn down before returning.
pub async fn run_playback<F>(
    session: &mut TimelineSession,
    period: Duration,
    max_ticks: Option<usize>,
    mut on_step: F,
) -> usize
where
    F: FnMut(&str),
{
    if !session.is_playing() || max_ticks == Some(0) {
        return 0;
    }

    let (mut timer, mut ticks) = PlaybackTimer::start(period);
    let mut steps = 0;

    while ticks.recv().await.is_some() {
        match session.tick() {
            Some(id) => {
                steps += 1;
                on_step(&id);
            }
            None => break,
        }
        if max_ticks.is_some_and(|max| steps >= max) {
            session.pause();
            break;
        }
    }

    timer.stop();
    debug!(steps, "playback finished");
    steps
}
