use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info};

use super::command::CommandRunner;
use super::sampler::{Interval, Sampler};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchedulerState {
    #[default]
    Idle,
    Sampling,
    Publishing,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub completed_passes: u64,
}

/// Handle to a running sampling loop.
///
/// Dropping the handle stops the loop after its current pass.
pub struct SchedulerHandle<R> {
    shutdown: watch::Sender<bool>,
    status: watch::Receiver<SchedulerStatus>,
    interval: Interval,
    task: JoinHandle<Sampler<R>>,
}

/// Spawns the sampling loop. The first pass runs immediately; each later pass
/// waits for the interval read at the end of the previous one.
pub fn start<R>(sampler: Sampler<R>) -> SchedulerHandle<R>
where
    R: CommandRunner + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (status_tx, status_rx) = watch::channel(SchedulerStatus::default());
    let interval = sampler.interval().clone();

    let task = tokio::spawn(run_loop(sampler, shutdown_rx, status_tx));

    SchedulerHandle {
        shutdown: shutdown_tx,
        status: status_rx,
        interval,
        task,
    }
}

async fn run_loop<R: CommandRunner>(
    mut sampler: Sampler<R>,
    mut shutdown: watch::Receiver<bool>,
    status: watch::Sender<SchedulerStatus>,
) -> Sampler<R> {
    info!(interval_ms = sampler.interval().get_ms(), "sampler started");

    loop {
        transition(&status, SchedulerState::Sampling);
        let snapshot = sampler.sample().await;

        transition(&status, SchedulerState::Publishing);
        sampler.publish(snapshot);

        status.send_modify(|s| {
            s.state = SchedulerState::Idle;
            s.completed_passes += 1;
        });

        let wait = sampler.interval().duration();
        debug!(wait_ms = wait.as_millis() as u64, "next pass armed");
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.changed() => break,
        }
    }

    info!(
        passes = status.borrow().completed_passes,
        "sampler stopped"
    );
    sampler
}

fn transition(status: &watch::Sender<SchedulerStatus>, state: SchedulerState) {
    debug!(?state, "scheduler transition");
    status.send_modify(|s| s.state = state);
}

impl<R> SchedulerHandle<R> {
    pub fn status(&self) -> SchedulerStatus {
        *self.status.borrow()
    }

    pub fn state(&self) -> SchedulerState {
        self.status().state
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Takes effect from the next wait onward.
    pub fn set_interval(&self, ms: u64) {
        self.interval.set(ms);
    }

    /// Resolves once at least `passes` passes have been published, or
    /// immediately if the loop has already exited.
    pub async fn wait_for_passes(&mut self, passes: u64) {
        let _ = self
            .status
            .wait_for(|s| s.completed_passes >= passes)
            .await;
    }

    /// Cancels the pending wait and returns the sampler once any in-flight
    /// pass has finished.
    pub async fn stop(self) -> Result<Sampler<R>, JoinError> {
        let _ = self.shutdown.send(true);
        self.task.await
    }
}
