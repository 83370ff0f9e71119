use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use super::command::CommandRunner;
use super::cpu::{CPU_USAGE_COMMAND, parse_cpu_usage};
use super::delta::{DeltaTracker, Throughput};
use super::error::SampleError;
use super::history::{DEFAULT_CAPACITY, History};
use super::memory::{MEMORY_SIZE_COMMAND, MEMORY_STATS_COMMAND, parse_memory};
use super::network::{NETWORK_STATS_COMMAND, TransferTotals, normalize, parse_transfer_totals};
use super::publish::{EventSink, IconRenderer, STATS_UPDATED, StatsPayload, icon_options};
use super::snapshot::{CpuStats, MemoryStats, Snapshot};

pub const INTERVAL_KEY: &str = "interval";
pub const HISTORY_CAPACITY_KEY: &str = "history_capacity";
pub const DEFAULT_INTERVAL_MS: u64 = 2000;

/// Numeric settings lookup.
pub trait Settings {
    fn setting(&self, key: &str) -> Option<u64>;
}

/// Sampling interval in milliseconds, shared between the sampler and whoever
/// adjusts it at runtime. Never zero.
#[derive(Clone, Debug)]
pub struct Interval(Arc<AtomicU64>);

impl Interval {
    pub fn new(ms: u64) -> Self {
        Self(Arc::new(AtomicU64::new(ms.max(1))))
    }

    pub fn get_ms(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.get_ms())
    }

    pub fn set(&self, ms: u64) {
        self.0.store(ms.max(1), Ordering::Relaxed);
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_MS)
    }
}

/// Shell command strings for each metric.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSet {
    pub cpu: String,
    pub memory_stats: String,
    pub memory_size: String,
    pub network: String,
}

impl Default for CommandSet {
    fn default() -> Self {
        CommandSet {
            cpu: CPU_USAGE_COMMAND.to_string(),
            memory_stats: MEMORY_STATS_COMMAND.to_string(),
            memory_size: MEMORY_SIZE_COMMAND.to_string(),
            network: NETWORK_STATS_COMMAND.to_string(),
        }
    }
}

/// Runs one sampling pass at a time and publishes the results.
pub struct Sampler<R> {
    runner: R,
    commands: CommandSet,
    interval: Interval,
    tracker: DeltaTracker,
    /// Interval the tracker's baseline was normalized over.
    baseline_interval: Duration,
    history: History,
    events: Arc<dyn EventSink>,
    icons: Option<Arc<dyn IconRenderer>>,
}

impl<R: CommandRunner> Sampler<R> {
    pub fn new(runner: R, settings: &impl Settings, events: Arc<dyn EventSink>) -> Self {
        let interval = settings
            .setting(INTERVAL_KEY)
            .unwrap_or(DEFAULT_INTERVAL_MS);
        let capacity = settings
            .setting(HISTORY_CAPACITY_KEY)
            .map(|c| c as usize)
            .unwrap_or(DEFAULT_CAPACITY);

        let interval = Interval::new(interval);
        Sampler {
            runner,
            commands: CommandSet::default(),
            baseline_interval: interval.duration(),
            interval,
            tracker: DeltaTracker::new(),
            history: History::new(capacity),
            events,
            icons: None,
        }
    }

    pub fn with_commands(mut self, commands: CommandSet) -> Self {
        self.commands = commands;
        self
    }

    pub fn set_icon_renderer(&mut self, icons: Arc<dyn IconRenderer>) {
        self.icons = Some(icons);
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// The next pass normalizes over the new interval and rescales the
    /// network baseline to match.
    pub fn set_interval(&self, ms: u64) {
        self.interval.set(ms);
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn delta_state(&self) -> Option<Throughput> {
        self.tracker.last()
    }

    /// Samples all three metrics concurrently. A metric that fails is logged
    /// and left as `None`.
    #[tracing::instrument(name = "sampler.sample", level = "debug", skip_all)]
    pub async fn sample(&mut self) -> Snapshot {
        let interval = self.interval.duration();
        if interval != self.baseline_interval {
            let factor = self.baseline_interval.as_secs_f64() / interval.as_secs_f64();
            debug!(factor, "interval changed; rebasing network baseline");
            self.tracker.rebase(factor);
            self.baseline_interval = interval;
        }

        let (cpu, memory, network) =
            tokio::join!(self.sample_cpu(), self.sample_memory(), self.sample_network());

        let network = network.map(|totals| {
            let cumulative = normalize(&totals, interval);
            self.tracker.observe(cumulative)
        });

        Snapshot {
            memory: available("memory", memory),
            cpu: available("cpu", cpu),
            network: available("network", network),
        }
    }

    /// Records `snapshot`, emits the stats event, and redraws the icons.
    pub fn publish(&mut self, snapshot: Snapshot) {
        let _span = tracing::debug_span!("sampler.publish").entered();
        let icons = icon_options(&snapshot);
        self.history.record(snapshot);

        let payload = StatsPayload {
            results: self.history.to_vec(),
            interval: self.interval.get_ms(),
        };
        self.events.emit(STATS_UPDATED, &payload);

        match &self.icons {
            Some(renderer) => renderer.draw_icons(&icons),
            None => debug!("no icon renderer attached; skipping draw"),
        }
    }

    /// One full pass: sample, then publish.
    pub async fn run_pass(&mut self) -> Snapshot {
        let snapshot = self.sample().await;
        self.publish(snapshot.clone());
        snapshot
    }

    async fn sample_cpu(&self) -> Result<CpuStats, SampleError> {
        let text = self.runner.run(&self.commands.cpu).await?;
        Ok(parse_cpu_usage(&text)?)
    }

    async fn sample_memory(&self) -> Result<MemoryStats, SampleError> {
        let (size, stats) = tokio::join!(
            self.runner.run(&self.commands.memory_size),
            self.runner.run(&self.commands.memory_stats)
        );
        Ok(parse_memory(&stats?, &size?)?)
    }

    async fn sample_network(&self) -> Result<TransferTotals, SampleError> {
        let text = self.runner.run(&self.commands.network).await?;
        Ok(parse_transfer_totals(&text)?)
    }
}

fn available<T>(metric: &'static str, result: Result<T, SampleError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(metric, error = %err, "metric unavailable this pass");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::system::error::CommandError;
    use crate::system::publish::IconOptions;

    #[derive(Default)]
    struct CannedRunner {
        outputs: Mutex<HashMap<String, String>>,
    }

    impl CannedRunner {
        fn set(&self, command: &str, output: &str) {
            self.outputs
                .lock()
                .unwrap()
                .insert(command.to_string(), output.to_string());
        }
    }

    impl CommandRunner for Arc<CannedRunner> {
        async fn run(&self, command: &str) -> Result<String, CommandError> {
            self.outputs
                .lock()
                .unwrap()
                .get(command)
                .cloned()
                .ok_or_else(|| CommandError::ExitStatus {
                    command: command.to_string(),
                    status: "exit status: 1".to_string(),
                })
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(String, StatsPayload)>>,
        icons: Mutex<Vec<Vec<IconOptions>>>,
    }

    impl EventSink for Recorder {
        fn emit(&self, event: &str, payload: &StatsPayload) {
            self.events
                .lock()
                .unwrap()
                .push((event.to_string(), payload.clone()));
        }
    }

    impl IconRenderer for Recorder {
        fn draw_icons(&self, icons: &[IconOptions]) {
            self.icons.lock().unwrap().push(icons.to_vec());
        }
    }

    struct Fixed(HashMap<&'static str, u64>);

    impl Settings for Fixed {
        fn setting(&self, key: &str) -> Option<u64> {
            self.0.get(key).copied()
        }
    }

    fn sampler(runner: Arc<CannedRunner>, recorder: Arc<Recorder>) -> Sampler<Arc<CannedRunner>> {
        let settings = Fixed(HashMap::from([(INTERVAL_KEY, 1000)]));
        let mut sampler = Sampler::new(runner, &settings, recorder.clone());
        sampler.set_icon_renderer(recorder);
        sampler
    }

    #[test]
    fn interval_is_never_zero() {
        let interval = Interval::new(0);
        assert_eq!(interval.get_ms(), 1);
        interval.set(750);
        assert_eq!(interval.duration(), Duration::from_millis(750));
        interval.set(0);
        assert_eq!(interval.get_ms(), 1);
    }

    #[test]
    fn settings_fall_back_to_defaults() {
        let sampler = Sampler::new(
            Arc::new(CannedRunner::default()),
            &Fixed(HashMap::new()),
            Arc::new(Recorder::default()),
        );
        assert_eq!(sampler.interval().get_ms(), DEFAULT_INTERVAL_MS);
        assert_eq!(sampler.history().capacity(), DEFAULT_CAPACITY);
    }

    #[tokio::test]
    async fn all_commands_failing_still_publishes() {
        let recorder = Arc::new(Recorder::default());
        let mut sampler = sampler(Arc::new(CannedRunner::default()), recorder.clone());

        let snapshot = sampler.run_pass().await;

        assert!(snapshot.is_empty());
        assert_eq!(sampler.history().len(), 1);
        assert_eq!(recorder.events.lock().unwrap().len(), 1);
        assert!(recorder.icons.lock().unwrap()[0].is_empty());
        assert_eq!(sampler.delta_state(), None);
    }

    #[tokio::test]
    async fn cpu_only_pass_emits_cpu_icon() {
        let runner = Arc::new(CannedRunner::default());
        runner.set(CPU_USAGE_COMMAND, "CPU usage: 20.5% user, 10.1% sys, 69.4% idle");
        let recorder = Arc::new(Recorder::default());
        let mut sampler = sampler(runner, recorder.clone());

        let snapshot = sampler.run_pass().await;

        assert_eq!(snapshot.cpu.map(|c| c.used_percentage), Some(30));
        let events = recorder.events.lock().unwrap();
        assert_eq!(events[0].0, STATS_UPDATED);
        assert_eq!(events[0].1.interval, 1000);
        let icons = recorder.icons.lock().unwrap();
        assert_eq!(icons[0].len(), 1);
        assert_eq!(icons[0][0].value, 30.0);
    }

    #[tokio::test]
    async fn network_failure_leaves_delta_state_untouched() {
        let runner = Arc::new(CannedRunner::default());
        runner.set(NETWORK_STATS_COMMAND, "a.1 1000000 500000\n");
        let mut sampler = sampler(runner.clone(), Arc::new(Recorder::default()));

        sampler.run_pass().await;
        let baseline = sampler.delta_state();
        assert!(baseline.is_some());

        runner.set(NETWORK_STATS_COMMAND, "no rows here\n");
        let snapshot = sampler.run_pass().await;
        assert!(snapshot.network.is_none());
        assert_eq!(sampler.delta_state(), baseline);
    }
}
