// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Runs tagged, periodic probe callables on a bounded worker pool and drains
//! their results on a single-threaded cadence driven by the main loop.
//!
//! Probes that block (connecting a socket, launching a subprocess) must not
//! stall the main loop, so each dispatch runs on `spawn_blocking`, gated by a
//! semaphore sized to `max_workers`. Results flow back through an unbounded
//! MPSC channel drained once per `tick()`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};

use crate::config::SchedulerConfig;
use crate::error::ProbeError;

pub type Probe = Arc<dyn Fn() -> Result<(), ProbeError> + Send + Sync>;

struct TaskRecord {
    probe: Probe,
    tag: String,
    next_run: Instant,
    interval: Duration,
    backoff: bool,
    failures: u32,
    last_duration: Duration,
    generation: u64,
    in_flight: bool,
}

struct ProbeResult {
    tag: String,
    success: bool,
    duration: Duration,
    generation: u64,
}

/// Schedules worker-pool dispatches for periodic connection probes.
pub struct ReconnectScheduler {
    cfg: SchedulerConfig,
    tasks: HashMap<String, TaskRecord>,
    generation: u64,
    semaphore: Arc<Semaphore>,
    result_tx: mpsc::UnboundedSender<ProbeResult>,
    result_rx: mpsc::UnboundedReceiver<ProbeResult>,
    shutdown: bool,
}

impl ReconnectScheduler {
    #[must_use]
    pub fn new(cfg: SchedulerConfig) -> Self {
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        let max_workers = cfg.max_workers;
        Self {
            cfg,
            tasks: HashMap::new(),
            generation: 0,
            semaphore: Arc::new(Semaphore::new(max_workers)),
            result_tx,
            result_rx,
            shutdown: false,
        }
    }

    /// Register a probe under `tag`. Idempotent by tag: re-registering an
    /// existing tag refreshes its backoff flag and, if `run_immediately`,
    /// its next-run deadline, rather than creating a second task.
    pub fn register(
        &mut self,
        tag: impl Into<String>,
        probe: Probe,
        backoff: bool,
        run_immediately: bool,
    ) {
        if self.shutdown {
            return;
        }
        let tag = tag.into();
        let now = Instant::now();

        if let Some(rec) = self.tasks.get_mut(&tag) {
            rec.backoff = backoff;
            if run_immediately {
                rec.next_run = now;
            }
            return;
        }

        let interval = Duration::from_secs_f64(self.cfg.reconnect_interval);
        let first = if run_immediately { now } else { now + interval };
        debug!(
            tag = %tag,
            interval_s = self.cfg.reconnect_interval,
            generation = self.generation,
            "scheduler: registered task"
        );
        self.tasks.insert(
            tag.clone(),
            TaskRecord {
                probe,
                tag,
                next_run: first,
                interval,
                backoff,
                failures: 0,
                last_duration: Duration::ZERO,
                generation: self.generation,
                in_flight: false,
            },
        );
    }

    /// Remove every task whose tag equals or is prefixed by `tag`, bumping
    /// the generation counter so in-flight workers' results are dropped.
    pub fn unregister_tag(&mut self, tag: &str) {
        self.generation += 1;
        let before = self.tasks.len();
        self.tasks
            .retain(|t, _| !(t == tag || t.starts_with(tag)));
        let removed = before - self.tasks.len();
        debug!(tag, removed, "scheduler: unregistered tasks");
    }

    /// Dispatch every task whose deadline has passed and which isn't still
    /// running, then drain completed results. Never blocks.
    pub fn tick(&mut self) {
        if self.shutdown {
            return;
        }
        let now = Instant::now();
        for rec in self.tasks.values_mut() {
            if now >= rec.next_run && !rec.in_flight {
                rec.next_run = now + rec.interval;
                rec.in_flight = true;
                dispatch(rec.probe.clone(), rec.tag.clone(), rec.generation, self.semaphore.clone(), self.result_tx.clone());
            }
        }
        self.drain_results();
    }

    fn drain_results(&mut self) {
        let now = Instant::now();
        while let Ok(result) = self.result_rx.try_recv() {
            let Some(rec) = self.tasks.get_mut(&result.tag) else {
                continue;
            };
            if result.generation != rec.generation {
                continue;
            }
            rec.in_flight = false;
            rec.last_duration = result.duration;

            if result.duration.as_secs_f64() > self.cfg.slow_threshold {
                debug!(
                    tag = %rec.tag,
                    duration_ms = result.duration.as_secs_f64() * 1000.0,
                    "scheduler: slow probe"
                );
            }

            if rec.backoff {
                let base = self.cfg.reconnect_interval;
                if result.success {
                    rec.failures = 0;
                    rec.interval = Duration::from_secs_f64(base);
                } else {
                    rec.failures += 1;
                    let backed_off = base * 2f64.powi(rec.failures as i32);
                    rec.interval = Duration::from_secs_f64(backed_off.min(self.cfg.backoff_cap));
                }
                let jitter = self.cfg.jitter;
                let factor = if jitter > 0.0 {
                    rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter))
                } else {
                    1.0
                };
                rec.interval = rec.interval.mul_f64(factor);
            }

            let target = now + rec.interval;
            if rec.next_run < target {
                rec.next_run = target;
            }
        }
    }

    /// Stop dispatching further probes. Already-dispatched workers finish on
    /// their own; their results are simply never drained again.
    pub fn shutdown(&mut self) {
        self.shutdown = true;
    }
}

fn dispatch(
    probe: Probe,
    tag: String,
    generation: u64,
    semaphore: Arc<Semaphore>,
    result_tx: mpsc::UnboundedSender<ProbeResult>,
) {
    tokio::spawn(async move {
        let _permit = semaphore.acquire_owned().await;
        let start = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || probe()).await;
        let duration = start.elapsed();

        let success = match outcome {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!(tag = %tag, error = %e, "probe error");
                false
            }
            Err(join_err) => {
                warn!(tag = %tag, error = %join_err, "probe panicked");
                false
            }
        };

        let _ = result_tx.send(ProbeResult {
            tag,
            success,
            duration,
            generation,
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn cfg() -> SchedulerConfig {
        SchedulerConfig {
            reconnect_interval: 3.0,
            max_workers: 4,
            backoff_cap: 60.0,
            jitter: 0.0,
            slow_threshold: 1.0,
        }
    }

    #[tokio::test]
    async fn backoff_sequence_matches_spec_scenario() {
        let mut sched = ReconnectScheduler::new(cfg());
        let failures = Arc::new(AtomicU32::new(0));
        let f = failures.clone();
        sched.register(
            "rig",
            Arc::new(move || {
                f.fetch_add(1, Ordering::SeqCst);
                Err(ProbeError::Connect(std::io::Error::other("down")))
            }),
            true,
            true,
        );

        let mut seen_intervals = Vec::new();
        for _ in 0..3 {
            sched.tick();
            // Allow the spawned worker + channel round trip to complete.
            for _ in 0..50 {
                tokio::task::yield_now().await;
                if !sched.tasks.get("rig").unwrap().in_flight {
                    break;
                }
            }
            sched.drain_results();
            seen_intervals.push(sched.tasks.get("rig").unwrap().interval.as_secs_f64().round());
        }
        assert_eq!(seen_intervals, vec![6.0, 12.0, 24.0]);
    }

    #[test]
    fn unregister_tag_matches_prefix() {
        let mut sched = ReconnectScheduler::new(cfg());
        sched.register("sdr", Arc::new(|| Ok(())), true, false);
        sched.register("sdr-probe", Arc::new(|| Ok(())), true, false);
        sched.register("rig", Arc::new(|| Ok(())), true, false);
        sched.unregister_tag("sdr");
        assert!(!sched.tasks.contains_key("sdr"));
        assert!(!sched.tasks.contains_key("sdr-probe"));
        assert!(sched.tasks.contains_key("rig"));
    }

    #[test]
    fn unregister_then_reregister_bumps_task_generation() {
        let mut sched = ReconnectScheduler::new(cfg());
        sched.register("rig", Arc::new(|| Ok(())), true, false);
        let gen_before = sched.tasks.get("rig").unwrap().generation;
        sched.unregister_tag("rig");
        sched.register("rig", Arc::new(|| Ok(())), true, false);
        assert!(sched.tasks.get("rig").unwrap().generation > gen_before);
    }
}
