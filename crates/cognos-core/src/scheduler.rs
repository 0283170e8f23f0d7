//! Priority queue with aging, starvation promotion, and background quota (C6).
//!
//! Grounded on the teacher's `GovernedTask`/`TaskGovernor`/`GovernanceAction`
//! priority-and-reason model (`shared.rs`), generalized from biological-load
//! penalties to time-based aging and a hard starvation guarantee.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Terminated,
}

/// `SchedulerTask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerTask {
    pub id: String,
    pub priority: f32,
    pub original_priority: f32,
    pub created_at_ms: i64,
    pub last_aged_at_ms: i64,
    pub time_slice_ms: u64,
    pub is_background: bool,
    pub status: TaskStatus,
}

impl SchedulerTask {
    pub fn new(id: impl Into<String>, priority: f32, is_background: bool, now_ms: i64) -> Self {
        let capped = priority.clamp(0.0, 10.0);
        Self {
            id: id.into(),
            priority: capped,
            original_priority: capped,
            created_at_ms: now_ms,
            last_aged_at_ms: now_ms,
            time_slice_ms: 100,
            is_background,
            status: TaskStatus::Queued,
        }
    }
}

/// Config needed by the scheduler, mirroring `SubstrateConfig` fields.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub aging_increment: f32,
    pub aging_interval_ms: u64,
    pub starvation_threshold_ms: u64,
    pub starvation_boost_priority: f32,
    pub max_background_concurrency: usize,
    pub max_thread_lifetime_ms: u64,
}

pub struct Scheduler {
    config: SchedulerConfig,
    queue: std::sync::Mutex<Vec<SchedulerTask>>,
    active_background: std::sync::Mutex<HashMap<String, i64>>,
    active_threads: std::sync::Mutex<HashMap<String, i64>>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            queue: std::sync::Mutex::new(Vec::new()),
            active_background: std::sync::Mutex::new(HashMap::new()),
            active_threads: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn schedule(&self, task: SchedulerTask) {
        self.queue.lock().expect("scheduler lock poisoned").push(task);
    }

    /// Raises priority of every waiting task by `agingIncrement` per elapsed
    /// `agingIntervalMs`, and force-promotes anything past the starvation
    /// threshold to `starvationBoostPriority`.
    pub fn apply_aging(&self, now_ms: i64) {
        let mut queue = self.queue.lock().expect("scheduler lock poisoned");
        for task in queue.iter_mut().filter(|t| t.status == TaskStatus::Queued) {
            let elapsed_since_aging = now_ms - task.last_aged_at_ms;
            let ticks = elapsed_since_aging / self.config.aging_interval_ms as i64;
            if ticks > 0 {
                task.priority = (task.priority + self.config.aging_increment * ticks as f32).min(10.0);
                task.last_aged_at_ms = now_ms;
            }
            let waited = now_ms - task.created_at_ms;
            if waited as u64 >= self.config.starvation_threshold_ms {
                task.priority = task.priority.max(self.config.starvation_boost_priority);
            }
        }
    }

    /// Pops the highest-priority queued task eligible under the background
    /// quota. Applies aging first so the dequeue reflects current priorities.
    pub fn dequeue(&self, now_ms: i64) -> Option<SchedulerTask> {
        self.apply_aging(now_ms);
        let mut queue = self.queue.lock().expect("scheduler lock poisoned");
        let background_count = self.active_background.lock().expect("scheduler lock poisoned").len();

        let mut best_idx: Option<usize> = None;
        for (idx, task) in queue.iter().enumerate() {
            if task.status != TaskStatus::Queued {
                continue;
            }
            if task.is_background && background_count >= self.config.max_background_concurrency {
                continue;
            }
            let better = match best_idx {
                None => true,
                Some(b) => task.priority > queue[b].priority,
            };
            if better {
                best_idx = Some(idx);
            }
        }

        let idx = best_idx?;
        let mut task = queue.remove(idx);
        task.status = TaskStatus::Running;
        if task.is_background {
            self.active_background
                .lock()
                .expect("scheduler lock poisoned")
                .insert(task.id.clone(), now_ms);
        }
        self.active_threads
            .lock()
            .expect("scheduler lock poisoned")
            .insert(task.id.clone(), now_ms);
        Some(task)
    }

    pub fn complete(&self, task_id: &str) {
        self.active_background
            .lock()
            .expect("scheduler lock poisoned")
            .remove(task_id);
        self.active_threads
            .lock()
            .expect("scheduler lock poisoned")
            .remove(task_id);
    }

    /// Hard-terminates any tracked thread exceeding `maxThreadLifetimeMs`;
    /// returns the terminated ids.
    pub fn enforce_thread_lifetimes(&self, now_ms: i64) -> Vec<String> {
        let mut threads = self.active_threads.lock().expect("scheduler lock poisoned");
        let expired: Vec<String> = threads
            .iter()
            .filter(|(_, started)| (now_ms - **started) as u64 > self.config.max_thread_lifetime_ms)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            threads.remove(id);
            self.active_background
                .lock()
                .expect("scheduler lock poisoned")
                .remove(id);
        }
        expired
    }

    pub fn queued_len(&self) -> usize {
        self.queue.lock().expect("scheduler lock poisoned").len()
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            aging_increment: 0.5,
            aging_interval_ms: 5_000,
            starvation_threshold_ms: 30_000,
            starvation_boost_priority: 9.0,
            max_background_concurrency: 5,
            max_thread_lifetime_ms: 5 * 60 * 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dequeue_picks_highest_priority() {
        let s = Scheduler::new(SchedulerConfig::default());
        s.schedule(SchedulerTask::new("low", 1.0, false, 0));
        s.schedule(SchedulerTask::new("high", 8.0, false, 0));
        let picked = s.dequeue(0).unwrap();
        assert_eq!(picked.id, "high");
    }

    #[test]
    fn starvation_force_promotes_within_one_tick() {
        let s = Scheduler::new(SchedulerConfig {
            starvation_threshold_ms: 1000,
            starvation_boost_priority: 9.0,
            ..SchedulerConfig::default()
        });
        s.schedule(SchedulerTask::new("stale", 0.0, false, 0));
        s.apply_aging(2000);
        let task = s.queue.lock().unwrap()[0].clone();
        assert!(task.priority >= 9.0);
    }

    #[test]
    fn background_quota_is_enforced() {
        let s = Scheduler::new(SchedulerConfig {
            max_background_concurrency: 1,
            ..SchedulerConfig::default()
        });
        s.schedule(SchedulerTask::new("bg1", 5.0, true, 0));
        s.schedule(SchedulerTask::new("bg2", 5.0, true, 0));
        let first = s.dequeue(0).unwrap();
        assert_eq!(first.id, "bg1");
        // second background task cannot dequeue while bg1 is active
        assert!(s.dequeue(0).is_none());
        s.complete(&first.id);
        let second = s.dequeue(0).unwrap();
        assert_eq!(second.id, "bg2");
    }

    #[test]
    fn thread_lifetime_is_enforced() {
        let s = Scheduler::new(SchedulerConfig {
            max_thread_lifetime_ms: 100,
            ..SchedulerConfig::default()
        });
        s.schedule(SchedulerTask::new("long", 5.0, false, 0));
        s.dequeue(0);
        let terminated = s.enforce_thread_lifetimes(1000);
        assert_eq!(terminated, vec!["long".to_string()]);
    }

    #[test]
    fn priority_is_capped_at_ten() {
        let task = SchedulerTask::new("x", 99.0, false, 0);
        assert_eq!(task.priority, 10.0);
    }
}
