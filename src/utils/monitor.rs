use std::sync::Mutex;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseStats {
    pub phase: String,
    pub elapsed: Duration,
    pub memory_mb: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub phases: Vec<PhaseStats>,
    pub total: Duration,
    pub peak_memory_mb: Option<u64>,
}

struct MonitorState {
    phase_started: Instant,
    phases: Vec<PhaseStats>,
    peak_memory_mb: Option<u64>,
}

/// Times the phases of a report run and samples process memory between them.
/// A disabled monitor records nothing.
pub struct RunMonitor {
    enabled: bool,
    started: Instant,
    state: Mutex<MonitorState>,
    #[cfg(feature = "cli")]
    probe: Option<Mutex<(System, Pid)>>,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            started: now,
            state: Mutex::new(MonitorState {
                phase_started: now,
                phases: Vec::new(),
                peak_memory_mb: None,
            }),
            #[cfg(feature = "cli")]
            probe: if enabled {
                sysinfo::get_current_pid()
                    .ok()
                    .map(|pid| Mutex::new((System::new(), pid)))
            } else {
                None
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(feature = "cli")]
    fn sample_memory_mb(&self) -> Option<u64> {
        let mut probe = self.probe.as_ref()?.lock().ok()?;
        let (system, pid) = &mut *probe;
        system.refresh_processes(ProcessesToUpdate::Some(&[*pid]), true);
        system.process(*pid).map(|p| p.memory() / 1024 / 1024)
    }

    #[cfg(not(feature = "cli"))]
    fn sample_memory_mb(&self) -> Option<u64> {
        None
    }

    /// Closes the current phase and starts timing the next one.
    pub fn finish_phase(&self, phase: &str) {
        if !self.enabled {
            return;
        }
        let memory_mb = self.sample_memory_mb();
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        let now = Instant::now();
        let stats = PhaseStats {
            phase: phase.to_string(),
            elapsed: now.duration_since(state.phase_started),
            memory_mb,
        };
        state.phase_started = now;
        if let Some(mb) = memory_mb {
            state.peak_memory_mb = Some(state.peak_memory_mb.map_or(mb, |peak| peak.max(mb)));
        }

        match stats.memory_mb {
            Some(mb) => tracing::info!("📊 {} took {:?}, memory {}MB", phase, stats.elapsed, mb),
            None => tracing::info!("📊 {} took {:?}", phase, stats.elapsed),
        }
        state.phases.push(stats);
    }

    pub fn summary(&self) -> Option<RunSummary> {
        if !self.enabled {
            return None;
        }
        let state = self.state.lock().ok()?;
        Some(RunSummary {
            phases: state.phases.clone(),
            total: self.started.elapsed(),
            peak_memory_mb: state.peak_memory_mb,
        })
    }

    pub fn log_summary(&self) {
        if let Some(summary) = self.summary() {
            match summary.peak_memory_mb {
                Some(peak) => tracing::info!(
                    "📊 Run finished in {:?}, peak memory {}MB",
                    summary.total,
                    peak
                ),
                None => tracing::info!("📊 Run finished in {:?}", summary.total),
            }
        }
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let monitor = RunMonitor::default();
        monitor.finish_phase("extract");
        assert!(!monitor.is_enabled());
        assert!(monitor.summary().is_none());
    }

    #[test]
    fn test_enabled_monitor_records_phases_in_order() {
        let monitor = RunMonitor::new(true);
        monitor.finish_phase("extract");
        monitor.finish_phase("transform");

        let summary = monitor.summary().unwrap();
        let phases: Vec<&str> = summary.phases.iter().map(|p| p.phase.as_str()).collect();
        assert_eq!(phases, vec!["extract", "transform"]);
        assert!(summary.total >= summary.phases.iter().map(|p| p.elapsed).sum::<Duration>());
    }
}
