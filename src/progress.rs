use std::time::{Duration, Instant};

use tracing::info;

use crate::observables::Energies;

/// Logs the start, every tenth of the way through, and the end of a run.
#[derive(Debug)]
pub struct ProgressReporter {
    total_steps: usize,
    interval: usize,
    start: Option<Instant>,
}

impl ProgressReporter {
    pub fn new(total_steps: usize) -> Self {
        ProgressReporter {
            total_steps,
            interval: (total_steps / 10).max(1),
            start: None,
        }
    }

    pub fn start(&mut self, n_particles: usize, ndim: usize) {
        info!("#####################################################");
        info!(
            "Starting run: {} particles in {} dimension(s), {} steps",
            n_particles, ndim, self.total_steps
        );
        info!("#####################################################");
        self.start = Some(Instant::now());
    }

    /// Called after each completed step with the number of steps done so far.
    pub fn log_progress(&self, completed: usize, energies: &Energies) {
        if completed == 0 || (completed % self.interval != 0 && completed != self.total_steps) {
            return;
        }
        let percent = 100.0 * completed as f64 / self.total_steps.max(1) as f64;
        info!(
            "  Step {:>8}/{} ({:5.1}%): T = {:.6}, <KE> = {:.6}, <PE> = {:.6}, <E> = {:.6}",
            completed,
            self.total_steps,
            percent,
            energies.temperature,
            energies.mean_ke,
            energies.mean_pe,
            energies.total()
        );
    }

    pub fn elapsed(&self) -> Duration {
        self.start.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Log the duration of the run and return it.
    pub fn finish(self, completed: usize) -> Duration {
        let duration = self.elapsed();
        info!(
            "Run finished after {} of {} steps in {:.3} s",
            completed,
            self.total_steps,
            duration.as_secs_f64()
        );
        info!("-----------------------------------------------------");
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_is_a_tenth() {
        assert_eq!(ProgressReporter::new(1000).interval, 100);
        assert_eq!(ProgressReporter::new(5).interval, 1);
        assert_eq!(ProgressReporter::new(0).interval, 1);
    }

    #[test]
    fn test_unstarted_reporter_has_no_duration() {
        let reporter = ProgressReporter::new(10);
        assert_eq!(reporter.elapsed(), Duration::ZERO);
        assert_eq!(reporter.finish(0), Duration::ZERO);
    }
}
