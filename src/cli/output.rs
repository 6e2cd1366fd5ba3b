//! Logging setup

use std::fmt;
use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Stamps every log line with the wall time elapsed since logging started,
/// so step timings can be read straight off the log.
struct RunClock {
    start: Instant,
}

impl RunClock {
    fn new() -> Self {
        RunClock {
            start: Instant::now(),
        }
    }
}

impl FormatTime for RunClock {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", clock_label(self.start.elapsed()))
    }
}

fn clock_label(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("+{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Route log output to a file, or to stdout when no path is given
pub fn setup_output(output_path: Option<&String>) -> Result<()> {
    match output_path {
        Some(path) => {
            let log = File::create(path)
                .wrap_err_with(|| format!("Could not create log file: {}", path))?;
            let file_layer = layer()
                .with_writer(Mutex::new(log))
                .with_timer(RunClock::new())
                .with_ansi(false);
            Registry::default().with(file_layer).init();
            info!("Simulation log written to: {}", path);
        }
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(RunClock::new())
                .with_ansi(true);
            Registry::default().with(stdout_layer).init();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_label() {
        assert_eq!(clock_label(Duration::from_millis(900)), "+00:00:00");
        assert_eq!(clock_label(Duration::from_secs(3725)), "+01:02:05");
        assert_eq!(clock_label(Duration::from_secs(90_000)), "+25:00:00");
    }
}
