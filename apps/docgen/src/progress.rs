//! Progress reporting for generation runs.
//!
//! Reporters are called synchronously from the pipeline and must return
//! quickly; writing into a shared status record is the expected use.

use std::sync::Mutex;

use tracing::info;

pub trait ProgressReporter: Send + Sync {
    /// `fraction` is in `[0, 1]`.
    fn report(&self, fraction: f32, message: &str);
}

impl<F> ProgressReporter for F
where
    F: Fn(f32, &str) + Send + Sync,
{
    fn report(&self, fraction: f32, message: &str) {
        self(fraction, message)
    }
}

/// Logs every report at `info`.
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, fraction: f32, message: &str) {
        info!(progress = fraction, "{}", message);
    }
}

/// Wraps a reporter so that forwarded fractions are clamped to `[0, 1]` and
/// never go backwards.
pub struct Monotonic<R> {
    inner: R,
    last: Mutex<f32>,
}

impl<R: ProgressReporter> Monotonic<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            last: Mutex::new(0.0),
        }
    }
}

impl<R: ProgressReporter> ProgressReporter for Monotonic<R> {
    fn report(&self, fraction: f32, message: &str) {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let value = {
            let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
            *last = last.max(fraction);
            *last
        };
        self.inner.report(value, message);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::ProgressReporter;

    /// Records every report for later assertions.
    #[derive(Default)]
    pub struct RecordingProgress {
        pub events: Mutex<Vec<(f32, String)>>,
    }

    impl RecordingProgress {
        pub fn fractions(&self) -> Vec<f32> {
            self.events.lock().unwrap().iter().map(|(f, _)| *f).collect()
        }

        pub fn messages(&self) -> Vec<String> {
            self.events.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
        }
    }

    impl ProgressReporter for RecordingProgress {
        fn report(&self, fraction: f32, message: &str) {
            self.events.lock().unwrap().push((fraction, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingProgress;
    use super::*;

    #[test]
    fn test_monotonic_never_decreases() {
        let monotonic = Monotonic::new(RecordingProgress::default());
        for f in [0.1, 0.3, 0.2, 0.5, -1.0, 4.0, 0.9] {
            monotonic.report(f, "step");
        }
        assert_eq!(monotonic.inner.fractions(), vec![0.1, 0.3, 0.3, 0.5, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_closure_is_a_reporter() {
        let seen = Mutex::new(Vec::new());
        let reporter = |f: f32, m: &str| seen.lock().unwrap().push(format!("{f}:{m}"));
        reporter.report(0.5, "half");
        assert_eq!(seen.lock().unwrap().as_slice(), ["0.5:half"]);
    }
}
