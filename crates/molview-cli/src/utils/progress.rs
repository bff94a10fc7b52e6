use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use molview::engine::progress::{Progress, ProgressCallback};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(80);

fn phase_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:.bold.dim} {spinner:.green} {msg}")
        .expect("phase template is valid")
}

fn task_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:.bold.dim} {msg:<20} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed}, eta {eta})",
    )
    .expect("task template is valid")
    .progress_chars("##-")
}

/// Draws engine [`Progress`] events on one terminal line.
///
/// Phases are numbered in the order they start; a task inside a phase swaps the spinner for
/// a bar. `indicatif` bars are shared handles, so clones of the display draw the same line.
#[derive(Clone)]
pub struct ProgressDisplay {
    bar: ProgressBar,
    phases: Arc<AtomicUsize>,
}

impl ProgressDisplay {
    pub fn stderr() -> Self {
        Self::on(ProgressDrawTarget::stderr())
    }

    /// Tracks state without drawing, for non-interactive runs and tests.
    pub fn hidden() -> Self {
        Self::on(ProgressDrawTarget::hidden())
    }

    fn on(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target).with_style(phase_style());
        bar.finish_and_clear();
        Self {
            bar,
            phases: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn callback(&self) -> ProgressCallback<'static> {
        let display = self.clone();
        Box::new(move |event| display.apply(event))
    }

    fn apply(&self, event: Progress) {
        let bar = &self.bar;
        match event {
            Progress::PhaseStart { name } => {
                let number = self.phases.fetch_add(1, Ordering::Relaxed) + 1;
                bar.reset();
                bar.set_length(0);
                bar.set_style(phase_style());
                bar.set_prefix(format!("[{number}]"));
                bar.set_message(name);
                bar.enable_steady_tick(TICK);
            }
            Progress::PhaseFinish => {
                bar.disable_steady_tick();
                bar.finish_with_message("done");
            }
            Progress::TaskStart { total } => {
                bar.disable_steady_tick();
                bar.reset();
                bar.set_style(task_style());
                bar.set_length(total);
            }
            Progress::TaskAdvance { units } => bar.inc(units),
            Progress::TaskFinish => {
                if let Some(length) = bar.length() {
                    bar.set_position(length);
                }
                bar.finish();
            }
            // Between phases the summary replaces the finished line; mid-phase it is printed above.
            Progress::Message(text) if bar.is_finished() => bar.set_message(text),
            Progress::Message(text) => bar.println(format!("  {text}")),
        }
    }
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::stderr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn new_display_is_idle() {
        let display = ProgressDisplay::hidden();
        assert_eq!(display.bar.length(), Some(0));
        assert!(display.bar.is_finished());
        assert_eq!(display.bar.prefix(), "");
    }

    #[test]
    fn phases_are_numbered_in_start_order() {
        let display = ProgressDisplay::hidden();
        let callback = display.callback();

        callback(Progress::PhaseStart {
            name: "Reading structure",
        });
        assert_eq!(display.bar.prefix(), "[1]");
        assert_eq!(display.bar.message(), "Reading structure");
        assert!(!display.bar.is_finished());
        callback(Progress::PhaseFinish);

        callback(Progress::PhaseStart {
            name: "Reading trajectory",
        });
        assert_eq!(display.bar.prefix(), "[2]");
        callback(Progress::PhaseFinish);
        assert_eq!(display.bar.message(), "done");
    }

    #[test]
    fn task_bar_tracks_units_and_fills_on_finish() {
        let display = ProgressDisplay::hidden();
        let callback = display.callback();

        callback(Progress::PhaseStart {
            name: "Bond inference",
        });
        callback(Progress::TaskStart { total: 7 });
        callback(Progress::TaskAdvance { units: 2 });
        callback(Progress::TaskAdvance { units: 3 });
        assert_eq!(display.bar.length(), Some(7));
        assert_eq!(display.bar.position(), 5);

        callback(Progress::TaskFinish);
        assert!(display.bar.is_finished());
        assert_eq!(display.bar.position(), 7);
    }

    #[test]
    fn messages_after_a_phase_replace_the_line() {
        let display = ProgressDisplay::hidden();
        let callback = display.callback();

        callback(Progress::PhaseStart {
            name: "Reading trajectory",
        });
        callback(Progress::Message("printed above".to_string()));
        assert_eq!(display.bar.message(), "Reading trajectory");

        callback(Progress::PhaseFinish);
        callback(Progress::Message("3 trajectory frame(s) loaded".to_string()));
        assert_eq!(display.bar.message(), "3 trajectory frame(s) loaded");
    }

    #[test]
    fn callback_can_be_driven_from_another_thread() {
        let display = ProgressDisplay::hidden();
        let callback = display.callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Worker" });
            callback(Progress::TaskStart { total: 1 });
            callback(Progress::TaskAdvance { units: 1 });
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        assert!(display.bar.is_finished());
        assert_eq!(display.bar.position(), 1);
        assert_eq!(display.bar.prefix(), "[1]");
    }
}
