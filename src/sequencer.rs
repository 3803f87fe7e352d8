//! Sequential spawn-then-wait control loop.
//!
//! A run moves through `Idle -> Presenting? -> Launching[i] -> Waiting[i]? ->
//! ... -> Draining -> Done` on a single thread. Sleeping and the splash event
//! pump happen once per tick inside the wait loop and nowhere else.

use crate::config::ProfileOptions;
use crate::diagnostic::Parsed;
use crate::entry::{LaunchEntry, parse_entry};
use crate::progress::{ProgressState, frame_index_of};
use std::io;
use std::thread;
use std::time::Duration;

pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Pause between the last tick and closing the splash.
pub const GRACE_DELAY: Duration = Duration::from_millis(300);

/// Starts programs without waiting for them.
pub trait Spawner {
    /// Returns the process id of the started program.
    fn spawn(&mut self, executable: &str, arguments: &[String]) -> io::Result<u32>;
}

/// The visible progress surface.
pub trait Shell {
    fn show(&mut self) -> eyre::Result<()>;

    /// Number of frames when the animation is a non-looping sequence whose
    /// frame follows the percentage.
    fn frame_count(&self) -> Option<usize>;

    fn update(&mut self, percent: f64, frame: Option<usize>);

    /// Process pending window system events once, without blocking.
    fn pump(&mut self);

    /// False once the window system has taken the surface away.
    fn is_alive(&self) -> bool;

    fn close(&mut self);
}

pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Parsed launch entries and their summed wait time, fixed before launch.
#[derive(Debug, Clone, Default)]
pub struct SequencePlan {
    entries: Vec<LaunchEntry>,
    total_wait_seconds: f64,
}

impl SequencePlan {
    pub fn build(raw_entries: &[String]) -> Parsed<Self> {
        let mut diagnostics = Vec::new();
        let entries: Vec<LaunchEntry> = raw_entries
            .iter()
            .map(|raw| parse_entry(raw).collect_into(&mut diagnostics))
            .collect();
        let total_wait_seconds = entries.iter().map(|e| e.wait_seconds).sum();

        Parsed {
            value: Self { entries, total_wait_seconds },
            diagnostics,
        }
    }

    pub fn entries(&self) -> &[LaunchEntry] {
        &self.entries
    }

    pub fn total_wait_seconds(&self) -> f64 {
        self.total_wait_seconds
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnFailure {
    pub index: usize,
    pub executable: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Process ids of the programs that started, in launch order.
    pub launched: Vec<u32>,
    pub failures: Vec<SpawnFailure>,
    pub ticks: u64,
    pub presented: bool,
}

pub struct Sequencer<P, S> {
    spawner: P,
    sleeper: S,
    tick: Duration,
    grace: Duration,
}

impl<P: Spawner, S: Sleeper> Sequencer<P, S> {
    pub fn new(spawner: P, sleeper: S, tick: Duration) -> Self {
        Self {
            spawner,
            sleeper,
            tick,
            grace: GRACE_DELAY,
        }
    }

    #[cfg(test)]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Launch every entry of `plan` in order.
    ///
    /// `make_shell` is only called when there is something to wait for. A
    /// shell that cannot be created or shown is logged and the run continues
    /// without one.
    pub fn run<Sh, F>(
        &mut self,
        plan: &SequencePlan,
        options: &ProfileOptions,
        make_shell: F,
    ) -> RunReport
    where
        Sh: Shell,
        F: FnOnce(&ProfileOptions) -> eyre::Result<Sh>,
    {
        let mut report = RunReport::default();
        if plan.is_empty() {
            return report;
        }

        let mut shell = if plan.total_wait_seconds() > 0.0 {
            present(options, make_shell)
        } else {
            None
        };
        report.presented = shell.is_some();

        let mut progress = ProgressState::new(plan.total_wait_seconds(), self.tick.as_secs_f64());

        for (index, entry) in plan.entries().iter().enumerate() {
            self.launch(index, entry, &mut report);
            if entry.wait_seconds > 0.0 {
                self.wait(entry.wait_seconds, &mut progress, shell.as_mut(), &mut report);
            }
        }

        if let Some(mut shell) = shell {
            self.sleeper.sleep(self.grace);
            shell.close();
        }
        report
    }

    fn launch(&mut self, index: usize, entry: &LaunchEntry, report: &mut RunReport) {
        log::info!("Launching: {} {}", entry.executable, entry.arguments.join(" "));
        match self.spawner.spawn(&entry.executable, &entry.arguments) {
            Ok(pid) => {
                log::debug!("{} started with pid {}", entry.executable, pid);
                report.launched.push(pid);
            }
            Err(e) => {
                log::error!("Failed to launch {:?}: {}", entry.executable, e);
                report.failures.push(SpawnFailure {
                    index,
                    executable: entry.executable.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    fn wait<Sh: Shell>(
        &mut self,
        wait_seconds: f64,
        progress: &mut ProgressState,
        mut shell: Option<&mut Sh>,
        report: &mut RunReport,
    ) {
        let ticks = (wait_seconds / self.tick.as_secs_f64()).round() as u64;
        for _ in 0..ticks {
            self.sleeper.sleep(self.tick);
            let percent = progress.advance();
            report.ticks += 1;

            if let Some(shell) = shell.as_deref_mut() {
                if shell.is_alive() {
                    let frame = shell.frame_count().map(|count| frame_index_of(percent, count));
                    shell.update(percent, frame);
                }
                shell.pump();
            }
        }
    }
}

fn present<Sh, F>(options: &ProfileOptions, make_shell: F) -> Option<Sh>
where
    Sh: Shell,
    F: FnOnce(&ProfileOptions) -> eyre::Result<Sh>,
{
    let mut shell = match make_shell(options) {
        Ok(shell) => shell,
        Err(e) => {
            log::warn!("Splash unavailable, launching without it: {:#}", e);
            return None;
        }
    };
    if let Err(e) = shell.show() {
        log::warn!("Could not show splash, launching without it: {:#}", e);
        shell.close();
        return None;
    }
    log::info!("Splash screen shown");
    Some(shell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Spawn(String),
        Show,
        Update(f64, Option<usize>),
        Pump,
        Close,
        Sleep(Duration),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct FakeSpawner {
        log: Log,
        failing: Vec<String>,
        next_pid: u32,
    }

    impl Spawner for FakeSpawner {
        fn spawn(&mut self, executable: &str, _arguments: &[String]) -> io::Result<u32> {
            self.log.borrow_mut().push(Event::Spawn(executable.to_string()));
            if executable.is_empty() || self.failing.iter().any(|f| f == executable) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
            }
            self.next_pid += 1;
            Ok(self.next_pid)
        }
    }

    struct FakeSleeper {
        log: Log,
    }

    impl Sleeper for FakeSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.log.borrow_mut().push(Event::Sleep(duration));
        }
    }

    struct FakeShell {
        log: Log,
        frames: Option<usize>,
        alive: bool,
        fail_show: bool,
    }

    impl Shell for FakeShell {
        fn show(&mut self) -> eyre::Result<()> {
            self.log.borrow_mut().push(Event::Show);
            if self.fail_show {
                return Err(eyre::eyre!("no compositor"));
            }
            Ok(())
        }

        fn frame_count(&self) -> Option<usize> {
            self.frames
        }

        fn update(&mut self, percent: f64, frame: Option<usize>) {
            self.log.borrow_mut().push(Event::Update(percent, frame));
        }

        fn pump(&mut self) {
            self.log.borrow_mut().push(Event::Pump);
        }

        fn is_alive(&self) -> bool {
            self.alive
        }

        fn close(&mut self) {
            self.log.borrow_mut().push(Event::Close);
        }
    }

    fn sequencer(log: &Log, failing: &[&str]) -> Sequencer<FakeSpawner, FakeSleeper> {
        Sequencer::new(
            FakeSpawner {
                log: log.clone(),
                failing: failing.iter().map(|s| s.to_string()).collect(),
                next_pid: 100,
            },
            FakeSleeper { log: log.clone() },
            Duration::from_millis(100),
        )
    }

    fn shell(log: &Log) -> FakeShell {
        FakeShell {
            log: log.clone(),
            frames: None,
            alive: true,
            fail_show: false,
        }
    }

    fn plan(entries: &[&str]) -> SequencePlan {
        let raw: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
        SequencePlan::build(&raw).value
    }

    fn percents(log: &Log) -> Vec<f64> {
        log.borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Update(p, _) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn position(log: &Log, wanted: &Event) -> usize {
        log.borrow().iter().position(|e| e == wanted).unwrap()
    }

    #[test]
    fn test_plan_total_wait() {
        let plan = plan(&["a,wait=1.5", "b", "c,wait=oops", "d,wait=2"]);
        assert_eq!(plan.entries().len(), 4);
        assert_eq!(plan.total_wait_seconds(), 3.5);

        let raw = vec!["c,wait=oops".to_string()];
        assert_eq!(SequencePlan::build(&raw).diagnostics.len(), 1);
    }

    #[test]
    fn test_progress_spans_the_whole_sequence() {
        let log: Log = Rc::default();
        let report = sequencer(&log, &[]).run(
            &plan(&["a.exe,wait=1", "b.exe,wait=1"]),
            &ProfileOptions::default(),
            |_| Ok(shell(&log)),
        );

        assert!(report.presented);
        assert_eq!(report.launched, vec![101, 102]);
        assert_eq!(report.ticks, 20);

        let percents = percents(&log);
        assert_eq!(percents.len(), 20);
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert!(percents.iter().all(|p| *p <= 100.0));
        assert_eq!(percents[9], 50.0);
        assert_eq!(percents[19], 100.0);
        assert!(percents[..19].iter().all(|p| *p < 100.0));

        // 50% is reached before the second program starts
        let halfway = position(&log, &Event::Update(50.0, None));
        let second = position(&log, &Event::Spawn("b.exe".to_string()));
        assert!(halfway < second);

        let events = log.borrow();
        assert_eq!(events.first(), Some(&Event::Show));
        assert_eq!(events.last(), Some(&Event::Close));
    }

    #[test]
    fn test_every_tick_sleeps_then_updates_then_pumps() {
        let log: Log = Rc::default();
        sequencer(&log, &[]).run(&plan(&["a,wait=0.2"]), &ProfileOptions::default(), |_| {
            Ok(shell(&log))
        });

        let tick = Duration::from_millis(100);
        let expected = vec![
            Event::Show,
            Event::Spawn("a".to_string()),
            Event::Sleep(tick),
            Event::Update(50.0, None),
            Event::Pump,
            Event::Sleep(tick),
            Event::Update(100.0, None),
            Event::Pump,
            Event::Sleep(GRACE_DELAY),
            Event::Close,
        ];
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn test_no_wait_means_no_presentation() {
        let log: Log = Rc::default();
        let mut created = false;
        let options = ProfileOptions::default();
        let report = sequencer(&log, &[]).run(&plan(&["notepad.exe"]), &options, |_| {
            created = true;
            Ok(shell(&log))
        });

        assert!(!created);
        assert!(!report.presented);
        assert_eq!(report.launched.len(), 1);
        assert_eq!(*log.borrow(), vec![Event::Spawn("notepad.exe".to_string())]);
    }

    #[test]
    fn test_empty_plan_does_nothing() {
        let log: Log = Rc::default();
        let options = ProfileOptions::default();
        let report = sequencer(&log, &[]).run(&plan(&[]), &options, |_| Ok(shell(&log)));
        assert_eq!(report, RunReport::default());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_spawn_failure_does_not_stop_the_sequence() {
        let log: Log = Rc::default();
        let report = sequencer(&log, &["missing.exe"]).run(
            &plan(&["missing.exe,wait=0.1", "b.exe"]),
            &ProfileOptions::default(),
            |_| Ok(shell(&log)),
        );

        assert_eq!(report.launched, vec![101]);
        assert_eq!(
            report.failures,
            vec![SpawnFailure {
                index: 0,
                executable: "missing.exe".to_string(),
                error: "no such file".to_string(),
            }]
        );
        assert!(log.borrow().contains(&Event::Spawn("b.exe".to_string())));
        // The failed entry still waits its configured time
        assert_eq!(report.ticks, 1);
    }

    #[test]
    fn test_frame_follows_percent_for_sequences() {
        let log: Log = Rc::default();
        sequencer(&log, &[]).run(&plan(&["a,wait=0.4"]), &ProfileOptions::default(), |_| {
            Ok(FakeShell {
                frames: Some(5),
                ..shell(&log)
            })
        });

        let frames: Vec<Option<usize>> = log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Update(_, f) => Some(*f),
                _ => None,
            })
            .collect();
        assert_eq!(frames, vec![Some(1), Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn test_shell_failure_falls_back_to_plain_launching() {
        let log: Log = Rc::default();
        let report = sequencer(&log, &[]).run(
            &plan(&["a,wait=0.1", "b"]),
            &ProfileOptions::default(),
            |_| Err::<FakeShell, _>(eyre::eyre!("no display")),
        );
        assert!(!report.presented);
        assert_eq!(report.launched.len(), 2);
        assert_eq!(report.ticks, 1);
        assert!(percents(&log).is_empty());

        let log: Log = Rc::default();
        let options = ProfileOptions::default();
        let report = sequencer(&log, &[]).run(&plan(&["a,wait=0.1"]), &options, |_| {
            Ok(FakeShell {
                fail_show: true,
                ..shell(&log)
            })
        });
        assert!(!report.presented);
        assert!(percents(&log).is_empty());
        assert_eq!(log.borrow().last(), Some(&Event::Sleep(Duration::from_millis(100))));
    }

    #[test]
    fn test_closed_shell_stops_updates_but_keeps_pumping() {
        let log: Log = Rc::default();
        sequencer(&log, &[]).run(&plan(&["a,wait=0.2"]), &ProfileOptions::default(), |_| {
            Ok(FakeShell {
                alive: false,
                ..shell(&log)
            })
        });
        assert!(percents(&log).is_empty());
        let pumps = log.borrow().iter().filter(|e| **e == Event::Pump).count();
        assert_eq!(pumps, 2);
    }

    #[test]
    fn test_tick_count_rounds() {
        let log: Log = Rc::default();
        let report = sequencer(&log, &[]).with_grace(Duration::ZERO).run(
            &plan(&["a,wait=0.26", "b,wait=0.04"]),
            &ProfileOptions::default(),
            |_| Ok(shell(&log)),
        );
        // 0.26s rounds to 3 ticks and 0.04s to none
        assert_eq!(report.ticks, 3);
        assert_eq!(log.borrow().last(), Some(&Event::Close));
    }
}
