//! The look-ahead scheduler.
//!
//! A single-threaded cooperative loop: each `tick` drains the command
//! queue, queries the active pattern over the span between the last
//! scheduled point and `now + look_ahead`, and emits every onset to the
//! sink with an absolute trigger time. Because the scheduled-to mark
//! only ever advances, no arc is queried twice and no event is emitted
//! twice; a late tick just covers a larger arc.

use crate::clock::Clock;
use crate::diag::Diag;
use crate::sink::Sink;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use weft_core::{silence, Pattern, Rational, State, TimeSpan};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Cycles per second.
    pub cps: Rational,
    /// How far past `now` each tick schedules.
    pub look_ahead: Duration,
    /// Expected tick period; also the query time budget.
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            cps: Rational::new(1, 2),
            look_ahead: Duration::from_millis(100),
            interval: Duration::from_millis(50),
        }
    }
}

enum Command {
    /// Swap in a pattern at the next cycle boundary.
    Play(Pattern),
    /// Silence everything and flush the sink.
    Stop,
    /// Change tempo, preserving phase.
    SetCps(Rational),
    /// Jump to a cycle position.
    Seek(Rational),
}

/// Clonable command endpoint for other threads (REPL, bridges). All
/// mutation goes through the queue; the scheduler applies commands at
/// tick boundaries.
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: Sender<Command>,
}

impl SchedulerHandle {
    pub fn play(&self, pattern: Pattern) {
        let _ = self.sender.send(Command::Play(pattern));
    }

    pub fn stop(&self) {
        let _ = self.sender.send(Command::Stop);
    }

    pub fn set_cps(&self, cps: Rational) {
        let _ = self.sender.send(Command::SetCps(cps));
    }

    pub fn seek(&self, cycle: Rational) {
        let _ = self.sender.send(Command::Seek(cycle));
    }
}

pub struct Scheduler {
    clock: Arc<dyn Clock>,
    sink: Arc<dyn Sink>,

    cps: Rational,
    look_ahead: Duration,
    interval: Duration,

    active: Pattern,
    pending: Option<Pattern>,
    /// Pattern time scheduled so far; never moves backwards.
    last_scheduled_to: Rational,

    /// Anchor tying an instant to a cycle position. Re-anchored on
    /// tempo changes so phase is preserved.
    origin_instant: Instant,
    origin_cycle: Rational,

    commands: Receiver<Command>,
    command_sender: Sender<Command>,
    diags: Sender<Diag>,
    diag_receiver: Receiver<Diag>,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>, sink: Arc<dyn Sink>, config: SchedulerConfig) -> Self {
        assert!(
            !config.cps.is_zero() && !config.cps.is_negative(),
            "cps must be positive"
        );
        let (command_sender, commands) = unbounded();
        let (diags, diag_receiver) = unbounded();
        let origin_instant = clock.epoch();
        Scheduler {
            clock,
            sink,
            cps: config.cps,
            look_ahead: config.look_ahead,
            interval: config.interval,
            active: silence(),
            pending: None,
            last_scheduled_to: Rational::zero(),
            origin_instant,
            origin_cycle: Rational::zero(),
            commands,
            command_sender,
            diags,
            diag_receiver,
        }
    }

    /// A clonable command endpoint.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            sender: self.command_sender.clone(),
        }
    }

    /// Diagnostics produced by ticks; receivers may be cloned freely.
    pub fn diagnostics(&self) -> Receiver<Diag> {
        self.diag_receiver.clone()
    }

    pub fn cps(&self) -> Rational {
        self.cps
    }

    /// Enqueue a pattern; it starts at the next integer cycle.
    pub fn play(&self, pattern: Pattern) {
        self.handle().play(pattern);
    }

    pub fn stop(&self) {
        self.handle().stop();
    }

    pub fn set_cps(&self, cps: Rational) {
        self.handle().set_cps(cps);
    }

    /// One scheduling step. Host timers (or audio callbacks) call this
    /// roughly every `interval`; nothing blocks.
    pub fn tick(&mut self) {
        self.drain_commands();

        let now = self.clock.now();
        let window_end = self.cycle_at(now + self.look_ahead);
        let window_begin = self.last_scheduled_to;
        if window_end <= window_begin {
            return;
        }

        if self.pending.is_some() {
            // Swap exactly at the first integer cycle inside the window.
            let boundary = ceil_cycle(window_begin);
            if boundary < window_end {
                if boundary > window_begin {
                    self.schedule(window_begin, boundary);
                }
                self.active = self.pending.take().expect("pending checked");
                self.schedule(boundary, window_end);
            } else {
                self.schedule(window_begin, window_end);
            }
        } else {
            self.schedule(window_begin, window_end);
        }

        self.last_scheduled_to = window_end;
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::Play(pattern) => {
                    self.pending = Some(pattern);
                }
                Command::Stop => {
                    self.pending = None;
                    self.active = silence();
                    let grace = self.clock.now() + self.look_ahead;
                    self.sink.flush(grace);
                }
                Command::SetCps(cps) => {
                    if cps.is_zero() || cps.is_negative() {
                        self.report(Diag::eval(format!(
                            "cps must be positive, got {}",
                            cps
                        )));
                        continue;
                    }
                    // Re-anchor at the current moment so the phase is
                    // unchanged; only the future stretches.
                    let now = self.clock.now();
                    self.origin_cycle = self.cycle_at(now);
                    self.origin_instant = now;
                    self.cps = cps;
                }
                Command::Seek(cycle) => {
                    let now = self.clock.now();
                    self.origin_instant = now;
                    self.origin_cycle = cycle;
                    self.last_scheduled_to = cycle;
                }
            }
        }
    }

    /// Query one window and emit its onsets.
    fn schedule(&mut self, begin: Rational, end: Rational) {
        let state = State::new(TimeSpan::new(begin, end));
        let pattern = self.active.clone();

        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| pattern.query(&state)));
        let elapsed = started.elapsed();

        let mut haps = match outcome {
            Ok(haps) => haps,
            Err(payload) => {
                let detail = panic_message(&payload);
                log::error!("pattern query panicked: {}", detail);
                self.report(Diag::eval(format!("pattern query panicked: {}", detail)));
                return;
            }
        };

        if elapsed > self.interval {
            log::warn!(
                "query of {} -> {} took {:?}, over the {:?} budget; window skipped",
                begin,
                end,
                elapsed,
                self.interval
            );
            self.report(Diag::timing(format!(
                "query took {:?}, over the {:?} tick budget",
                elapsed, self.interval
            )));
            return;
        }

        // Time order across layers; the stable sort keeps stack
        // argument order for simultaneous events.
        haps.sort_by(|a, b| a.part.begin.cmp(&b.part.begin));

        for hap in haps {
            // Only onsets trigger; tails of events already started and
            // analog samples are the sink's business to interpolate.
            if !hap.has_onset() || hap.part.is_empty() {
                continue;
            }
            let time = self.instant_at(hap.part.begin);
            let length = (hap.whole_or_part().duration() / self.cps).to_f64();
            let duration = Duration::from_secs_f64(length.max(0.0));

            if let Err(err) = self.sink.emit(time, &hap.value, duration, &hap.context) {
                log::warn!("sink rejected event: {}", err);
                self.report(Diag::sink(err.to_string()));
            }
        }
    }

    fn report(&self, diag: Diag) {
        let _ = self.diags.send(diag);
    }

    /// Pattern time at an instant.
    fn cycle_at(&self, instant: Instant) -> Rational {
        let seconds = instant
            .saturating_duration_since(self.origin_instant)
            .as_secs_f64();
        self.origin_cycle + Rational::approximate(seconds) * self.cps
    }

    /// Wall-clock time of a cycle position.
    fn instant_at(&self, cycle: Rational) -> Instant {
        let seconds = ((cycle - self.origin_cycle) / self.cps).to_f64();
        if seconds >= 0.0 {
            self.origin_instant + Duration::from_secs_f64(seconds)
        } else {
            self.origin_instant
                .checked_sub(Duration::from_secs_f64(-seconds))
                .unwrap_or(self.origin_instant)
        }
    }
}

/// The first integer cycle at or after `t`.
fn ceil_cycle(t: Rational) -> Rational {
    t.ceil()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Drive a scheduler against real time for `duration`, sleeping one
/// interval between ticks. Blocks the calling thread; the CLI's `run`
/// command uses this.
pub fn run_for(scheduler: &mut Scheduler, duration: Duration) {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        scheduler.tick();
        std::thread::sleep(scheduler.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sink::MemorySink;
    use weft_core::{pure, Value};

    fn rig(cps: Rational) -> (Scheduler, Arc<ManualClock>, Arc<MemorySink>) {
        let clock = Arc::new(ManualClock::new());
        let sink = Arc::new(MemorySink::new());
        let scheduler = Scheduler::new(
            clock.clone(),
            sink.clone(),
            SchedulerConfig {
                cps,
                look_ahead: Duration::from_millis(100),
                interval: Duration::from_millis(50),
            },
        );
        (scheduler, clock, sink)
    }

    fn step(scheduler: &mut Scheduler, clock: &ManualClock, ticks: usize) {
        for _ in 0..ticks {
            scheduler.tick();
            clock.advance(Duration::from_millis(50));
        }
    }

    #[test]
    fn empty_scheduler_emits_nothing() {
        let (mut scheduler, clock, sink) = rig(Rational::one());
        step(&mut scheduler, &clock, 10);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn play_takes_effect_at_cycle_boundary() {
        let (mut scheduler, clock, sink) = rig(Rational::one());
        scheduler.play(pure(Value::from("x")));
        step(&mut scheduler, &clock, 25); // 1.25 s of wall time

        let events = sink.events();
        // Cycle onsets at 0s and 1s, each exactly once.
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].time, clock.epoch());
        assert_eq!(
            events[1].time,
            clock.epoch() + Duration::from_secs(1)
        );
        assert_eq!(events[0].duration, Duration::from_secs(1));
    }

    #[test]
    fn late_ticks_do_not_drop_events() {
        let (mut scheduler, clock, sink) = rig(Rational::one());
        scheduler.play(pure(Value::from("x")));
        scheduler.tick();
        // A stall: three intervals pass without a tick.
        clock.advance(Duration::from_millis(2150));
        scheduler.tick();

        let events = sink.events();
        // Onsets at 0, 1 and 2 are all present despite the stall.
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].time, clock.epoch() + Duration::from_secs(2));
    }

    #[test]
    fn windows_never_overlap() {
        let (mut scheduler, clock, sink) = rig(Rational::one());
        scheduler.play(
            pure(Value::from("x")).fast(Rational::from_integer(16)),
        );
        step(&mut scheduler, &clock, 45);

        let events = sink.events();
        let mut times: Vec<Instant> = events.iter().map(|e| e.time).collect();
        let mut deduped = times.clone();
        deduped.dedup();
        assert_eq!(times, deduped, "duplicate trigger times");
        times.sort();
        assert_eq!(
            times,
            events.iter().map(|e| e.time).collect::<Vec<_>>(),
            "events out of order"
        );
    }
}
