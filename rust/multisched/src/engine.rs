//! Tick-driven simulation engine.
//!
//! This is the core of the simulator. It owns the task table, the arrival
//! feed, the level queues, the CPU slot and the trace, and advances the
//! clock one tick at a time. Each tick runs, in order:
//!
//! 1. release of due arrivals into their level queues;
//! 2. selection (idle CPU) or preemption check (busy CPU);
//! 3. one tick of execution;
//! 4. the slice-expiry check.
//!
//! A run is a pure function of the task list and the [`SimConfig`], so two
//! simulators built from the same inputs produce identical traces.

use std::cell::Cell;
use std::io::{self, Write};

use bitvec::slice::BitSlice;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::cpu::Dispatcher;
use crate::feed::ArrivalFeed;
use crate::perfetto;
use crate::queue::LevelQueues;
use crate::stats::{RunStats, TaskStats};
use crate::task::{task_mut, SimTask, TaskDef, TaskState};
use crate::trace::{Trace, TraceKind};
use crate::types::{SchedError, ServiceClass, TaskIdx, Tick};

thread_local! {
    static SIM_CLOCK: Cell<Tick> = const { Cell::new(0) };
}

/// Current simulated tick on this thread, for log formatting.
pub fn sim_clock() -> Tick {
    SIM_CLOCK.with(|c| c.get())
}

/// Update the tick shown by the log formatter. Called by the engine at the
/// start of every tick.
pub fn set_sim_clock(tick: Tick) {
    SIM_CLOCK.with(|c| c.set(tick));
}

/// Driver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Running,
    /// Feed, queues and CPU are all empty. Further steps are no-ops.
    Halted,
}

/// Scheduler context: everything one simulation mutates.
#[derive(Debug)]
pub struct Simulator {
    config: SimConfig,
    tasks: Vec<SimTask>,
    feed: ArrivalFeed,
    queues: LevelQueues,
    cpu: Dispatcher,
    trace: Trace,
    clock: Tick,
    state: ClockState,
}

impl Simulator {
    /// Build a simulator over an already-validated task list. Input order
    /// is kept: it decides release order among same-tick arrivals.
    pub fn new(defs: Vec<TaskDef>, config: SimConfig) -> Self {
        let tasks: Vec<SimTask> = defs.into_iter().map(SimTask::new).collect();
        let trace = Trace::new(config.start_time, tasks.iter().map(|t| t.def.id.clone()));
        let feed = ArrivalFeed::new((0..tasks.len()).map(TaskIdx).collect());
        Simulator {
            cpu: Dispatcher::new(config.high_slice, config.medium_slice),
            queues: LevelQueues::new(),
            clock: config.start_time,
            state: ClockState::Running,
            config,
            tasks,
            feed,
            trace,
        }
    }

    pub fn clock(&self) -> Tick {
        self.clock
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tasks(&self) -> &[SimTask] {
        &self.tasks
    }

    pub fn queues(&self) -> &LevelQueues {
        &self.queues
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.cpu
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Number of tasks that have not arrived yet.
    pub fn pending(&self) -> usize {
        self.feed.len()
    }

    fn has_work(&self) -> bool {
        !self.feed.is_empty() || !self.queues.is_empty() || !self.cpu.is_idle()
    }

    /// Advance the clock by one tick.
    pub fn step(&mut self) -> Result<ClockState, SchedError> {
        if self.state == ClockState::Halted {
            return Ok(ClockState::Halted);
        }
        if !self.has_work() {
            self.halt();
            return Ok(self.state);
        }

        set_sim_clock(self.clock);
        self.release_arrivals()?;
        if self.cpu.is_idle() {
            self.dispatch()?;
        } else {
            self.check_preempt()?;
        }
        self.execute()?;
        self.check_timeout()?;
        self.clock += 1;

        if !self.has_work() {
            self.halt();
        }
        Ok(self.state)
    }

    /// Step until halted and collect the results.
    pub fn run(mut self) -> Result<SimulationResult, SchedError> {
        while self.step()? == ClockState::Running {}
        Ok(self.into_result())
    }

    fn halt(&mut self) {
        self.state = ClockState::Halted;
        self.trace.finish(self.clock);
        set_sim_clock(self.clock);
        info!(
            elapsed = self.clock - self.config.start_time,
            tasks = self.tasks.len(),
            "halted"
        );
    }

    /// Move every due task from the feed into its level queue.
    fn release_arrivals(&mut self) -> Result<(), SchedError> {
        for idx in self.feed.release(self.clock, &self.tasks) {
            let task = task_mut(&mut self.tasks, idx)?;
            task.state = TaskState::Queued;
            self.queues.enqueue(idx, task);
            debug!(task = %task.def.id, class = %task.def.class, "arrive");
            self.trace
                .record(self.clock, TraceKind::TaskArrived { task: idx });
        }
        Ok(())
    }

    fn dispatch(&mut self) -> Result<(), SchedError> {
        let from = self.cpu.level();
        let Some(idx) = self.cpu.select(&mut self.queues)? else {
            return Ok(());
        };
        self.note_level_switch(from);

        let level = self.cpu.level();
        let task = task_mut(&mut self.tasks, idx)?;
        task.state = TaskState::Running;
        debug!(
            task = %task.def.id,
            level = %level,
            quantum = ?self.cpu.quantum(),
            remaining = task.remaining,
            "dispatch"
        );
        self.trace
            .record(self.clock, TraceKind::TaskDispatched { task: idx, level });
        Ok(())
    }

    fn check_preempt(&mut self) -> Result<(), SchedError> {
        let from = self.cpu.level();
        let Some(p) = self.cpu.check_preempt(&mut self.queues, &self.tasks)? else {
            return Ok(());
        };
        self.note_level_switch(from);

        task_mut(&mut self.tasks, p.preempted)?.state = TaskState::Queued;
        task_mut(&mut self.tasks, p.next)?.state = TaskState::Running;
        debug!(
            task = %self.tasks[p.preempted.0].def.id,
            by = %self.tasks[p.next.0].def.id,
            "preempt"
        );
        self.trace.record(
            self.clock,
            TraceKind::TaskPreempted {
                task: p.preempted,
                by: p.next,
            },
        );
        Ok(())
    }

    /// Run the CPU slot's task for one tick.
    fn execute(&mut self) -> Result<(), SchedError> {
        let Some(idx) = self.cpu.current() else {
            self.trace.record(self.clock, TraceKind::CpuIdle);
            return Ok(());
        };

        self.trace.mark_running(idx, self.clock);
        let task = task_mut(&mut self.tasks, idx)?;
        if task.run_one(self.clock) {
            debug!(task = %task.def.id, completion = ?task.completion, "complete");
            self.cpu.release();
            self.trace
                .record(self.clock, TraceKind::TaskCompleted { task: idx });
        }
        self.cpu.account_tick();
        Ok(())
    }

    fn check_timeout(&mut self) -> Result<(), SchedError> {
        let from = self.cpu.level();
        let Some(idx) = self.cpu.check_timeout(&mut self.queues, &self.tasks)? else {
            return Ok(());
        };

        let task = task_mut(&mut self.tasks, idx)?;
        task.state = TaskState::Queued;
        debug!(task = %task.def.id, remaining = task.remaining, "slice expired");
        self.trace
            .record(self.clock, TraceKind::SliceExpired { task: idx });
        self.note_level_switch(from);
        Ok(())
    }

    fn note_level_switch(&mut self, from: ServiceClass) {
        let to = self.cpu.level();
        if to != from {
            debug!(from = %from, to = %to, quantum = ?self.cpu.quantum(), "level");
            self.trace
                .record(self.clock, TraceKind::LevelSwitched { from, to });
        }
    }

    fn into_result(self) -> SimulationResult {
        let start = self.config.start_time;
        let stats = RunStats::compute(&self.tasks, &self.trace, self.clock - start);
        SimulationResult {
            config: self.config,
            tasks: self.tasks,
            trace: self.trace,
            stats,
            start,
            end: self.clock,
        }
    }
}

/// Everything a finished run exposes to reporting.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub config: SimConfig,
    pub tasks: Vec<SimTask>,
    pub trace: Trace,
    pub stats: RunStats,
    /// First simulated tick.
    pub start: Tick,
    /// Clock value at halt.
    pub end: Tick,
}

impl SimulationResult {
    /// Total simulated ticks.
    pub fn elapsed(&self) -> Tick {
        self.end - self.start
    }

    /// Handle of the task with identifier `id`.
    pub fn find(&self, id: &str) -> Option<TaskIdx> {
        self.tasks
            .iter()
            .position(|t| t.def.id.as_str() == id)
            .map(TaskIdx)
    }

    pub fn task(&self, id: &str) -> Option<&SimTask> {
        self.find(id).map(|idx| &self.tasks[idx.0])
    }

    /// Occupancy bitmap of a task, one bit per simulated tick.
    pub fn occupancy(&self, id: &str) -> Option<&BitSlice> {
        self.find(id)
            .and_then(|idx| self.trace.entry(idx))
            .map(|t| t.occupancy())
    }

    /// Absolute ticks at which a task held the CPU.
    pub fn run_ticks(&self, id: &str) -> Vec<Tick> {
        self.occupancy(id).map_or_else(Vec::new, |bits| {
            bits.iter_ones().map(|i| self.start + i as Tick).collect()
        })
    }

    pub fn task_stats(&self, id: &str) -> Option<&TaskStats> {
        self.stats.tasks.iter().find(|s| s.id.as_str() == id)
    }

    /// Write the run as Chrome Trace Event Format JSON for ui.perfetto.dev.
    pub fn write_perfetto_json(&self, writer: &mut impl Write) -> io::Result<()> {
        perfetto::write_json(self, writer)
    }
}
