//! Invariants checked tick by tick over generated workloads.

use std::collections::HashSet;

use multisched::*;

mod common;
use common::{random_workload, XorShift};

const SEEDS: u64 = 64;

/// Invariants that must hold between any two ticks.
fn check_tick_invariants(sim: &Simulator) {
    let tasks = sim.tasks();
    let queues = sim.queues();
    let cpu = sim.dispatcher();

    // Each task is in at most one place.
    let mut seen = HashSet::new();
    for class in ServiceClass::ALL {
        for idx in queues.get(class).ordered() {
            assert!(seen.insert(idx), "{idx:?} queued twice");
            assert_eq!(tasks[idx.0].state, TaskState::Queued);
            assert_eq!(tasks[idx.0].def.class, class);
        }
    }
    if let Some(idx) = cpu.current() {
        assert!(seen.insert(idx), "{idx:?} both queued and running");
        assert_eq!(tasks[idx.0].state, TaskState::Running);
        assert!(tasks[idx.0].remaining > 0);
    }
    let placed = tasks
        .iter()
        .filter(|t| matches!(t.state, TaskState::Queued | TaskState::Running))
        .count();
    assert_eq!(placed, seen.len());

    // High ordered by priority, Medium by remaining time.
    let prios: Vec<_> = queues
        .get(ServiceClass::High)
        .ordered()
        .iter()
        .map(|i| tasks[i.0].def.priority)
        .collect();
    assert!(prios.windows(2).all(|w| w[0] <= w[1]), "High order {prios:?}");
    let remaining: Vec<_> = queues
        .get(ServiceClass::Medium)
        .ordered()
        .iter()
        .map(|i| tasks[i.0].remaining)
        .collect();
    assert!(
        remaining.windows(2).all(|w| w[0] <= w[1]),
        "Medium order {remaining:?}"
    );

    // Low only holds the CPU while High and Medium have nothing queued.
    if let Some(idx) = cpu.current() {
        if tasks[idx.0].def.class == ServiceClass::Low {
            assert!(queues.get(ServiceClass::High).is_empty());
            assert!(queues.get(ServiceClass::Medium).is_empty());
        }
    }

    // Only Low runs without a slice limit.
    let config = sim.config();
    match (cpu.level(), cpu.quantum()) {
        (ServiceClass::Low, q) => assert_eq!(q, Quantum::Unlimited),
        (ServiceClass::High, Quantum::Ticks(n)) => assert!(n <= config.high_slice),
        (ServiceClass::Medium, Quantum::Ticks(n)) => assert!(n <= config.medium_slice),
        (level, q) => panic!("{level} favored with {q:?}"),
    }
}

#[test]
fn test_invariants_hold_every_tick() {
    common::setup_test();
    for seed in 1..=SEEDS {
        let mut rng = XorShift::new(seed);
        let n = rng.range(1, 20) as usize;
        let mut sim = Simulator::new(random_workload(&mut rng, n), SimConfig::default());

        let mut prev_remaining: Vec<Tick> = sim.tasks().iter().map(|t| t.remaining).collect();
        let mut prev_completion: Vec<Option<Tick>> = vec![None; n];
        while sim.step().unwrap() == ClockState::Running {
            check_tick_invariants(&sim);
            for (i, t) in sim.tasks().iter().enumerate() {
                assert!(t.remaining <= prev_remaining[i], "seed {seed}: remaining grew");
                if let Some(c) = prev_completion[i] {
                    assert_eq!(t.completion, Some(c), "seed {seed}: completion moved");
                }
                prev_remaining[i] = t.remaining;
                prev_completion[i] = t.completion;
            }
        }
    }
}

#[test]
fn test_run_accounts_every_tick() {
    common::setup_test();
    for seed in 1..=SEEDS {
        let mut rng = XorShift::new(seed);
        let n = rng.range(1, 20) as usize;
        let result = Simulator::new(random_workload(&mut rng, n), SimConfig::default())
            .run()
            .unwrap();
        let trace = &result.trace;

        assert_eq!(result.stats.completed(), n, "seed {seed}");
        for (i, t) in result.tasks.iter().enumerate() {
            let idx = TaskIdx(i);
            assert!(t.is_completed());
            assert_eq!(trace.total_runtime(idx), t.def.service, "seed {seed}");
            let completion = t.completion.unwrap();
            assert!(completion >= t.def.arrival + t.def.service);
            assert!(trace.first_run(idx).unwrap() >= t.def.arrival);
            // The last tick of service is the one before completion.
            assert!(trace.ran_at(idx, completion - 1));
        }

        // At most one task per tick, and idle ticks are exactly the rest.
        let mut busy = 0;
        for tick in result.start..result.end {
            let running = result
                .tasks
                .iter()
                .enumerate()
                .filter(|(i, _)| trace.ran_at(TaskIdx(*i), tick))
                .count();
            assert!(running <= 1, "seed {seed}: {running} tasks at {tick}");
            busy += running;
        }
        assert_eq!(busy as Tick, result.stats.busy_ticks);
        assert_eq!(
            trace.idle_count() as Tick,
            result.elapsed() - result.stats.busy_ticks
        );

        for s in &result.stats.tasks {
            assert_eq!(s.waiting, s.turnaround.map(|t| t - s.service));
        }
    }
}

#[test]
fn test_halted_is_idempotent() {
    common::setup_test();
    let mut rng = XorShift::new(7);
    let mut sim = Simulator::new(random_workload(&mut rng, 8), SimConfig::default());
    while sim.step().unwrap() == ClockState::Running {}

    let clock = sim.clock();
    let events = sim.trace().events().len();
    for _ in 0..3 {
        assert_eq!(sim.step(), Ok(ClockState::Halted));
    }
    assert_eq!(sim.clock(), clock);
    assert_eq!(sim.trace().events().len(), events);
    assert_eq!(sim.pending(), 0);
    assert!(sim.queues().is_empty());
    assert!(sim.dispatcher().is_idle());
}

#[test]
fn test_generated_runs_are_deterministic() {
    common::setup_test();
    for seed in 1..=8 {
        let make = || {
            let mut rng = XorShift::new(seed);
            let n = rng.range(1, 20) as usize;
            random_workload(&mut rng, n)
        };
        let r1 = Simulator::new(make(), SimConfig::default()).run().unwrap();
        let r2 = Simulator::new(make(), SimConfig::default()).run().unwrap();
        assert_eq!(r1.trace.events(), r2.trace.events());
        assert_eq!(r1.stats, r2.stats);
    }
}

#[test]
fn test_start_time_skips_only_an_idle_tick() {
    common::setup_test();
    let mut rng = XorShift::new(42);
    let mut tasks = random_workload(&mut rng, 12);
    for t in &mut tasks {
        t.arrival = t.arrival.max(1);
    }

    let r0 = Simulator::new(tasks.clone(), SimConfig::default())
        .run()
        .unwrap();
    let r1 = Simulator::new(tasks, SimConfig::default().start_time(1))
        .run()
        .unwrap();

    // Nothing arrives at 0, so starting at 1 only drops the leading idle tick.
    assert_eq!(r0.elapsed(), r1.elapsed() + 1);
    assert_eq!(r0.end, r1.end);
    for (a, b) in r0.tasks.iter().zip(&r1.tasks) {
        assert_eq!(a.completion, b.completion);
    }
    assert_eq!(r0.stats.avg_turnaround(), r1.stats.avg_turnaround());
}
