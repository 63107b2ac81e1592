#![allow(dead_code)]

use multisched::{init_tracing, ServiceClass, SimConfig, SimulationResult, Simulator, TaskDef, Tick};

/// Initialize tracing from `RUST_LOG`. Idempotent across tests.
pub fn setup_test() {
    init_tracing();
}

/// Shorthand for `TaskDef::new` with a single-letter class code.
pub fn task(id: &str, class: char, arrival: Tick, service: Tick, priority: u32) -> TaskDef {
    let class = match class {
        'H' => ServiceClass::High,
        'M' => ServiceClass::Medium,
        'L' => ServiceClass::Low,
        other => panic!("bad class code {other:?}"),
    };
    TaskDef::new(id, class, arrival, service, priority)
}

/// Run with the default configuration.
pub fn run(tasks: Vec<TaskDef>) -> SimulationResult {
    run_with(tasks, SimConfig::default())
}

pub fn run_with(tasks: Vec<TaskDef>, config: SimConfig) -> SimulationResult {
    let result = Simulator::new(tasks, config)
        .run()
        .expect("simulation hit an invariant violation");
    if std::env::var_os("MULTISCHED_DUMP").is_some() {
        result.trace.dump();
    }
    result
}

/// Absolute ticks `range`, for comparing against `run_ticks`.
pub fn ticks(range: std::ops::Range<Tick>) -> Vec<Tick> {
    range.collect()
}

/// Tiny deterministic PRNG for generated workloads.
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        XorShift(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform in `lo..=hi`.
    pub fn range(&mut self, lo: u32, hi: u32) -> u32 {
        lo + (self.next_u64() % u64::from(hi - lo + 1)) as u32
    }
}

/// A random but valid workload of `n` tasks with distinct ids.
pub fn random_workload(rng: &mut XorShift, n: usize) -> Vec<TaskDef> {
    (0..n)
        .map(|i| {
            let letter = (b'A' + (i / 10) as u8) as char;
            let id = format!("{letter}{}", i % 10);
            let class = match rng.range(0, 2) {
                0 => 'H',
                1 => 'M',
                _ => 'L',
            };
            task(
                &id,
                class,
                rng.range(0, 30),
                rng.range(1, 30),
                rng.range(1, 10),
            )
        })
        .collect()
}
