//! Control parameters for the search (spec.md §4.8). All fields have the
//! documented defaults; callers may override any of them.

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub population_size: usize,
    pub max_generations: usize,
    pub elite_size: usize,
    /// Penalty multiplier `M` applied per second of deadline overshoot.
    pub penalty_m: f64,
    pub sprint_intensity: f64,
    /// Fraction of tasks eligible to be treated as "critical" in Ambush/elite critical-path.
    pub crit_task_cap: f64,
    pub outer_population: usize,
    pub outer_generations: usize,
    pub latency_weight: f64,
    pub deploy_cost_weight: f64,
    /// Master seed for the splittable PRNG (§5, §9). Two runs with the
    /// same seed over the same inputs must produce byte-identical results.
    pub master_seed: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            population_size: 100,
            max_generations: 200,
            elite_size: 10,
            penalty_m: 1000.0,
            sprint_intensity: 0.8,
            crit_task_cap: 0.3,
            outer_population: 50,
            outer_generations: 100,
            latency_weight: 0.6,
            deploy_cost_weight: 0.4,
            master_seed: 42,
        }
    }
}

/// Large finite fitness/duration value substituted for degenerate kernel
/// inputs (zero MIPS, negative size, non-finite arithmetic). Keeps
/// comparisons total instead of propagating NaN/∞.
pub const UNSCHEDULABLE: f64 = 1e12;
