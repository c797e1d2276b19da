use tracing::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateReport {
    pub round: u64,
    pub hashes: u64,
    /// clamped to at least 1 ms
    pub elapsed_ms: u64,
    /// hashes per second
    pub rate: u64,
    pub seconds_per_solution: f64,
    pub solutions: usize,
}

impl RateReport {
    pub fn compute(start_ms: u64, end_ms: u64, hashes: u64, difficulty: u32) -> Self {
        let elapsed_ms = end_ms.saturating_sub(start_ms).max(1);
        let rate = hashes.saturating_mul(1000) / elapsed_ms;
        // chance that a uniform 32-bit value is <= difficulty is (difficulty + 1) / 2^32
        let hashes_per_solution = (1u64 << 32) as f64 / (difficulty as f64 + 1.0);
        let seconds_per_solution = hashes_per_solution / rate as f64;

        Self {
            round: 0,
            hashes,
            elapsed_ms,
            rate,
            seconds_per_solution,
            solutions: 0,
        }
    }

    pub fn kilo_hashes(&self) -> f64 {
        self.rate as f64 / 1000.0
    }

    pub fn hours_per_solution(&self) -> f64 {
        self.seconds_per_solution / 3600.0
    }
}

/// Throughput log after each round, plus running totals.
pub struct RateReporter {
    difficulty: u32,
    rounds: u64,
    total_hashes: u64,
    total_solutions: usize,
}

impl RateReporter {
    pub fn new(difficulty: u32) -> Self {
        Self {
            difficulty,
            rounds: 0,
            total_hashes: 0,
            total_solutions: 0,
        }
    }

    pub fn report(&mut self, start_ms: u64, end_ms: u64, hashes: u64, solutions: usize) -> RateReport {
        self.rounds += 1;
        self.total_hashes += hashes;
        self.total_solutions += solutions;

        let report = RateReport {
            round: self.rounds,
            solutions,
            ..RateReport::compute(start_ms, end_ms, hashes, self.difficulty)
        };

        info!(
            "Hash rate: {:.1} kH/s, {:.1} hours per sol",
            report.kilo_hashes(),
            report.hours_per_solution()
        );
        debug!(
            "round: {}, elapsed: {} ms, total hashes: {}, total solutions: {}",
            self.rounds, report.elapsed_ms, self.total_hashes, self.total_solutions
        );
        report
    }

    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    pub fn total_solutions(&self) -> usize {
        self.total_solutions
    }
}
