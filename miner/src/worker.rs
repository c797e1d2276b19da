use std::{io::Write, ops::Range};

use shared::{
    errors::{MinerError, MinerResult},
    types::Address,
};
use tracing::*;

use crate::{
    config::{MinerConfig, NONCE_SPACE},
    hasher::{difficulty_of, PowHash},
    preimage::Preimage,
    sink::ResultSink,
};

/// Everything a worker reads while scanning. Built once at startup and shared
/// by reference count across the worker threads.
pub struct MiningContext<H, W: Write + Send> {
    pub config: MinerConfig,
    pub hasher: H,
    pub sink: ResultSink<W>,
}

/// One worker's share of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub address: Address,
    pub timestamp: u64,
    /// exclusive end, never above `NONCE_SPACE`
    pub range: Range<u64>,
}

/// Split `[0, chunk_size * workers)` into `workers` contiguous chunks that
/// all share one timestamp. The whole round must fit the 32-bit nonce space.
pub fn plan_round(
    address: Address,
    timestamp: u64,
    chunk_size: u32,
    workers: usize,
) -> MinerResult<Vec<Task>> {
    let chunk = chunk_size as u64;
    let total = chunk.checked_mul(workers as u64).filter(|total| *total <= NONCE_SPACE);
    if total.is_none() {
        return Err(MinerError::Config(format!(
            "{workers} workers x {chunk_size} nonces exceeds the 32-bit nonce space"
        )));
    }

    Ok((0..workers as u64)
        .map(|i| Task {
            address,
            timestamp,
            range: chunk * i..chunk * (i + 1),
        })
        .collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkReport {
    pub worker: usize,
    pub hashes: u64,
    pub solutions: usize,
}

pub struct Worker {
    pub id: usize,
}

impl Worker {
    pub fn new(id: usize) -> Self {
        Self { id }
    }

    /// Scan the whole task range in ascending order and append every preimage
    /// whose difficulty value is at or below the threshold. Finding a solution
    /// does not end the scan.
    pub fn search<H, W>(&self, task: &Task, ctx: &MiningContext<H, W>) -> MinerResult<WorkReport>
    where
        H: PowHash,
        W: Write + Send, {
        debug!("worker: {}, task range: {:?}", self.id, task.range);

        if task.range.end > NONCE_SPACE {
            return Err(MinerError::Config(format!(
                "task range {:?} leaves the 32-bit nonce space",
                task.range
            )));
        }

        let mut memory = ctx.hasher.memory();
        let mut preimage = Preimage::build(&task.address, task.timestamp, 0);
        let mut report = WorkReport {
            worker: self.id,
            ..Default::default()
        };

        for nonce in task.range.clone() {
            let nonce = u32::try_from(nonce)
                .map_err(|_| MinerError::Config(format!("nonce {nonce} is not 32-bit")))?;
            preimage.set_nonce(nonce);
            let digest = ctx.hasher.hash_with_memory(&mut memory, preimage.as_bytes())?;
            report.hashes += 1;

            if difficulty_of(&digest) <= ctx.config.difficulty {
                ctx.sink.append(&preimage)?;
                report.solutions += 1;
            }
        }

        trace!("worker: {}, hashes: {}, solutions: {}", self.id, report.hashes, report.solutions);
        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::hasher::{Digest, HASH_LEN};

    /// Digest whose difficulty value equals the nonce of the input.
    pub(crate) struct NonceHasher;

    impl PowHash for NonceHasher {
        type Memory = ();

        fn memory(&self) -> Self::Memory {}

        fn hash_with_memory(&self, _: &mut (), input: &[u8]) -> MinerResult<Digest> {
            let mut digest = [0xeeu8; HASH_LEN];
            digest[..4].copy_from_slice(&input[input.len() - 4..]);
            Ok(digest)
        }
    }

    struct FailingHasher;

    impl PowHash for FailingHasher {
        type Memory = ();

        fn memory(&self) -> Self::Memory {}

        fn hash_with_memory(&self, _: &mut (), _: &[u8]) -> MinerResult<Digest> {
            Err(MinerError::Hash("out of memory".into()))
        }
    }

    pub(crate) fn context<H>(hasher: H, difficulty: u32) -> MiningContext<H, Vec<u8>> {
        let mut config = MinerConfig::new(Address(core::array::from_fn(|i| i as u8 + 1)));
        config.difficulty = difficulty;
        MiningContext {
            config,
            hasher,
            sink: ResultSink::new(vec![]),
        }
    }

    fn reported_nonces(ctx: MiningContext<NonceHasher, Vec<u8>>) -> Vec<u32> {
        let output = ctx.sink.into_inner().unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| line.parse::<Preimage>().unwrap().nonce())
            .collect()
    }

    #[test]
    fn partition_covers_space_once() {
        for workers in [1usize, 2, 3, 7, 16] {
            let tasks = plan_round(Address([0; 20]), 5, 4096, workers).unwrap();
            assert_eq!(tasks.len(), workers);

            let mut seen = HashSet::new();
            let mut next = 0;
            for task in &tasks {
                assert_eq!(task.timestamp, 5);
                assert_eq!(task.range.start, next);
                assert_eq!(task.range.end - task.range.start, 4096);
                next = task.range.end;
                assert!(task.range.clone().all(|nonce| seen.insert(nonce)));
            }
            assert_eq!(next, 4096 * workers as u64);
            assert_eq!(seen.len(), 4096 * workers);
        }
    }

    #[test]
    fn partition_reaches_top_of_nonce_space() {
        let tasks = plan_round(Address([0; 20]), 0, 1 << 31, 2).unwrap();
        assert_eq!(tasks[1].range, (1 << 31)..(1 << 32));
    }

    #[test]
    fn partition_past_nonce_space_is_rejected() {
        let err = plan_round(Address([0; 20]), 0, u32::MAX, 2).unwrap_err();
        assert!(matches!(err, MinerError::Config(_)));
        assert!(plan_round(Address([0; 20]), 0, u32::MAX, usize::MAX).is_err());
    }

    #[test]
    fn range_past_nonce_space_is_not_wrapped() {
        let ctx = context(NonceHasher, u32::MAX);
        let task = Task {
            address: ctx.config.address,
            timestamp: 1,
            range: (1 << 32)..(1 << 32) + 2,
        };

        let err = Worker::new(0).search(&task, &ctx).unwrap_err();
        assert!(matches!(err, MinerError::Config(_)));
        // nothing re-emitted under a wrapped nonce
        assert!(reported_nonces(ctx).is_empty());
    }

    #[test]
    fn predicate_reports_exactly_threshold_and_below() {
        let ctx = context(NonceHasher, 10);
        let task = Task {
            address: ctx.config.address,
            timestamp: 1,
            range: 5..20,
        };

        let report = Worker::new(0).search(&task, &ctx).unwrap();
        assert_eq!(report.hashes, 15);
        assert_eq!(report.solutions, 6);
        assert_eq!(reported_nonces(ctx), vec![5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn scan_continues_after_solution() {
        let ctx = context(NonceHasher, 0);
        let task = Task {
            address: ctx.config.address,
            timestamp: 1,
            range: 0..100,
        };

        let report = Worker::new(3).search(&task, &ctx).unwrap();
        assert_eq!(report, WorkReport { worker: 3, hashes: 100, solutions: 1 });
        assert_eq!(reported_nonces(ctx), vec![0]);
    }

    #[test]
    fn highest_nonce_is_scanned() {
        let ctx = context(NonceHasher, u32::MAX);
        let task = Task {
            address: ctx.config.address,
            timestamp: 1,
            range: (u32::MAX as u64 - 1)..(1 << 32),
        };

        Worker::new(0).search(&task, &ctx).unwrap();
        assert_eq!(reported_nonces(ctx), vec![u32::MAX - 1, u32::MAX]);
    }

    #[test]
    fn hash_failure_stops_worker() {
        let ctx = context(FailingHasher, u32::MAX);
        let task = Task {
            address: ctx.config.address,
            timestamp: 1,
            range: 0..10,
        };

        let err = Worker::new(0).search(&task, &ctx).unwrap_err();
        assert!(matches!(err, MinerError::Hash(_)));
    }
}
