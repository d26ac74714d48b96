//! Bounded worker pool with a single-collector fan-in.
//!
//! Each item becomes one task on a fixed-size rayon pool. Tasks never share
//! state; they send their output over a channel and the calling thread is
//! the only writer of the collected results.

use crate::error::ScanError;
use crossbeam_channel::unbounded;
use rayon::{ThreadPool, ThreadPoolBuilder};

pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self, ScanError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("scan-worker-{i}"))
            .build()
            .map_err(|e| ScanError::WorkerPool(e.to_string()))?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `task` once per item and return the outputs in input order
    pub fn run<I, T, F>(&self, items: Vec<I>, task: F) -> Vec<T>
    where
        I: Send,
        T: Send,
        F: Fn(I) -> T + Sync,
    {
        let expected = items.len();
        let (tx, rx) = unbounded();

        self.pool.scope(|scope| {
            for (index, item) in items.into_iter().enumerate() {
                let tx = tx.clone();
                let task = &task;
                scope.spawn(move |_| {
                    // Receiver outlives the scope, so sending cannot fail
                    let _ = tx.send((index, task(item)));
                });
            }
        });
        drop(tx);

        let mut collected: Vec<(usize, T)> = Vec::with_capacity(expected);
        collected.extend(rx.iter());
        collected.sort_by_key(|(index, _)| *index);
        collected.into_iter().map(|(_, output)| output).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn outputs_keep_input_order() {
        let pool = WorkerPool::new(4).unwrap();
        let out = pool.run((0..100).collect(), |n: u32| n * 2);
        assert_eq!(out, (0..100).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn every_item_runs_exactly_once() {
        let pool = WorkerPool::new(3).unwrap();
        let counter = AtomicUsize::new(0);
        let out = pool.run(vec!["a"; 50], |s| {
            counter.fetch_add(1, Ordering::SeqCst);
            s.len()
        });
        assert_eq!(out.len(), 50);
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn pool_size_is_bounded() {
        let pool = WorkerPool::new(2).unwrap();
        let threads = Mutex::new(HashSet::new());
        pool.run((0..64).collect(), |_: u32| {
            let name = std::thread::current().name().map(str::to_string);
            threads.lock().unwrap().insert(name);
        });
        assert!(threads.lock().unwrap().len() <= 2);
        assert_eq!(pool.workers(), 2);
    }

    #[test]
    fn empty_input_is_fine() {
        let pool = WorkerPool::new(1).unwrap();
        let out: Vec<u8> = pool.run(Vec::<u8>::new(), |b| b);
        assert!(out.is_empty());
    }
}
