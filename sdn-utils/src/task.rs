//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A spawned background task that is aborted when dropped.
///
/// Wraps [`tokio::task::JoinHandle`] so that forgetting to explicitly
/// cancel a task can never leak it past the lifetime of whatever owns
/// the handle.
#[derive(Debug)]
pub struct Task<T> {
    handle: JoinHandle<T>,
}

impl<T> Task<T> {
    pub fn spawn<F>(future: F) -> Task<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::spawn(future);
        Task { handle }
    }
}

impl<T> Drop for Task<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A one-shot timer that runs the given closure once after `duration`
/// elapses, unless dropped first.
#[derive(Debug)]
pub struct TimeoutTask {
    handle: JoinHandle<()>,
}

impl TimeoutTask {
    pub fn new<F>(duration: Duration, callback: F) -> TimeoutTask
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            callback();
        });
        TimeoutTask { handle }
    }

    /// Resets the deadline to `duration` from now, cancelling any
    /// previously scheduled firing.
    pub fn reset<F>(&mut self, duration: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.abort();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            callback();
        });
        self.handle = handle;
    }
}

impl Drop for TimeoutTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A periodic timer that runs the given closure every `period`, until
/// dropped.
#[derive(Debug)]
pub struct IntervalTask {
    handle: JoinHandle<()>,
}

impl IntervalTask {
    pub fn new<F>(period: Duration, mut callback: F) -> IntervalTask
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                callback();
            }
        });
        IntervalTask { handle }
    }
}

impl Drop for IntervalTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Bridges a callback-oriented producer into an `mpsc` channel so a
/// consumer can `select!` over it alongside other event sources.
pub fn messenger<T: Send + 'static>(buffer: usize) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(buffer)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn task_runs_to_completion() {
        let flag = Arc::new(AtomicU32::new(0));
        let flag2 = flag.clone();
        let task = Task::spawn(async move {
            flag2.store(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(flag.load(Ordering::SeqCst), 1);
        drop(task);
    }

    #[tokio::test]
    async fn dropping_timeout_task_cancels_it() {
        let flag = Arc::new(AtomicU32::new(0));
        let flag2 = flag.clone();
        let task = TimeoutTask::new(Duration::from_millis(50), move || {
            flag2.store(1, Ordering::SeqCst);
        });
        drop(task);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(flag.load(Ordering::SeqCst), 0);
    }
}
