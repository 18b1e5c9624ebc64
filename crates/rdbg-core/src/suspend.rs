//
// suspend.rs
//
// Copyright (C) 2026 rdbg contributors. All rights reserved.
//
// The cross-thread rendezvous. When the trace state machine decides to
// suspend, the scripting thread parks in `SuspensionHandshake::wait` until
// a network thread releases it. While parked, it also drains jobs queued
// by the network thread -- evaluating an expression or listing variables
// needs the scripting thread, since only it is allowed to call into the
// runtime, and it's already sitting idle waiting for a continue.
//
// This is built on two crossbeam channels rather than a mutex/condvar with
// a periodic re-signal timer: a job and a continue are both just messages,
// and `select!` already does what a timer-based poll loop would otherwise
// be working around.

use crossbeam::channel::{self, Receiver, Sender};

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct SuspensionHandshake {
    continue_tx: Sender<()>,
    continue_rx: Receiver<()>,
    job_tx: Sender<Job>,
    job_rx: Receiver<Job>,
}

impl Default for SuspensionHandshake {
    fn default() -> Self {
        Self::new()
    }
}

impl SuspensionHandshake {
    pub fn new() -> Self {
        let (continue_tx, continue_rx) = channel::bounded(1);
        let (job_tx, job_rx) = channel::unbounded();
        Self { continue_tx, continue_rx, job_tx, job_rx }
    }

    /// Called from the scripting thread. Blocks until released, running
    /// any jobs that arrive in the meantime on this same thread.
    pub fn wait(&self) {
        // A continue sent while nobody was waiting must not short-circuit
        // the next wait() call; drop it before blocking.
        while self.continue_rx.try_recv().is_ok() {}

        loop {
            channel::select! {
                recv(self.continue_rx) -> _ => break,
                recv(self.job_rx) -> job => {
                    if let Ok(job) = job {
                        job();
                    }
                },
            }
        }

        // A job queued in the instant before release arrived wouldn't
        // otherwise get a chance to run.
        while let Ok(job) = self.job_rx.try_recv() {
            job();
        }
    }

    /// Called from a network thread to run `job` on the scripting thread
    /// once it's next parked in `wait`.
    pub fn enqueue(&self, job: Job) {
        let _ = self.job_tx.send(job);
    }

    /// Releases a parked scripting thread. Harmless if nothing is parked.
    pub fn release(&self) {
        let _ = self.continue_tx.try_send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn release_before_wait_does_not_pre_empt_the_next_wait() {
        let handshake = Arc::new(SuspensionHandshake::new());
        handshake.release();
        std::thread::sleep(Duration::from_millis(20));

        let released = Arc::new(AtomicBool::new(false));
        let h = handshake.clone();
        let r = released.clone();
        let worker = std::thread::spawn(move || {
            h.wait();
            r.store(true, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(50));
        assert!(!released.load(Ordering::SeqCst), "stale release unblocked a later wait()");

        handshake.release();
        worker.join().unwrap();
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn queued_jobs_run_on_the_waiting_thread() {
        let handshake = Arc::new(SuspensionHandshake::new());
        let ran = Arc::new(AtomicBool::new(false));
        let r = ran.clone();
        handshake.enqueue(Box::new(move || r.store(true, Ordering::SeqCst)));

        let h = handshake.clone();
        let worker = std::thread::spawn(move || h.wait());
        std::thread::sleep(Duration::from_millis(30));
        assert!(ran.load(Ordering::SeqCst));

        handshake.release();
        worker.join().unwrap();
    }
}
