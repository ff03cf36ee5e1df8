// Real-time countdown driver for timed drills.
//
// `DrillSession::tick` is a plain state transition; something has to call
// it once per time unit while a timed drill runs. `CountdownHandle` does
// that from a background thread against a session shared behind a mutex.
//
// The thread waits on a stop channel with `recv_timeout(interval)`: a
// timeout means "one tick elapsed", while a stop message or a dropped sender
// ends the loop immediately. Each tick locks the session, checks that the
// countdown it was started for is still the live one (same
// `timer_generation`, still active), and ticks. The thread exits on its own
// when the countdown expires, or when any transition (reset, practice mode,
// restart) changes the generation.
//
// Cancellation is scoped: dropping the handle stops and joins the thread,
// so no tick can land after the owner is gone. Do not drop or `cancel` the
// handle while holding the session lock; the join would wait on a thread
// that is waiting on that lock.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::evaluate::Evaluator;
use crate::session::DrillSession;

/// A session shared between its owner and a countdown thread.
pub type SharedSession<E> = Arc<Mutex<DrillSession<E>>>;

/// Owns the countdown thread for one arming of the timer.
pub struct CountdownHandle {
    stop: Option<Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl CountdownHandle {
    /// Put the session into timed mode (restarting if already timed) and
    /// start ticking it every `interval`.
    pub fn start_timed<E>(session: &SharedSession<E>, interval: Duration) -> Self
    where
        E: Evaluator + Send + 'static,
    {
        let generation = match session.lock() {
            Ok(mut s) => {
                s.start_timed();
                s.timer_generation()
            }
            Err(poisoned) => {
                let mut s = poisoned.into_inner();
                s.start_timed();
                s.timer_generation()
            }
        };
        Self::spawn(Arc::clone(session), interval, generation)
    }

    /// Tick an already-armed countdown. `generation` must be the session's
    /// `timer_generation()` right after arming.
    pub fn spawn<E>(session: SharedSession<E>, interval: Duration, generation: u64) -> Self
    where
        E: Evaluator + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<()>();
        let thread = thread::spawn(move || {
            debug!(generation, "countdown thread started");
            loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                let Ok(mut s) = session.lock() else {
                    warn!("session lock poisoned; countdown stopping");
                    break;
                };
                if s.timer_generation() != generation || !s.is_timer_active() {
                    break;
                }
                if !s.tick() {
                    break;
                }
            }
            debug!(generation, "countdown thread finished");
        });
        CountdownHandle {
            stop: Some(tx),
            thread: Some(thread),
        }
    }

    /// True once the thread has exited (expired, superseded, or cancelled).
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Stop the thread and wait for it. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
