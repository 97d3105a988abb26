//! Alarm thread: forces a matching pass when the armed deadline passes.
//!
//! The matching engine arms the earliest future worker start/end or task
//! start. Without this thread nothing would happen at those instants unless
//! some caller touched the plant, so time-gated tasks would wait forever.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::core::executor::WorkExecutor;
use crate::core::plant::{Shared, ThreadSettings};

impl<R, E> Shared<R, E>
where
    R: Clone + Send + 'static,
    E: WorkExecutor<R>,
{
    /// Start the alarm thread serving plant generation `epoch`.
    pub(crate) fn spawn_alarm(
        self: &Arc<Self>,
        epoch: u64,
        threads: &ThreadSettings,
    ) -> io::Result<JoinHandle<()>> {
        let shared = Arc::clone(self);
        thread::Builder::new()
            .name(format!("{}-alarm", threads.name_prefix))
            .stack_size(threads.stack_size)
            .spawn(move || shared.alarm_loop(epoch))
    }

    fn alarm_loop(self: &Arc<Self>, epoch: u64) {
        debug!(epoch, "alarm thread started");
        let mut state = self.state.lock();

        while state.is_current(epoch) {
            let Some(deadline) = state.armed else {
                // Nothing armed: sleep until a tick arms a deadline or destroy wakes us.
                self.alarm.wait(&mut state);
                continue;
            };

            let before = self.clock.now();
            if before < deadline {
                let timed_out = self
                    .alarm
                    .wait_for(&mut state, Duration::from_millis(deadline - before))
                    .timed_out();
                if !timed_out || !state.is_current(epoch) || state.armed != Some(deadline) {
                    continue;
                }

                let after = self.clock.now();
                if after < deadline {
                    if after == before {
                        // The plant clock did not move during a real wait; only a
                        // manual tick or a new deadline can change anything.
                        debug!(deadline, now = after, "plant clock stalled, alarm parked");
                        self.alarm.wait(&mut state);
                    }
                    continue;
                }
            }

            state.armed = None;
            debug!(deadline, "alarm fired");
            self.schedule(&mut state);
        }

        debug!(epoch, "alarm thread exiting");
    }
}
