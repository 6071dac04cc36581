//! Active Expiry Sweep
//!
//! A dedicated background thread that periodically removes expired
//! entries from one store, independent of lazy expiration on read.

use std::io;
use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

/// How long `stop` waits for an in-flight sweep before detaching.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// == Sweep Target ==
/// A store the sweeper can clean.
pub trait Sweep: Send + Sync + 'static {
    /// Removes every expired entry; returns how many were removed.
    fn sweep_expired(&self) -> usize;

    fn sweep_name(&self) -> &str;
}

// == Expiry Sweeper ==
/// Handle to a running sweeper thread.
///
/// The thread only holds a weak reference to its target, so it exits on
/// its own once the store is dropped.
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Spawns a sweeper that cleans `target` every `interval`.
    pub fn spawn<T: Sweep>(target: Weak<T>, name: &str, interval: Duration) -> io::Result<Self> {
        let (shutdown, shutdown_rx) = channel::bounded::<()>(1);
        let cache_name = name.to_string();

        let handle = thread::Builder::new()
            .name(format!("sweeper-{name}"))
            .spawn(move || {
                info!(
                    "Starting expiry sweeper for cache '{}' with interval of {:?}",
                    cache_name, interval
                );

                loop {
                    match shutdown_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let Some(target) = target.upgrade() else {
                        break;
                    };
                    let removed = target.sweep_expired();

                    if removed > 0 {
                        info!(
                            "Expiry sweep on '{}': removed {} expired entries",
                            target.sweep_name(),
                            removed
                        );
                    } else {
                        debug!(
                            "Expiry sweep on '{}': no expired entries found",
                            target.sweep_name()
                        );
                    }
                }

                debug!("Expiry sweeper for cache '{}' stopped", cache_name);
            })?;

        Ok(Self { shutdown, handle })
    }

    // == Stop ==
    /// Signals the thread and waits up to `grace` for it to finish.
    ///
    /// Returns true if the thread was joined. A thread still mid-sweep after
    /// `grace` is detached; it exits at its next wake-up.
    pub fn stop(self, grace: Duration) -> bool {
        let Self { shutdown, handle } = self;
        // A full channel means a stop signal is already pending
        let _ = shutdown.try_send(());
        drop(shutdown);

        let deadline = Instant::now() + grace;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!("Expiry sweeper did not stop within {:?}; detaching", grace);
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }

        if handle.join().is_err() {
            warn!("Expiry sweeper panicked before shutdown");
        }
        true
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
