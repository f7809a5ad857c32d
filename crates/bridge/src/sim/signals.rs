//! Process-level stop and report requests.
//!
//! SIGINT asks the loop to stop after the current tick; SIGUSR1 asks it to log the
//! current simulation time. Both handlers only set atomic flags. Embedding code that
//! does not want process-wide handlers can stop a simulator through a [`StopFlag`].

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::common::error::Result;

static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);
static REPORT_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_signal: libc::c_int) {
    STOP_REQUESTED.store(true, Ordering::SeqCst);
}

extern "C" fn on_sigusr1(_signal: libc::c_int) {
    REPORT_REQUESTED.store(true, Ordering::SeqCst);
}

/// Installs the SIGINT and SIGUSR1 handlers.
pub fn install_handlers() -> Result<()> {
    let handlers: [(libc::c_int, extern "C" fn(libc::c_int)); 2] =
        [(libc::SIGINT, on_sigint), (libc::SIGUSR1, on_sigusr1)];
    for (signal, handler) in handlers {
        // SAFETY: the handlers only store to static atomics, which is async-signal-safe.
        let previous = unsafe { libc::signal(signal, handler as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error().into());
        }
    }
    Ok(())
}

/// Whether SIGINT was received.
pub fn stop_requested() -> bool {
    STOP_REQUESTED.load(Ordering::SeqCst)
}

/// Consumes a pending SIGUSR1 report request.
pub fn take_report_request() -> bool {
    REPORT_REQUESTED.swap(false, Ordering::SeqCst)
}

/// Shared stop request for one simulator.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// Creates a cleared flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
