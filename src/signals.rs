//! Cooperative quit flag, polled between bin retirements: a static
//! `AtomicBool` flipped from a C signal handler, no core state locks
//! involved.

use std::sync::atomic::{AtomicBool, Ordering};

static RUNNING: AtomicBool = AtomicBool::new(true);

extern "C" fn handle_sigint(_: libc::c_int) {
    RUNNING.store(false, Ordering::SeqCst);
}

/// Install the SIGINT handler. Call once at the start of a run.
pub fn install() {
    RUNNING.store(true, Ordering::SeqCst);
    unsafe { libc::signal(libc::SIGINT, handle_sigint as *const () as libc::sighandler_t) };
}

/// Poll this between bins; `false` means discard the in-progress bin and stop.
pub fn should_continue() -> bool {
    RUNNING.load(Ordering::SeqCst)
}
