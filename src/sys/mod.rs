use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::Error;

pub trait Driver {
    fn write(&self, data: &[u8]) -> Result<(), Error>;

    /// Clock out `command`, hold chip select for `delay`, then clock in `response`, all within
    /// a single chip select assertion.
    fn write_read(&self, command: &[u8], delay: Duration, response: &mut [u8]) -> Result<(), Error>;
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

fn interrupt() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install SIGINT/SIGTERM handlers and return the flag they raise.
pub fn interrupt_flag() -> Result<&'static AtomicBool, Error> {
    imp::install_signal_handlers()?;
    Ok(&INTERRUPTED)
}

#[cfg(any(target_os = "linux"))]
#[path = "linux.rs"]
pub mod imp;

#[cfg(not(any(target_os = "linux")))]
#[path = "stub.rs"]
pub mod imp;
