//! Self-pipe signal bridge.
//!
//! Signal handlers can only safely call a small set of async-signal-safe
//! functions, so delivery can't run arbitrary user callbacks directly.
//! Instead the handler writes the signal number to one end of a pipe;
//! the reactor watches the read end like any other fd and turns bytes
//! read from it back into signal activations on its own thread, outside
//! signal-handler context.
//!
//! Signal handlers are process-global, so only one `SignalBridge` may be
//! installed at a time; a second `install` for a signal already bridged
//! simply replaces the write fd the handler targets.

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd;
use reactor_core::error::ReactorError;
use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

static WRITE_FD: AtomicI32 = AtomicI32::new(-1);
static SIGNAL_CAUGHT: AtomicBool = AtomicBool::new(false);

extern "C" fn bridge_handler(signum: libc::c_int) {
    let fd = WRITE_FD.load(Ordering::Relaxed);
    if fd >= 0 {
        let byte = signum as u8;
        unsafe {
            libc::write(fd, &byte as *const u8 as *const libc::c_void, 1);
        }
    }
    SIGNAL_CAUGHT.store(true, Ordering::Relaxed);
}

/// Bridges OS signal delivery into the reactor's fd-readiness machinery.
pub struct SignalBridge {
    read: OwnedFd,
    write: OwnedFd,
    installed: Vec<Signal>,
}

impl SignalBridge {
    pub fn new() -> Result<Self, ReactorError> {
        let (read, write) = unistd::pipe().map_err(|e| ReactorError::SignalError(e as i32))?;
        set_nonblocking(read.as_raw_fd())?;
        set_nonblocking(write.as_raw_fd())?;
        Ok(SignalBridge {
            read,
            write,
            installed: Vec::new(),
        })
    }

    pub fn read_fd(&self) -> RawFd {
        self.read.as_raw_fd()
    }

    /// Install (or re-point) the handler for `signal` to write into this
    /// bridge's pipe.
    pub fn watch(&mut self, sig: Signal) -> Result<(), ReactorError> {
        WRITE_FD.store(self.write.as_raw_fd(), Ordering::Relaxed);
        let action = SigAction::new(
            SigHandler::Handler(bridge_handler),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        unsafe { signal::sigaction(sig, &action) }
            .map_err(|e| ReactorError::SignalError(e as i32))?;
        if !self.installed.contains(&sig) {
            self.installed.push(sig);
        }
        Ok(())
    }

    /// Restore the default disposition for `signal`.
    pub fn unwatch(&mut self, sig: Signal) -> Result<(), ReactorError> {
        let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        unsafe { signal::sigaction(sig, &action) }
            .map_err(|e| ReactorError::SignalError(e as i32))?;
        self.installed.retain(|&s| s != sig);
        Ok(())
    }

    /// Whether a signal has been caught by the handler since the last
    /// call, regardless of whether its byte has been read from the pipe
    /// yet. The process-global flag (signal handlers are process-wide, so
    /// this is not per-instance) backs the drain loop's "signal flag"
    /// check between callback invocations.
    pub fn caught_since_last_check() -> bool {
        SIGNAL_CAUGHT.swap(false, Ordering::Relaxed)
    }

    /// Drain pending signal-number bytes from the pipe.
    pub fn drain(&self) -> Vec<i32> {
        let mut buf = [0u8; 256];
        let mut out = Vec::new();
        loop {
            match unistd::read(self.read.as_raw_fd(), &mut buf) {
                Ok(0) => break,
                Ok(n) => out.extend(buf[..n].iter().map(|&b| b as i32)),
                Err(nix::errno::Errno::EAGAIN) => break,
                Err(nix::errno::Errno::EINTR) => continue,
                Err(_) => break,
            }
        }
        out
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        for sig in std::mem::take(&mut self.installed) {
            let _ = self.unwatch(sig);
        }
    }
}

fn set_nonblocking(fd: RawFd) -> Result<(), ReactorError> {
    use nix::fcntl::{fcntl, FcntlArg, OFlag};
    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(|e| ReactorError::SignalError(e as i32))?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(|e| ReactorError::SignalError(e as i32))?;
    Ok(())
}
