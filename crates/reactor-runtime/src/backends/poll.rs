//! `poll(2)`-based [`Backend`].
//!
//! Fd table shape (a flat `Vec<libc::pollfd>` plus a `fd -> index` map)
//! is grounded on mio's unix poll selector: one contiguous array handed
//! straight to the syscall, with a side index so `add`/`del` don't have
//! to scan it.

use reactor_core::{BackendError, Backend, Interest, Readiness};
use std::collections::HashMap;
use std::os::unix::io::RawFd;
use std::time::Duration;

fn interest_to_events(interest: Interest) -> libc::c_short {
    let mut events: libc::c_short = 0;
    if interest.contains(Interest::READ) {
        events |= libc::POLLIN;
    }
    if interest.contains(Interest::WRITE) {
        events |= libc::POLLOUT;
    }
    events
}

fn revents_to_interest(revents: libc::c_short) -> Interest {
    let mut interest = Interest::empty();
    if revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0 {
        interest |= Interest::READ;
    }
    if revents & (libc::POLLOUT | libc::POLLERR) != 0 {
        interest |= Interest::WRITE;
    }
    interest
}

/// A single-threaded `poll(2)` backend.
pub struct PollBackend {
    fds: Vec<libc::pollfd>,
    index: HashMap<RawFd, usize>,
}

impl PollBackend {
    pub fn new() -> Self {
        PollBackend {
            fds: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl Default for PollBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for PollBackend {
    fn name(&self) -> &'static str {
        "poll"
    }

    fn init(&mut self) -> Result<(), BackendError> {
        // poll(2) needs no persistent kernel object to (re-)create; the
        // fd table we already hold is valid across a fork.
        Ok(())
    }

    fn add(&mut self, fd: RawFd, _old: Interest, interest: Interest) -> Result<(), BackendError> {
        let events = interest_to_events(interest);
        match self.index.get(&fd) {
            Some(&i) => self.fds[i].events = events,
            None => {
                self.index.insert(fd, self.fds.len());
                self.fds.push(libc::pollfd {
                    fd,
                    events,
                    revents: 0,
                });
            }
        }
        Ok(())
    }

    fn del(&mut self, fd: RawFd, _interest: Interest, remaining: Interest) -> Result<(), BackendError> {
        if !remaining.is_io() {
            if let Some(i) = self.index.remove(&fd) {
                self.fds.swap_remove(i);
                if i < self.fds.len() {
                    let moved_fd = self.fds[i].fd;
                    self.index.insert(moved_fd, i);
                }
            }
        } else if let Some(&i) = self.index.get(&fd) {
            self.fds[i].events = interest_to_events(remaining);
        }
        Ok(())
    }

    fn dispatch(&mut self, timeout: Option<Duration>) -> Result<Vec<Readiness>, BackendError> {
        let timeout_ms: libc::c_int = match timeout {
            None => -1,
            Some(d) => d.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
        };

        let rc = unsafe {
            libc::poll(self.fds.as_mut_ptr(), self.fds.len() as libc::nfds_t, timeout_ms)
        };

        if rc < 0 {
            let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(-1);
            if errno == libc::EINTR {
                return Ok(Vec::new());
            }
            return Err(BackendError::DispatchFailed(errno));
        }

        let mut ready = Vec::with_capacity(rc.max(0) as usize);
        for pfd in &mut self.fds {
            if pfd.revents != 0 {
                ready.push(Readiness {
                    fd: pfd.fd,
                    revents: revents_to_interest(pfd.revents),
                });
                pfd.revents = 0;
            }
        }
        Ok(ready)
    }

    fn dealloc(&mut self) {
        self.fds.clear();
        self.index.clear();
    }

    fn needs_reinit(&self) -> bool {
        // The fd list survives fork unchanged; nothing to rebuild.
        false
    }
}
