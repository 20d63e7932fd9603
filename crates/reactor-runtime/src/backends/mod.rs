//! Concrete [`reactor_core::Backend`] implementations.

pub mod poll;

pub use poll::PollBackend;

/// Construct the preferred backend for this platform, honoring an
/// `EVENT_SHOW_METHOD` override (see `reactor_core::env`).
pub fn default_backend(override_name: Option<&'static str>) -> Box<dyn reactor_core::Backend> {
    let requested = override_name
        .map(str::to_owned)
        .or_else(|| reactor_core::env_get_opt::<String>("EVENT_SHOW_METHOD"));

    match requested.as_deref() {
        Some("poll") | None => Box::new(PollBackend::new()),
        Some(other) => {
            reactor_core::ev_warn!("unknown backend {:?} requested, falling back to poll", other);
            Box::new(PollBackend::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_is_poll() {
        let backend = default_backend(None);
        assert_eq!(backend.name(), "poll");
    }

    #[test]
    fn override_is_honored() {
        let backend = default_backend(Some("poll"));
        assert_eq!(backend.name(), "poll");
    }
}
