use std::time::Duration;

/// Repeating timer on the GTK main loop with an explicit start/stop.
/// Dropping the poller stops it.
pub struct Poller {
    interval: Duration,
    source: Option<glib::SourceId>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            source: None,
        }
    }

    /// Call `tick` every interval until [`Poller::stop`]. Restarts the timer
    /// if it was already running.
    pub fn start<F>(&mut self, tick: F)
    where
        F: Fn() + 'static,
    {
        self.stop();
        log::debug!("polling every {:?}", self.interval);
        let id = glib::timeout_add_local(self.interval, move || {
            tick();
            glib::ControlFlow::Continue
        });
        self.source = Some(id);
    }

    pub fn stop(&mut self) {
        if let Some(id) = self.source.take() {
            id.remove();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
