//! The single gate every remote action passes through.
//!
//! Holding the dispatcher by `&mut` keeps at most one request in flight. Before each
//! request it sleeps until the last reported cooldown plus a guard margin has passed since
//! the previous response, then records the new cooldown from the reply. Remote `errors` and
//! `messages` are logged and handed back, never raised; only transport failures are `Err`.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::modules::api::{ApiRequest, Response};
use crate::modules::error::{AgentError, Result};
use crate::modules::state::{self, Status};
use crate::modules::stats::RequestStats;
use crate::modules::transport::Transport;

/// Default margin added on top of the server cooldown.
pub const DEFAULT_GUARD: Duration = Duration::from_millis(100);

/// External request to stop between two actions.
#[derive(Clone, Debug, Default)]
pub enum StopSignal {
    #[default]
    Never,
    Flag(Arc<AtomicBool>),
    /// Raised once the runtime state file says `Stopped`.
    StateFile(PathBuf),
}

impl StopSignal {
    pub fn raised(&self) -> bool {
        match self {
            StopSignal::Never => false,
            StopSignal::Flag(flag) => flag.load(Ordering::SeqCst),
            StopSignal::StateFile(path) => match state::load_state_file(path) {
                Ok(Some(s)) => s.status == Status::Stopped,
                Ok(None) => false,
                Err(err) => {
                    warn!("cannot read stop state {}: {}", path.display(), err);
                    false
                }
            },
        }
    }
}

pub struct Dispatcher<T: Transport> {
    transport: T,
    cooldown: Duration,
    guard: Duration,
    last_response: Option<Instant>,
    stop: StopSignal,
    stats: RequestStats,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, guard: Duration) -> Self {
        Self {
            transport,
            cooldown: Duration::ZERO,
            guard,
            last_response: None,
            stop: StopSignal::Never,
            stats: RequestStats::default(),
        }
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.set_stop_signal(stop);
        self
    }

    pub fn set_stop_signal(&mut self, stop: StopSignal) {
        self.stop = stop;
    }

    /// Whether the stop signal is raised right now.
    pub fn stop_requested(&self) -> bool {
        self.stop.raised()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn stats(&self) -> &RequestStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Earliest instant the next request may leave, `None` before the first response.
    pub fn ready_at(&self) -> Option<Instant> {
        self.last_response
            .map(|last| last + self.cooldown + self.guard)
    }

    pub fn remaining_wait(&self, now: Instant) -> Duration {
        self.ready_at()
            .map(|ready| ready.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    pub fn execute(&mut self, request: &ApiRequest) -> Result<Response> {
        if self.stop.raised() {
            return Err(AgentError::Stopped);
        }

        let wait = self.remaining_wait(Instant::now());
        if wait > Duration::ZERO {
            debug!("waiting {:.2}s for cooldown", wait.as_secs_f64());
            std::thread::sleep(wait);
        }

        debug!("-> {} {:?}", request.endpoint, request.body);
        let body = self.transport.send(request)?;
        let response = Response::new(body);

        if let Some(secs) = response.meta.cooldown {
            match Duration::try_from_secs_f64(secs) {
                Ok(cooldown) => self.cooldown = cooldown,
                Err(_) => warn!("ignoring invalid cooldown {} from {}", secs, request.endpoint),
            }
        }
        for error in &response.meta.errors {
            warn!("{}: {}", request.endpoint, error);
        }
        if !response.meta.messages.is_empty() {
            info!("{}", response.meta.messages.join(" "));
        }

        self.stats.record(request.endpoint);
        self.last_response = Some(Instant::now());
        Ok(response)
    }
}
