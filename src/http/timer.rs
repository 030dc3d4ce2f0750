//! Per-connection idle timer.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;
use tokio::time::{Instant, Sleep};

/// Single-shot idle deadline owned by one connection.
///
/// A disarmed timer never fires, so it can sit in a `select!` branch next to
/// the socket read regardless of its state.
pub struct IdleTimer {
    timeout: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl IdleTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            sleep: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Starts a fresh countdown, replacing any pending one.
    pub fn arm(&mut self) {
        let deadline = Instant::now() + self.timeout;
        match &mut self.sleep {
            Some(sleep) => sleep.as_mut().reset(deadline),
            None => self.sleep = Some(Box::pin(tokio::time::sleep_until(deadline))),
        }
    }

    pub fn disarm(&mut self) {
        self.sleep = None;
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Resolves when an armed timer reaches its deadline. Fires once.
    pub fn expired(&mut self) -> Expired<'_> {
        Expired { timer: self }
    }
}

pub struct Expired<'a> {
    timer: &'a mut IdleTimer,
}

impl Future for Expired<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let timer = &mut *self.get_mut().timer;
        let Some(sleep) = timer.sleep.as_mut() else {
            return Poll::Pending;
        };
        ready!(sleep.as_mut().poll(cx));
        timer.sleep = None;
        Poll::Ready(())
    }
}
