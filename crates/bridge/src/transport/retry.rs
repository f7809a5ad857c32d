//! Bounded retry policy for outbound sends and synchronization.
//!
//! The transport can momentarily refuse a message (all outbound slots in use) or a
//! synchronization attempt. Instead of spinning forever, every wait is bounded: the
//! first failure logs a warning, later failures spin silently, and once the budget is
//! exhausted the wait turns into a fatal [`BridgeError`]. A closed peer is fatal at once.

use std::fmt;

use tracing::{debug, warn};

use super::{Channel, SendError, SyncError};
use crate::common::error::{BridgeError, Result};
use crate::config::RetryConfig;

/// Destination for outbound messages of type `T`.
///
/// Engines send through this trait so they stay independent of the concrete channel.
pub trait MessageSink<T> {
    /// Sends one message, waiting for a free slot within the retry budget.
    fn send(&mut self, msg: T) -> Result<()>;

    /// Largest payload an outbound message may carry.
    fn max_out_payload(&self) -> usize;

    /// Largest payload an inbound message may carry.
    fn max_in_payload(&self) -> usize;
}

/// Retry budgets for busy waits on the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts to place one outbound message.
    pub max_alloc_spins: u64,
    /// Attempts to synchronize at one tick.
    pub max_sync_spins: u64,
}

impl RetryPolicy {
    /// Creates a policy with explicit budgets (each at least one attempt).
    pub const fn new(max_alloc_spins: u64, max_sync_spins: u64) -> Self {
        Self {
            max_alloc_spins: if max_alloc_spins == 0 { 1 } else { max_alloc_spins },
            max_sync_spins: if max_sync_spins == 0 { 1 } else { max_sync_spins },
        }
    }

    /// Builds the policy from configuration.
    pub const fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_alloc_spins, config.max_sync_spins)
    }

    /// Synchronizes `link` at `now`.
    ///
    /// # Returns
    ///
    /// The number of failed attempts that were retried before synchronization went
    /// through.
    pub fn sync<C: Channel + ?Sized>(&self, link: &mut C, now: u64) -> Result<u64> {
        if !link.sync_enabled() {
            return Ok(0);
        }

        let mut attempts = 0;
        loop {
            match link.sync(now) {
                Ok(()) => return Ok(attempts),
                Err(SyncError::Closed) => return Err(BridgeError::ChannelClosed(link.name())),
                Err(SyncError::Busy) => {
                    attempts += 1;
                    if attempts == 1 {
                        warn!(channel = link.name(), ts = now, "sync failed, retrying");
                    }
                    if attempts >= self.max_sync_spins {
                        return Err(BridgeError::SyncStalled {
                            channel: link.name(),
                            ts: now,
                            attempts,
                        });
                    }
                    std::hint::spin_loop();
                }
            }
        }
    }

    /// Sends `msg` on `link` at `now`.
    ///
    /// # Returns
    ///
    /// `true` if the channel was full at least once before the send went through.
    pub fn send<C: Channel + ?Sized>(&self, link: &mut C, now: u64, msg: C::Out) -> Result<bool> {
        let mut msg = msg;
        let mut attempts = 0;
        loop {
            match link.try_send(now, msg) {
                Ok(()) => {
                    if attempts > 0 {
                        debug!(channel = link.name(), ts = now, attempts, "outbound slot available again");
                    }
                    return Ok(attempts > 0);
                }
                Err(SendError::Closed(_)) => return Err(BridgeError::ChannelClosed(link.name())),
                Err(SendError::TooLarge { len, .. }) => {
                    return Err(BridgeError::PayloadTooLarge {
                        what: "outbound message",
                        len,
                        max: link.max_out_payload(),
                    });
                }
                Err(SendError::Full(back)) => {
                    attempts += 1;
                    if attempts == 1 {
                        warn!(channel = link.name(), ts = now, "outbound channel full, waiting for a free slot");
                    }
                    if attempts >= self.max_alloc_spins {
                        return Err(BridgeError::AllocExhausted {
                            channel: link.name(),
                            attempts,
                        });
                    }
                    msg = back;
                    std::hint::spin_loop();
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Send handle over one channel at one tick.
///
/// Created by the simulator for each phase that may emit messages and handed to the
/// engines as a [`MessageSink`].
pub struct Outbound<'a, C: ?Sized> {
    link: &'a mut C,
    retry: RetryPolicy,
    now: u64,
    sent: u64,
    stalls: u64,
}

impl<'a, C: Channel + ?Sized> Outbound<'a, C> {
    /// Wraps `link` for sends stamped with `now`.
    pub fn new(link: &'a mut C, retry: RetryPolicy, now: u64) -> Self {
        Self {
            link,
            retry,
            now,
            sent: 0,
            stalls: 0,
        }
    }

    /// Messages sent through this handle.
    pub const fn sent(&self) -> u64 {
        self.sent
    }

    /// Sends that found the channel full at least once.
    pub const fn stalls(&self) -> u64 {
        self.stalls
    }

    /// Tick the messages are stamped with.
    pub const fn now(&self) -> u64 {
        self.now
    }
}

impl<C: Channel + ?Sized> MessageSink<C::Out> for Outbound<'_, C> {
    fn send(&mut self, msg: C::Out) -> Result<()> {
        if self.retry.send(&mut *self.link, self.now, msg)? {
            self.stalls += 1;
        }
        self.sent += 1;
        Ok(())
    }

    fn max_out_payload(&self) -> usize {
        self.link.max_out_payload()
    }

    fn max_in_payload(&self) -> usize {
        self.link.max_in_payload()
    }
}

impl<C: Channel + ?Sized> fmt::Debug for Outbound<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outbound")
            .field("channel", &self.link.name())
            .field("now", &self.now)
            .field("sent", &self.sent)
            .field("stalls", &self.stalls)
            .finish()
    }
}
