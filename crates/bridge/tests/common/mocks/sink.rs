use mockall::mock;
use rtlbridge_core::Result;
use rtlbridge_core::transport::{D2hMsg, MessageSink, NetMsg};

mock! {
    pub DmaSink {}
    impl MessageSink<D2hMsg> for DmaSink {
        fn send(&mut self, msg: D2hMsg) -> Result<()>;
        fn max_out_payload(&self) -> usize;
        fn max_in_payload(&self) -> usize;
    }
}

/// Sink that keeps every message it is given.
#[derive(Debug)]
pub struct RecordingSink<T> {
    pub sent: Vec<T>,
    pub max_out: usize,
    pub max_in: usize,
}

impl<T> RecordingSink<T> {
    pub fn new() -> Self {
        Self::with_limits(4096, 4096)
    }

    pub fn with_limits(max_out: usize, max_in: usize) -> Self {
        Self {
            sent: Vec::new(),
            max_out,
            max_in,
        }
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&mut self) -> Vec<T> {
        std::mem::take(&mut self.sent)
    }
}

impl<T> Default for RecordingSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSink<D2hMsg> for RecordingSink<D2hMsg> {
    fn send(&mut self, msg: D2hMsg) -> Result<()> {
        self.sent.push(msg);
        Ok(())
    }

    fn max_out_payload(&self) -> usize {
        self.max_out
    }

    fn max_in_payload(&self) -> usize {
        self.max_in
    }
}

impl MessageSink<NetMsg> for RecordingSink<NetMsg> {
    fn send(&mut self, msg: NetMsg) -> Result<()> {
        self.sent.push(msg);
        Ok(())
    }

    fn max_out_payload(&self) -> usize {
        self.max_out
    }

    fn max_in_payload(&self) -> usize {
        self.max_in
    }
}
