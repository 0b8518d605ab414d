//! Event sinks driven by the `action` worker.
//!
//! A sink is called synchronously on the `action` thread, outside the window
//! lock, at most once per classification cycle and only on a state edge.

use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// Receiver of debounced detection transitions.
///
/// `true` means the primary condition started, `false` that it cleared.
/// Any `FnMut(bool) + Send` closure is a sink.
///
/// # Example
/// ```rust
/// use cry_monitor::notify::EventSink;
///
/// let mut seen = Vec::new();
/// let mut sink = |active: bool| seen.push(active);
/// sink.notify(true);
/// sink.notify(false);
/// assert_eq!(seen, vec![true, false]);
/// ```
pub trait EventSink: Send {
    fn notify(&mut self, active: bool);
}

impl<F: FnMut(bool) + Send> EventSink for F {
    fn notify(&mut self, active: bool) {
        self(active)
    }
}

// ---------------------------------------------------------------------------
// LogSink
// ---------------------------------------------------------------------------

/// Logs every transition at `info`.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn notify(&mut self, active: bool) {
        if active {
            log::info!("sink: detection started");
        } else {
            log::info!("sink: detection cleared");
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelSink
// ---------------------------------------------------------------------------

/// Forwards transitions into a bounded tokio channel without blocking.
///
/// When the channel is full or closed the event is dropped and a warning
/// is logged; the `action` worker never waits on the publisher.
pub struct ChannelSink {
    tx: mpsc::Sender<bool>,
    dropped: u64,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<bool>) -> Self {
        Self { tx, dropped: 0 }
    }

    /// Create a sink together with the receiving end of a channel holding
    /// up to `capacity` pending transitions.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0` (tokio rejects zero-capacity channels).
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<bool>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Events dropped so far because the channel was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl EventSink for ChannelSink {
    fn notify(&mut self, active: bool) {
        match self.tx.try_send(active) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped += 1;
                log::warn!("sink: notification channel full, dropping event active={active}");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.dropped += 1;
                log::warn!("sink: notifier stopped, dropping event active={active}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_is_a_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |active: bool| seen.push(active);
            sink.notify(true);
        }
        assert_eq!(seen, vec![true]);
    }

    #[test]
    fn sink_is_object_safe() {
        let mut sink: Box<dyn EventSink> = Box::new(LogSink);
        sink.notify(true);
        sink.notify(false);
    }

    #[test]
    fn channel_sink_delivers_in_order() {
        let (mut sink, mut rx) = ChannelSink::channel(4);
        sink.notify(true);
        sink.notify(false);
        assert_eq!(rx.try_recv(), Ok(true));
        assert_eq!(rx.try_recv(), Ok(false));
        assert_eq!(sink.dropped(), 0);
    }

    #[test]
    fn channel_sink_drops_when_full() {
        let (mut sink, mut rx) = ChannelSink::channel(1);
        sink.notify(true);
        sink.notify(false);
        assert_eq!(sink.dropped(), 1);
        assert_eq!(rx.try_recv(), Ok(true));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_sink_drops_when_receiver_closed() {
        let (mut sink, rx) = ChannelSink::channel(1);
        drop(rx);
        sink.notify(true);
        assert_eq!(sink.dropped(), 1);
    }
}
