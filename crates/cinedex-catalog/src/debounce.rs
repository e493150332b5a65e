//! Quiet-period handling for typed search input.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

const CHANNEL_CAPACITY: usize = 64;

/// One user input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchInput {
    /// Text changed; waits for the quiet period.
    Typed(String),
    /// Explicit submit; bypasses the quiet period.
    Submitted(String),
}

/// Collapses bursts of [`SearchInput::Typed`] into the latest value once the
/// input has been quiet for the configured period.
#[derive(Debug)]
pub struct Debouncer {
    rx: mpsc::Receiver<SearchInput>,
    quiet: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    /// Debouncer over an existing receiver.
    #[must_use]
    pub const fn new(rx: mpsc::Receiver<SearchInput>, quiet: Duration) -> Self {
        Self {
            rx,
            quiet,
            pending: None,
        }
    }

    /// Debouncer plus the sender that feeds it.
    #[must_use]
    pub fn channel(quiet: Duration) -> (mpsc::Sender<SearchInput>, Self) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (tx, Self::new(rx, quiet))
    }

    /// Next settled search text.
    ///
    /// Each keystroke restarts the timer. A submit resolves immediately and
    /// drops any pending text. Once all senders are gone the pending text is
    /// flushed, after which `None` is returned.
    ///
    /// Cancel safe: dropping the future keeps the pending text and its
    /// deadline for the next call.
    pub async fn next(&mut self) -> Option<String> {
        loop {
            let Some(deadline) = self.pending.as_ref().map(|(_, deadline)| *deadline) else {
                match self.rx.recv().await? {
                    SearchInput::Submitted(text) => return Some(text),
                    SearchInput::Typed(text) => self.hold(text),
                }
                continue;
            };

            tokio::select! {
                input = self.rx.recv() => match input {
                    None => return self.take_pending(),
                    Some(SearchInput::Submitted(text)) => {
                        self.pending = None;
                        return Some(text);
                    }
                    Some(SearchInput::Typed(text)) => self.hold(text),
                },
                () = tokio::time::sleep_until(deadline) => return self.take_pending(),
            }
        }
    }

    fn hold(&mut self, text: String) {
        self.pending = Some((text, Instant::now() + self.quiet));
    }

    fn take_pending(&mut self) -> Option<String> {
        self.pending.take().map(|(text, _)| text)
    }
}
