//! Search input debouncing.
//!
//! [`Debouncer`] is a pure timing state machine: callers pass the current `Instant`
//! explicitly, which keeps it deterministic under test. [`run_debouncer`] drives it from
//! a channel of raw keystrokes with `tokio::time`.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Holds the latest raw input until it has been quiet for `delay`.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record raw input at `now`. Earlier pending input is replaced.
    pub fn input(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some((text.into(), now));
    }

    /// When the pending input becomes committable, if there is any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.delay)
    }

    /// Take the pending input if it has been quiet for the full delay at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.pending.take().map(|(text, _)| text),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Forward debounced commits from `input` to `output`.
///
/// Returns when either channel closes. Input still pending when `input` closes is
/// committed immediately.
pub async fn run_debouncer(
    mut input: mpsc::Receiver<String>,
    output: mpsc::Sender<String>,
    delay: Duration,
) {
    let mut debouncer = Debouncer::new(delay);
    loop {
        let received = match debouncer.deadline() {
            Some(deadline) => {
                tokio::select! {
                    received = input.recv() => received,
                    _ = tokio::time::sleep_until(deadline) => {
                        if let Some(text) = debouncer.poll(Instant::now()) {
                            if output.send(text).await.is_err() {
                                return;
                            }
                        }
                        continue;
                    }
                }
            }
            None => input.recv().await,
        };

        match received {
            Some(text) => debouncer.input(text, Instant::now()),
            None => {
                if let Some(text) = debouncer.pending.take().map(|(text, _)| text) {
                    let _ = output.send(text).await;
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SEARCH_DEBOUNCE;

    #[test]
    fn test_keystrokes_within_window_collapse_to_last_text() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(SEARCH_DEBOUNCE);

        // "Mary" typed over 200ms.
        for (i, text) in ["M", "Ma", "Mar", "Mary"].into_iter().enumerate() {
            let at = start + Duration::from_millis(i as u64 * 66);
            debouncer.input(text, at);
            assert_eq!(debouncer.poll(at), None);
        }

        let last = start + Duration::from_millis(198);
        assert_eq!(debouncer.poll(last + Duration::from_millis(299)), None);
        assert_eq!(
            debouncer.poll(last + Duration::from_millis(300)).as_deref(),
            Some("Mary")
        );
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(last + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_new_input_pushes_deadline_back() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(SEARCH_DEBOUNCE);
        debouncer.input("a", start);
        debouncer.input("ab", start + Duration::from_millis(250));
        assert_eq!(
            debouncer.deadline(),
            Some(start + Duration::from_millis(550))
        );
        assert_eq!(debouncer.poll(start + Duration::from_millis(400)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_emits_one_commit_per_quiet_period() {
        let (in_tx, in_rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = mpsc::channel(16);
        let driver = tokio::spawn(run_debouncer(in_rx, out_tx, SEARCH_DEBOUNCE));

        for text in ["M", "Ma", "Mar", "Mary"] {
            in_tx.send(text.to_string()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(out_rx.recv().await.as_deref(), Some("Mary"));

        in_tx.send("Maryann".to_string()).await.unwrap();
        assert_eq!(out_rx.recv().await.as_deref(), Some("Maryann"));

        drop(in_tx);
        driver.await.unwrap();
        assert_eq!(out_rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_input_is_flushed_when_input_closes() {
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        in_tx.send("Jo".to_string()).await.unwrap();
        drop(in_tx);
        run_debouncer(in_rx, out_tx, SEARCH_DEBOUNCE).await;
        assert_eq!(out_rx.recv().await.as_deref(), Some("Jo"));
    }
}
