use super::Notifier;
use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Notifier that logs every notification instead of transmitting it.
///
/// Stands in for the attribute transport when running without a radio.
#[derive(Default)]
pub struct LoggingNotifier {
    sent: AtomicU64,
}

impl LoggingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notifications pushed so far.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }
}

impl Notifier for LoggingNotifier {
    fn notify(&self, handle: u16, value: &[u8]) {
        self.sent.fetch_add(1, Ordering::SeqCst);
        info!("[Notify] handle 0x{:04X} <- {}", handle, hex(value));
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
