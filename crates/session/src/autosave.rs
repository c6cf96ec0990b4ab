#![forbid(unsafe_code)]

/// Quiescent interval before a pending notepad edit is persisted.
pub const AUTOSAVE_DELAY_MS: i64 = 1_000;

/// Cancellable scheduled save, modeled against a millisecond clock the
/// caller advances. Each edit supersedes any pending deadline, so rapid
/// keystrokes coalesce into one write; an explicit flush cancels the
/// deadline and the owner saves synchronously.
#[derive(Debug, Default)]
pub struct AutosaveTimer {
    deadline_ms: Option<i64>,
}

impl AutosaveTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now_ms: i64) {
        self.deadline_ms = Some(now_ms + AUTOSAVE_DELAY_MS);
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// Fires at most once per schedule: returns true when the deadline
    /// has passed and clears it.
    pub fn poll(&mut self, now_ms: i64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }
}
