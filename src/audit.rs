use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Epoch seconds.
    pub timestamp: u64,
    pub description: String,
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp, self.description)
    }
}

/// Append-only record of the operations applied to a database.
#[derive(Debug, Default)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, timestamp: u64, description: impl Into<String>) {
        self.entries.push(AuditEntry {
            timestamp,
            description: description.into(),
        });
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }
}
