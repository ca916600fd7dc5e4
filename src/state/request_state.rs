/// Request state definitions for tracking crawl progress
///
/// Every request in the frontier moves `Pending → Fetching → <terminal>`.
use std::fmt;

/// Represents the current state of a request in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    // ===== Active States =====
    /// Request is in the frontier, waiting for a worker
    Pending,

    /// Request is being fetched or handled
    Fetching,

    // ===== Terminal States =====
    /// Page was fetched and its handler finished
    Handled,

    /// Product page was extracted but the record did not pass the keyword filter
    Rejected,

    /// Page returned HTTP 404 or 410
    DeadLink,

    /// Fetch or extraction kept failing after all retries
    Failed,
}

impl RequestState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (request may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Fetching)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::DeadLink | Self::Failed)
    }

    /// Converts the state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Handled => "handled",
            Self::Rejected => "rejected",
            Self::DeadLink => "dead_link",
            Self::Failed => "failed",
        }
    }

    /// Parses a state from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "fetching" => Some(Self::Fetching),
            "handled" => Some(Self::Handled),
            "rejected" => Some(Self::Rejected),
            "dead_link" => Some(Self::DeadLink),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible request states
    pub fn all_states() -> [Self; 6] {
        [
            Self::Pending,
            Self::Fetching,
            Self::Handled,
            Self::Rejected,
            Self::DeadLink,
            Self::Failed,
        ]
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
