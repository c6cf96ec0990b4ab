#![forbid(unsafe_code)]

/// Two-click connection creation driver.
///
/// `toggle` flips between `Idle` and `AwaitingFirstEndpoint`; while a
/// first endpoint is recorded, picking the same node again is rejected
/// without leaving the state, and any outside click cancels back to
/// `Idle`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ConnectMode {
    #[default]
    Idle,
    AwaitingFirstEndpoint,
    AwaitingSecondEndpoint {
        first: String,
    },
}

impl ConnectMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Flips connection mode on or off. Turning it off from any
    /// non-idle state drops the recorded endpoint.
    pub fn toggle(&mut self) -> bool {
        if self.is_idle() {
            *self = Self::AwaitingFirstEndpoint;
            true
        } else {
            *self = Self::Idle;
            false
        }
    }

    /// A click outside any node or connection while armed.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// A node was clicked while connection mode is armed.
    pub fn select(&mut self, node_id: &str) -> ConnectSelect {
        match std::mem::take(self) {
            Self::Idle => ConnectSelect::NotConnecting,
            Self::AwaitingFirstEndpoint => {
                *self = Self::AwaitingSecondEndpoint {
                    first: node_id.to_string(),
                };
                ConnectSelect::FirstChosen
            }
            Self::AwaitingSecondEndpoint { first } => {
                if first == node_id {
                    *self = Self::AwaitingSecondEndpoint { first };
                    ConnectSelect::SameNode
                } else {
                    ConnectSelect::PairChosen {
                        from: first,
                        to: node_id.to_string(),
                    }
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectSelect {
    /// Connection mode is off; the click is an ordinary selection.
    NotConnecting,
    /// First endpoint recorded, waiting for the second.
    FirstChosen,
    /// Same node picked twice; still waiting for a distinct second node.
    SameNode,
    /// Both endpoints chosen; mode returned to idle. The caller runs
    /// `create_connection` with the pair.
    PairChosen { from: String, to: String },
}
