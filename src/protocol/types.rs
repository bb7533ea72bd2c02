use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest index whose Fibonacci value fits in a `u64`.
pub const MAX_INDEX: u64 = 93;

/// One of the two roles a connection can hold at the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Compute,
    Storage,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Compute => "compute",
            Role::Storage => "storage",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "compute" => Ok(Role::Compute),
            "storage" => Ok(Role::Storage),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The two dependencies of a Fibonacci index, `n1 = n - 1` and `n2 = n - 2`.
///
/// Also the correlation key of a lookup: a compute peer has at most one outstanding
/// request per distinct pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuePair {
    pub n1: u64,
    pub n2: u64,
}

impl ValuePair {
    /// Dependencies of `target`. Only meaningful for `target >= 2`.
    pub fn dependencies_of(target: u64) -> Self {
        Self {
            n1: target.saturating_sub(1),
            n2: target.saturating_sub(2),
        }
    }

    /// Both members, smaller first.
    pub fn members(&self) -> [u64; 2] {
        if self.n1 <= self.n2 {
            [self.n1, self.n2]
        } else {
            [self.n2, self.n1]
        }
    }
}

/// Serialized memo cache plus progress counters.
///
/// Persisted by the storage peer and handed to the compute peer on reconnect.
/// Layout: `{"values": [[index, value], ...], "targetN": int|null, "originalTargetN": int|null, "messageCount": int}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub values: Vec<(u64, u64)>,
    #[serde(default)]
    pub target_n: Option<u64>,
    #[serde(default)]
    pub original_target_n: Option<u64>,
    #[serde(default)]
    pub message_count: u64,
}
