use serde::{Deserialize, Serialize};

/// Named urgency level. Lists sort by `position`, lowest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priority {
    pub id: u64,
    pub name: String,
    pub position: i32,
}
