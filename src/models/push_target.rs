use serde::{Deserialize, Serialize};

/// Device registration a beneficiary can be notified on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushTarget {
    pub beneficiary_id: String,
    pub token: String,
}

impl PushTarget {
    pub fn new(beneficiary_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            beneficiary_id: beneficiary_id.into(),
            token: token.into(),
        }
    }
}
