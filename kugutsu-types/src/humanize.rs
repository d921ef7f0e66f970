use serde::{Deserialize, Serialize};

/// Velocity of one hit before humanization: a base value, a symmetric
/// jitter range and the lowest velocity the hit may land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VelocitySpec {
    pub base: u8,
    pub range: u8,
    pub floor: u8,
}

impl VelocitySpec {
    /// Primary hits use a jitter of 10.
    pub const fn new(base: u8) -> Self {
        Self { base, range: 10, floor: 1 }
    }

    pub const fn with_range(base: u8, range: u8) -> Self {
        Self { base, range, floor: 1 }
    }
}
