//! Page requests and the clamping policy applied by domain services

use serde::{Deserialize, Serialize};

/// Offset pagination as sent by callers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub take: u64,
}

impl PageRequest {
    pub fn new(skip: u64, take: u64) -> Self {
        Self { skip, take }
    }
}

/// Default page size and hard cap for `List` operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePolicy {
    pub default_take: u64,
    pub max_take: u64,
}

impl PagePolicy {
    pub const DEFAULT_TAKE: u64 = 50;
    pub const MAX_TAKE: u64 = 100;

    /// Build a policy; the default never exceeds the cap and neither is zero.
    pub fn new(default_take: u64, max_take: u64) -> Self {
        let max_take = max_take.max(1);
        Self {
            default_take: default_take.clamp(1, max_take),
            max_take,
        }
    }

    /// The page a service actually asks storage for.
    ///
    /// `take == 0` means "default page size"; anything above the cap is clamped.
    pub fn effective(&self, request: PageRequest) -> PageRequest {
        let take = match request.take {
            0 => self.default_take,
            take => take.min(self.max_take),
        };
        PageRequest {
            skip: request.skip,
            take,
        }
    }
}

impl Default for PagePolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TAKE, Self::MAX_TAKE)
    }
}
