//! Coordinator configuration.

/// Tunables for the trip lifecycle coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How many times trip creation may allocate a number before giving up
    /// with a conflict. Each attempt after the first follows a duplicate-key
    /// rejection from the store.
    pub max_allocation_attempts: u32,
}

impl CoordinatorConfig {
    pub fn new(max_allocation_attempts: u32) -> Self {
        Self {
            max_allocation_attempts,
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_allocation_attempts: 5,
        }
    }
}
