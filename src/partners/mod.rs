//! Third-party services shown on the global dashboard.
//!
//! Both answers are optional decoration: a failing partner never degrades the
//! page, it yields a fallback value instead.

pub mod client;
pub mod formations;

use serde_json::Value;

use crate::error::CollaboratorError;

pub use client::PartnerClient;
pub use formations::Formation;

pub trait PartnerSource {
    /// Every formation known to the formations service.
    fn formations(&self) -> Result<Vec<Formation>, CollaboratorError>;

    /// The oldest drone in the fleet, as served.
    fn oldest_drone(&self) -> Result<Value, CollaboratorError>;
}

/// Oldest drone record, `None` when the service fails or answers null.
pub fn oldest_drone(partners: &dyn PartnerSource) -> Option<Value> {
    match partners.oldest_drone() {
        Ok(Value::Null) => None,
        Ok(drone) => Some(drone),
        Err(e) => {
            log::warn!("Drone service unavailable, showing no drone: {}", e);
            None
        }
    }
}
