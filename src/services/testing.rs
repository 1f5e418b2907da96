//! In-memory collaborators for page tests.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::data_api::{Collection, DataSource};
use crate::error::CollaboratorError;
use crate::partners::{Formation, PartnerSource};
use crate::records::LoginRecord;

/// Snapshot served from memory. Collections never set are empty.
#[derive(Debug, Default)]
pub(crate) struct FixtureSource {
    collections: HashMap<Collection, Vec<Value>>,
    failing: HashSet<Collection>,
    logins: HashMap<String, Value>,
}

impl FixtureSource {
    pub fn with(mut self, collection: Collection, records: Value) -> Self {
        let records = match records {
            Value::Array(items) => items,
            other => vec![other],
        };
        self.collections.insert(collection, records);
        self
    }

    pub fn failing(mut self, collection: Collection) -> Self {
        self.failing.insert(collection);
        self
    }

    pub fn with_login(mut self, login: &str, record: Value) -> Self {
        self.logins.insert(login.to_string(), record);
        self
    }
}

impl DataSource for FixtureSource {
    fn fetch_raw(&self, collection: Collection) -> Result<Vec<Value>, CollaboratorError> {
        if self.failing.contains(&collection) {
            return Err(CollaboratorError::Network {
                service: "data service",
                message: format!("connection refused for {}", collection.path()),
            });
        }
        Ok(self.collections.get(&collection).cloned().unwrap_or_default())
    }

    fn fetch_login(&self, login: &str) -> Result<LoginRecord, CollaboratorError> {
        let record = self
            .logins
            .get(login)
            .ok_or_else(|| CollaboratorError::NotFound(format!("login '{}'", login)))?;
        serde_json::from_value(record.clone()).map_err(|e| CollaboratorError::Decode {
            service: "data service",
            message: e.to_string(),
        })
    }
}

/// Partner doubles. Unset answers fail like an unreachable service.
#[derive(Debug, Default)]
pub(crate) struct FixturePartners {
    formations: Option<Value>,
    formations_status: Option<u16>,
    drone: Option<Value>,
}

impl FixturePartners {
    pub fn with_formations(mut self, formations: Value) -> Self {
        self.formations = Some(formations);
        self
    }

    /// Formations service answering with a non-success HTTP status.
    pub fn formations_status(mut self, status: u16) -> Self {
        self.formations_status = Some(status);
        self
    }

    pub fn with_drone(mut self, drone: Value) -> Self {
        self.drone = Some(drone);
        self
    }
}

fn unreachable(service: &'static str) -> CollaboratorError {
    CollaboratorError::Network {
        service,
        message: "connection refused".to_string(),
    }
}

impl PartnerSource for FixturePartners {
    fn formations(&self) -> Result<Vec<Formation>, CollaboratorError> {
        if let Some(status) = self.formations_status {
            return Err(CollaboratorError::Status {
                service: "formations service",
                status,
                message: "Service Unavailable".to_string(),
            });
        }
        let raw = self.formations.clone().ok_or_else(|| unreachable("formations service"))?;
        serde_json::from_value(raw).map_err(|e| CollaboratorError::Decode {
            service: "formations service",
            message: e.to_string(),
        })
    }

    fn oldest_drone(&self) -> Result<Value, CollaboratorError> {
        self.drone.clone().ok_or_else(|| unreachable("drone service"))
    }
}
