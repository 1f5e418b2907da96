//! Blocking HTTP client for the formations and drone services.
//!
//! The formations call is the only bounded call in the system; the drone
//! call waits like every data-service call.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::{Formation, PartnerSource};
use crate::error::CollaboratorError;

const FORMATIONS_SERVICE: &str = "formations service";
const DRONE_SERVICE: &str = "drone service";

pub struct PartnerClient {
    client: Client,
    formations_url: Url,
    drone_url: Url,
    formations_timeout: Duration,
}

impl PartnerClient {
    pub fn new(
        formations_base: Url,
        drone_base: Url,
        formations_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(None::<Duration>).build()?,
            formations_url: join(formations_base, &["general", "formations"]),
            drone_url: join(drone_base, &["finance_gestion", "drone", "plus_ancien"]),
            formations_timeout,
        })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &Url,
        timeout: Option<Duration>,
    ) -> Result<T, CollaboratorError> {
        log::debug!("GET {}", url);
        let mut request = self.client.get(url.clone());
        if let Some(limit) = timeout {
            request = request.timeout(limit);
        }
        let timeout_secs = timeout.map(|d| d.as_secs());
        let resp = request
            .send()
            .map_err(|e| CollaboratorError::from_transport(service, e, timeout_secs))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().unwrap_or_default();
            return Err(CollaboratorError::Status {
                service,
                status: status.as_u16(),
                message: text,
            });
        }

        resp.json::<T>()
            .map_err(|e| CollaboratorError::from_transport(service, e, timeout_secs))
    }
}

fn join(mut base: Url, segments: &[&str]) -> Url {
    if let Ok(mut path) = base.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    base
}

impl PartnerSource for PartnerClient {
    fn formations(&self) -> Result<Vec<Formation>, CollaboratorError> {
        self.get_json(FORMATIONS_SERVICE, &self.formations_url, Some(self.formations_timeout))
    }

    fn oldest_drone(&self) -> Result<Value, CollaboratorError> {
        self.get_json(DRONE_SERVICE, &self.drone_url, None)
    }
}
