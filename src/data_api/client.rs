//! Blocking HTTP client for the data service.
//!
//! One GET per call, no retry and no timeout: a page waits for its data.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use super::{Collection, DataSource};
use crate::error::CollaboratorError;
use crate::records::LoginRecord;

const SERVICE: &str = "data service";

pub struct DataApiClient {
    client: Client,
    base_url: Url,
}

impl DataApiClient {
    pub fn new(base_url: Url) -> Result<Self, reqwest::Error> {
        // The blocking client defaults to a 30 second timeout; data calls wait.
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self { client, base_url })
    }

    /// `base_url` with `segments` appended, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, url: Url) -> Result<Response, CollaboratorError> {
        log::debug!("GET {}", url);
        self.client
            .get(url)
            .send()
            .map_err(|e| CollaboratorError::from_transport(SERVICE, e, None))
    }
}

fn error_for_status(resp: Response) -> CollaboratorError {
    let status = resp.status();
    let text = resp.text().unwrap_or_default();
    CollaboratorError::Status {
        service: SERVICE,
        status: status.as_u16(),
        message: text,
    }
}

fn decode_error(e: reqwest::Error) -> CollaboratorError {
    CollaboratorError::Decode {
        service: SERVICE,
        message: e.to_string(),
    }
}

impl DataSource for DataApiClient {
    fn fetch_raw(&self, collection: Collection) -> Result<Vec<Value>, CollaboratorError> {
        let resp = self.get(self.endpoint(&["data", collection.path()]))?;
        if !resp.status().is_success() {
            return Err(error_for_status(resp));
        }
        resp.json::<Vec<Value>>().map_err(decode_error)
    }

    fn fetch_login(&self, login: &str) -> Result<LoginRecord, CollaboratorError> {
        let resp = self.get(self.endpoint(&["personnel", "login", login]))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(CollaboratorError::NotFound(format!("login '{}'", login)));
        }
        if !resp.status().is_success() {
            return Err(error_for_status(resp));
        }
        resp.json::<LoginRecord>().map_err(decode_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> DataApiClient {
        DataApiClient::new(Url::parse(base).expect("url")).expect("client")
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api = client("http://localhost:5001");
        assert_eq!(
            api.endpoint(&["data", Collection::Articles.path()]).as_str(),
            "http://localhost:5001/data/articles"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_login() {
        let api = client("http://gateway.local/api/");
        assert_eq!(
            api.endpoint(&["personnel", "login", "j doe/x"]).as_str(),
            "http://gateway.local/api/personnel/login/j%20doe%2Fx"
        );
    }
}
