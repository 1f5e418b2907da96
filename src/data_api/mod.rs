//! Read-only access to the data service that fronts the document store.
//!
//! The service exposes one JSON array per collection under `/data/{name}` and
//! a single-record login lookup. Pages depend on the [`DataSource`] trait so
//! they can be computed against any snapshot.

pub mod client;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CollaboratorError;
use crate::records::{
    Article, CommercialOperation, Identity, LoginRecord, Personnel, SanitaryReading,
    SurveillanceRecord,
};

pub use client::DataApiClient;

/// The raw collections served by the data service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Personnel,
    Surveillance,
    Articles,
    SanitaryReadings,
    CommercialOperations,
}

impl Collection {
    /// Path segment under `/data/`.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Personnel => "personnel",
            Self::Surveillance => "surveillance",
            Self::Articles => "articles",
            Self::SanitaryReadings => "releves_sanitaires",
            Self::CommercialOperations => "operations_commerciales",
        }
    }
}

/// Where pages get their snapshot from.
pub trait DataSource {
    /// Every record of `collection`, undecoded.
    fn fetch_raw(&self, collection: Collection) -> Result<Vec<Value>, CollaboratorError>;

    /// Identity record for a login, `CollaboratorError::NotFound` if unknown.
    fn fetch_login(&self, login: &str) -> Result<LoginRecord, CollaboratorError>;
}

/// A record type served by one collection.
pub trait CollectionRecord: DeserializeOwned {
    const COLLECTION: Collection;
}

impl CollectionRecord for Personnel {
    const COLLECTION: Collection = Collection::Personnel;
}

impl CollectionRecord for SurveillanceRecord {
    const COLLECTION: Collection = Collection::Surveillance;
}

impl CollectionRecord for Article {
    const COLLECTION: Collection = Collection::Articles;
}

impl CollectionRecord for SanitaryReading {
    const COLLECTION: Collection = Collection::SanitaryReadings;
}

impl CollectionRecord for CommercialOperation {
    const COLLECTION: Collection = Collection::CommercialOperations;
}

/// Fetch and decode one collection.
pub fn fetch<T: CollectionRecord>(source: &dyn DataSource) -> Result<Vec<T>, CollaboratorError> {
    let raw = source.fetch_raw(T::COLLECTION)?;
    Ok(decode_records(T::COLLECTION, raw))
}

/// Identity behind a login, password stripped.
pub fn lookup_identity(source: &dyn DataSource, login: &str) -> Result<Identity, CollaboratorError> {
    let record = source.fetch_login(login)?;
    log::info!("Resolved login '{}' to role {}", login, record.role());
    Ok(record.identity())
}

/// Decode each element on its own. Elements that are not JSON objects are
/// dropped with a warning; fields inside an object never fail decoding.
fn decode_records<T: DeserializeOwned>(collection: Collection, raw: Vec<Value>) -> Vec<T> {
    let total = raw.len();
    let records: Vec<T> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| {
            if !value.is_object() {
                log::warn!(
                    "Skipping {} record #{}: expected an object, got {}",
                    collection.path(),
                    position,
                    value
                );
                return None;
            }
            match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping {} record #{}: {}", collection.path(), position, e);
                    None
                }
            }
        })
        .collect();
    log::debug!("Decoded {}/{} {} records", records.len(), total, collection.path());
    records
}
