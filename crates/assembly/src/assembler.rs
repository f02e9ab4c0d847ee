//! Relational assembly over a store without joins.
//!
//! Nested data is attached to an already-fetched parent in one of two ways:
//! owned children are read from a child collection by foreign key, and
//! many-to-many relations go through a junction collection followed by a
//! single bulk fetch of the related rows.

use crate::error::{FetchError, FetchResult};
use history_atlas_db::{fetch_rows, schema, CollectionClient, CollectionQuery, StoreError};
use history_atlas_telemetry::Metrics;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Child rows owned by a single parent through a foreign key.
#[derive(Debug, Clone, Copy)]
pub struct OwnedChildren {
    pub parent: &'static str,
    pub collection: &'static str,
    pub foreign_key: &'static str,
}

/// A many-to-many relation stored in a junction collection.
///
/// `owner_column` is matched against the owner's id and `related_column`
/// holds the ids looked up in `related_collection`.
#[derive(Debug, Clone, Copy)]
pub struct Junction {
    pub owner: &'static str,
    pub collection: &'static str,
    pub owner_column: &'static str,
    pub related_column: &'static str,
    pub related_collection: &'static str,
}

pub const ROUTE_POINTS: OwnedChildren = OwnedChildren {
    parent: "route",
    collection: schema::ROUTE_POINTS,
    foreign_key: schema::ROUTE_ID,
};

pub const POI_PHOTOS: OwnedChildren = OwnedChildren {
    parent: "poi",
    collection: schema::POI_PHOTOS,
    foreign_key: schema::POI_ID,
};

pub const ROUTE_PARTICIPANTS: Junction = Junction {
    owner: "route",
    collection: schema::ROUTE_PARTICIPANTS,
    owner_column: schema::ROUTE_ID,
    related_column: schema::PARTICIPANT_ID,
    related_collection: schema::PARTICIPANTS,
};

pub const POI_RESIDENTS: Junction = Junction {
    owner: "poi",
    collection: schema::POI_RESIDENTS,
    owner_column: schema::POI_ID,
    related_column: schema::PARTICIPANT_ID,
    related_collection: schema::PARTICIPANTS,
};

/// Routes a participant is linked to (inverse of [`ROUTE_PARTICIPANTS`]).
pub const PARTICIPANT_ROUTES: Junction = Junction {
    owner: "participant",
    collection: schema::ROUTE_PARTICIPANTS,
    owner_column: schema::PARTICIPANT_ID,
    related_column: schema::ROUTE_ID,
    related_collection: schema::ROUTES,
};

/// POIs a participant resides at (inverse of [`POI_RESIDENTS`]).
pub const PARTICIPANT_POIS: Junction = Junction {
    owner: "participant",
    collection: schema::POI_RESIDENTS,
    owner_column: schema::PARTICIPANT_ID,
    related_column: schema::POI_ID,
    related_collection: schema::POI,
};

/// Fetches nested rows for parents and wraps failures with parent context.
#[derive(Clone)]
pub struct Assembler {
    client: Arc<dyn CollectionClient>,
    metrics: Metrics,
}

impl Assembler {
    /// Create a new assembler.
    ///
    /// # Arguments
    /// * `client` - Shared store client
    /// * `metrics` - Metrics collector
    pub fn new(client: Arc<dyn CollectionClient>, metrics: Metrics) -> Self {
        Self { client, metrics }
    }

    /// Fetch the children of `parent_id`, in the order the store returns them.
    pub async fn children<T: DeserializeOwned>(
        &self,
        relation: &OwnedChildren,
        parent_id: i64,
    ) -> FetchResult<Vec<T>> {
        let query = CollectionQuery::from(relation.collection).eq(relation.foreign_key, parent_id);
        let children = fetch_rows(self.client.as_ref(), &query)
            .await
            .map_err(|source| FetchError::Related {
                parent: relation.parent,
                parent_id,
                related: relation.collection,
                source,
            })?;

        debug!(
            parent = relation.parent,
            parent_id,
            collection = relation.collection,
            count = children.len(),
            "Attached owned children"
        );
        Ok(children)
    }

    /// Collect the distinct related ids linked to `owner_id`, first occurrence first.
    pub async fn related_ids(&self, junction: &Junction, owner_id: i64) -> FetchResult<Vec<i64>> {
        let query = CollectionQuery::from(junction.collection)
            .select(&[junction.related_column])
            .eq(junction.owner_column, owner_id);
        let wrap = |source| FetchError::Related {
            parent: junction.owner,
            parent_id: owner_id,
            related: junction.collection,
            source,
        };

        let rows = self.client.execute(&query).await.map_err(wrap)?;
        let mut seen = HashSet::with_capacity(rows.len());
        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = link_id(junction, row).map_err(wrap)?;
            if seen.insert(id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Fetch the full related rows linked to `owner_id` through `junction`.
    ///
    /// With no junction rows the result is empty and the related collection
    /// is never queried; an `in` list must not be empty.
    pub async fn related<T: DeserializeOwned>(
        &self,
        junction: &Junction,
        owner_id: i64,
    ) -> FetchResult<Vec<T>> {
        let ids = self.related_ids(junction, owner_id).await?;
        if ids.is_empty() {
            self.metrics.inc_junction_short_circuits();
            debug!(
                owner = junction.owner,
                owner_id,
                junction = junction.collection,
                "No junction rows, skipping related fetch"
            );
            return Ok(Vec::new());
        }

        let query = CollectionQuery::from(junction.related_collection).is_in(schema::ID, &ids);
        let related = fetch_rows(self.client.as_ref(), &query)
            .await
            .map_err(|source| FetchError::Related {
                parent: junction.owner,
                parent_id: owner_id,
                related: junction.related_collection,
                source,
            })?;

        debug!(
            owner = junction.owner,
            owner_id,
            collection = junction.related_collection,
            linked = ids.len(),
            fetched = related.len(),
            "Attached related rows"
        );
        Ok(related)
    }
}

fn link_id(junction: &Junction, row: &Value) -> Result<i64, StoreError> {
    row.get(junction.related_column)
        .and_then(Value::as_i64)
        .ok_or_else(|| StoreError::Decode {
            collection: junction.collection.to_string(),
            source: serde_json::Error::custom(format!(
                "missing integer column `{}`",
                junction.related_column
            )),
        })
}
