//! Domain fetch service.
//!
//! One operation per entity type. Each builds its top-level query from a
//! filter, then assembles nested data for every returned entity with bounded
//! concurrency. The first failure aborts the batch and drops any sub-fetches
//! still in flight.

use crate::assembler::{
    Assembler, PARTICIPANT_POIS, PARTICIPANT_ROUTES, POI_PHOTOS, POI_RESIDENTS, ROUTE_PARTICIPANTS,
    ROUTE_POINTS,
};
use crate::error::FetchResult;
use futures::{stream, Future, StreamExt, TryStreamExt};
use history_atlas_db::models::{
    MapConfig, Participant, ParticipantFilter, Poi, PoiFilter, PoiPhoto, Route, RouteFilter,
    RoutePoint,
};
use history_atlas_db::{fetch_rows, fetch_single, schema, CollectionClient, CollectionQuery, ToQuery};
use history_atlas_telemetry::Metrics;
use std::sync::Arc;
use tracing::{debug, info};

/// Default number of entities assembled concurrently within one request.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// Fetches fully assembled routes, POIs, participants and map configuration.
#[derive(Clone)]
pub struct AtlasService {
    client: Arc<dyn CollectionClient>,
    assembler: Assembler,
    concurrency: usize,
}

impl AtlasService {
    /// Create a new service.
    ///
    /// # Arguments
    /// * `client` - Shared store client
    /// * `metrics` - Metrics collector
    /// * `concurrency` - Entities assembled at once per request (at least 1)
    pub fn new(client: Arc<dyn CollectionClient>, metrics: Metrics, concurrency: usize) -> Self {
        Self {
            assembler: Assembler::new(client.clone(), metrics),
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch routes matching `filter`, each with its path and participants.
    pub async fn fetch_routes(&self, filter: &RouteFilter) -> FetchResult<Vec<Route>> {
        let routes: Vec<Route> = fetch_rows(self.client.as_ref(), &filter.to_query()).await?;
        debug!(count = routes.len(), ?filter, "Fetched routes");

        self.assemble_all(routes, |route| self.assemble_route(route, true))
            .await
    }

    /// Fetch POIs matching `filter`, each with its photos and residents.
    pub async fn fetch_pois(&self, filter: &PoiFilter) -> FetchResult<Vec<Poi>> {
        let pois: Vec<Poi> = fetch_rows(self.client.as_ref(), &filter.to_query()).await?;
        debug!(count = pois.len(), ?filter, "Fetched POIs");

        self.assemble_all(pois, |poi| self.assemble_poi(poi, true)).await
    }

    /// Fetch participants matching `filter`. No nesting.
    pub async fn fetch_participants(
        &self,
        filter: &ParticipantFilter,
    ) -> FetchResult<Vec<Participant>> {
        let participants: Vec<Participant> =
            fetch_rows(self.client.as_ref(), &filter.to_query()).await?;
        debug!(count = participants.len(), ?filter, "Fetched participants");
        Ok(participants)
    }

    /// Fetch the single map configuration row.
    pub async fn fetch_map_config(&self) -> FetchResult<MapConfig> {
        let query = CollectionQuery::from(schema::MAP_CONFIG).single();
        Ok(fetch_single(self.client.as_ref(), &query).await?)
    }

    /// Fetch the routes linked to a participant, each with its path.
    ///
    /// Participants are not attached to these routes.
    pub async fn fetch_routes_for_participant(&self, participant_id: i64) -> FetchResult<Vec<Route>> {
        let routes: Vec<Route> = self
            .assembler
            .related(&PARTICIPANT_ROUTES, participant_id)
            .await?;
        info!(participant_id, count = routes.len(), "Fetched routes for participant");

        self.assemble_all(routes, |route| self.assemble_route(route, false))
            .await
    }

    /// Fetch the POIs a participant resides at, each with its photos.
    ///
    /// Participants are not attached to these POIs.
    pub async fn fetch_pois_for_participant(&self, participant_id: i64) -> FetchResult<Vec<Poi>> {
        let pois: Vec<Poi> = self
            .assembler
            .related(&PARTICIPANT_POIS, participant_id)
            .await?;
        info!(participant_id, count = pois.len(), "Fetched POIs for participant");

        self.assemble_all(pois, |poi| self.assemble_poi(poi, false))
            .await
    }

    async fn assemble_route(&self, mut route: Route, with_participants: bool) -> FetchResult<Route> {
        let path = self.assembler.children::<RoutePoint>(&ROUTE_POINTS, route.id);
        if with_participants {
            let participants = self.assembler.related::<Participant>(&ROUTE_PARTICIPANTS, route.id);
            let (path, participants) = tokio::try_join!(path, participants)?;
            route.path = path;
            route.participants = Some(participants);
        } else {
            route.path = path.await?;
        }
        Ok(route)
    }

    async fn assemble_poi(&self, mut poi: Poi, with_participants: bool) -> FetchResult<Poi> {
        let photos = self.assembler.children::<PoiPhoto>(&POI_PHOTOS, poi.id);
        if with_participants {
            let participants = self.assembler.related::<Participant>(&POI_RESIDENTS, poi.id);
            let (photos, participants) = tokio::try_join!(photos, participants)?;
            poi.photos = photos;
            poi.participants = Some(participants);
        } else {
            poi.photos = photos.await?;
        }
        Ok(poi)
    }

    // Output order matches input order.
    async fn assemble_all<T, F, Fut>(&self, items: Vec<T>, assemble: F) -> FetchResult<Vec<T>>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = FetchResult<T>>,
    {
        stream::iter(items)
            .map(assemble)
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}
