//! Integration tests for the domain fetch service.

use history_atlas_assembly::{AtlasService, FetchError};
use history_atlas_db::models::{ParticipantFilter, PoiFilter, RouteFilter};
use history_atlas_db::test_support::MemoryStore;
use history_atlas_db::StoreError;
use history_atlas_telemetry::Metrics;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

fn participant(id: i64, country: &str, role: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Participant {}", id),
        "country": country,
        "role": role,
        "description": "Recorded in the chronicle"
    })
}

fn point(id: i64, route_id: i64, lat: f64, lng: f64) -> Value {
    json!({"id": id, "route_id": route_id, "lat": lat, "lng": lng})
}

fn dataset() -> MemoryStore {
    MemoryStore::new()
        .with_rows(
            "routes",
            vec![
                json!({"id": 1, "name": "Amber Road", "transport": "walking", "is_global": false, "country": "CZ"}),
                json!({"id": 2, "name": "Silk Road", "transport": "caravan", "is_global": true}),
                json!({"id": 3, "name": "Vltava Path", "transport": "walking", "is_global": false, "country": "CZ"}),
                json!({"id": 4, "name": "Via Regia", "transport": "walking", "is_global": true}),
            ],
        )
        .with_rows(
            "route_points",
            vec![
                point(11, 1, 50.1, 14.4),
                point(12, 1, 50.2, 14.5),
                point(13, 1, 50.0, 14.3),
                point(31, 3, 49.9, 14.1),
                point(21, 2, 39.9, 116.4),
            ],
        )
        .with_rows(
            "participants",
            vec![
                participant(7, "CZ", "merchant"),
                participant(8, "CZ", "monk"),
                participant(9, "PL", "merchant"),
                participant(42, "DE", "pilgrim"),
            ],
        )
        .with_rows(
            "route_participants",
            vec![
                json!({"route_id": 1, "participant_id": 7}),
                json!({"route_id": 1, "participant_id": 9}),
                json!({"route_id": 2, "participant_id": 8}),
                json!({"route_id": 4, "participant_id": 7}),
            ],
        )
        .with_rows(
            "poi",
            vec![
                json!({"id": 100, "name": "Old Town", "lat": 50.08, "lng": 14.42, "type": "city", "description": "Market square", "is_living_place": "true"}),
                json!({"id": 101, "name": "Karlštejn", "lat": 49.93, "lng": 14.18, "type": "castle", "description": "Royal castle", "is_living_place": "false"}),
                json!({"id": 102, "name": "Hradec", "lat": 50.2, "lng": 15.8, "type": "city", "description": "Fortress town"}),
            ],
        )
        .with_rows(
            "poi_photos",
            vec![
                json!({"id": 1000, "poi_id": 100, "url": "https://img.example/old-town.jpg"}),
                json!({"id": 1001, "poi_id": 101, "url": "https://img.example/karlstejn.jpg"}),
                json!({"id": 1002, "poi_id": 100, "url": "https://img.example/old-town-2.jpg"}),
            ],
        )
        .with_rows(
            "poi_residents",
            vec![
                json!({"poi_id": 100, "participant_id": 8}),
                json!({"poi_id": 101, "participant_id": 7}),
            ],
        )
}

fn service(store: Arc<MemoryStore>) -> AtlasService {
    AtlasService::new(store, Metrics::new().unwrap(), 4)
}

fn ids<T>(items: &[T], id: impl Fn(&T) -> i64) -> HashSet<i64> {
    items.iter().map(id).collect()
}

#[tokio::test]
async fn test_local_walking_routes_are_fully_assembled() {
    let store = Arc::new(dataset());
    let filter = RouteFilter {
        transport: Some("walking".to_string()),
        is_global: Some(false),
        ..Default::default()
    };

    let routes = service(store).fetch_routes(&filter).await.unwrap();
    let route_ids: Vec<i64> = routes.iter().map(|r| r.id).collect();
    assert_eq!(route_ids, vec![1, 3]);

    for route in &routes {
        assert!(!route.is_global);
        assert_eq!(route.transport, "walking");
        assert!(route.path.iter().all(|p| p.route_id == route.id));
        assert!(route.participants.is_some());
    }

    let amber = &routes[0];
    let path_ids: Vec<i64> = amber.path.iter().map(|p| p.id).collect();
    assert_eq!(path_ids, vec![11, 12, 13]);
    let participants = amber.participants.as_deref().unwrap();
    assert_eq!(participants.len(), 2);
    assert_eq!(ids(participants, |p| p.id), HashSet::from([7, 9]));

    let vltava = &routes[1];
    assert_eq!(vltava.path.len(), 1);
    assert_eq!(vltava.participants.as_deref(), Some(&[][..]));
}

#[tokio::test]
async fn test_unfiltered_routes_return_everything() {
    let store = Arc::new(dataset());
    let routes = service(store.clone())
        .fetch_routes(&RouteFilter::default())
        .await
        .unwrap();
    assert_eq!(routes.len(), 4);

    let executed = store.executed();
    assert_eq!(executed[0].collection(), "routes");
    assert!(executed[0].predicates().is_empty());
}

#[tokio::test]
async fn test_routes_without_participants_skip_participant_fetch() {
    let store = Arc::new(dataset());
    let filter = RouteFilter {
        country: Some("CZ".to_string()),
        transport: Some("walking".to_string()),
        is_global: Some(false),
    };

    let routes = service(store.clone()).fetch_routes(&filter).await.unwrap();
    assert_eq!(routes.len(), 2);
    // Only route 1 has junction rows.
    assert_eq!(store.calls_to("participants"), 1);
    assert_eq!(store.calls_to("route_participants"), 2);
}

#[tokio::test]
async fn test_pois_with_photos_and_residents() {
    let store = Arc::new(dataset());
    let filter = PoiFilter {
        poi_type: Some("city".to_string()),
        is_living_place: Some(true),
    };

    let pois = service(store).fetch_pois(&filter).await.unwrap();
    assert_eq!(pois.len(), 1);
    let old_town = &pois[0];
    assert_eq!(old_town.id, 100);
    let photo_ids: Vec<i64> = old_town.photos.iter().map(|p| p.id).collect();
    assert_eq!(photo_ids, vec![1000, 1002]);
    assert!(old_town.photos.iter().all(|p| p.poi_id == 100));
    let residents = old_town.participants.as_deref().unwrap();
    assert_eq!(ids(residents, |p| p.id), HashSet::from([8]));
}

#[tokio::test]
async fn test_living_place_false_is_a_real_constraint() {
    let store = Arc::new(dataset());
    let filter = PoiFilter {
        poi_type: None,
        is_living_place: Some(false),
    };

    let pois = service(store).fetch_pois(&filter).await.unwrap();
    let poi_ids: Vec<i64> = pois.iter().map(|p| p.id).collect();
    assert_eq!(poi_ids, vec![101]);
}

#[tokio::test]
async fn test_participants_are_flat() {
    let store = Arc::new(dataset());
    let filter = ParticipantFilter {
        country: Some("CZ".to_string()),
        role: Some("merchant".to_string()),
    };

    let participants = service(store.clone())
        .fetch_participants(&filter)
        .await
        .unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].id, 7);
    assert_eq!(store.executed().len(), 1);
}

#[tokio::test]
async fn test_map_config_single_row() {
    let store = Arc::new(MemoryStore::new().with_rows(
        "map_config",
        vec![json!({"id": 1, "center_lat": 50.0, "center_lng": 14.4, "zoom": 5})],
    ));

    let config = service(store).fetch_map_config().await.unwrap();
    assert_eq!(config.id, 1);
    assert_eq!(config.center_lat, 50.0);
    assert_eq!(config.center_lng, 14.4);
    assert_eq!(config.zoom, 5);
}

#[tokio::test]
async fn test_map_config_cardinality_failures() {
    let empty = Arc::new(MemoryStore::new());
    let err = service(empty).fetch_map_config().await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Store(StoreError::Cardinality { count: 0, .. })
    ));

    let two = Arc::new(MemoryStore::new().with_rows(
        "map_config",
        vec![
            json!({"id": 1, "center_lat": 50.0, "center_lng": 14.4, "zoom": 5}),
            json!({"id": 2, "center_lat": 48.0, "center_lng": 16.3, "zoom": 6}),
        ],
    ));
    let err = service(two).fetch_map_config().await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Store(StoreError::Cardinality { count: 2, .. })
    ));
}

#[tokio::test]
async fn test_participant_without_routes_makes_no_route_call() {
    let store = Arc::new(dataset());

    let routes = service(store.clone())
        .fetch_routes_for_participant(42)
        .await
        .unwrap();
    assert!(routes.is_empty());
    assert_eq!(store.calls_to("route_participants"), 1);
    assert_eq!(store.calls_to("routes"), 0);
    assert_eq!(store.calls_to("route_points"), 0);
}

#[tokio::test]
async fn test_routes_for_participant_attach_paths_only() {
    let store = Arc::new(dataset());

    let routes = service(store.clone())
        .fetch_routes_for_participant(7)
        .await
        .unwrap();
    assert_eq!(ids(&routes, |r| r.id), HashSet::from([1, 4]));
    for route in &routes {
        assert!(route.participants.is_none());
        assert!(route.path.iter().all(|p| p.route_id == route.id));
    }
    assert_eq!(store.calls_to("routes"), 1);
    assert_eq!(store.calls_to("participants"), 0);
}

#[tokio::test]
async fn test_pois_for_participant() {
    let store = Arc::new(dataset());
    let svc = service(store.clone());

    let pois = svc.fetch_pois_for_participant(7).await.unwrap();
    assert_eq!(pois.len(), 1);
    assert_eq!(pois[0].id, 101);
    assert_eq!(pois[0].photos.len(), 1);
    assert!(pois[0].participants.is_none());

    let none = svc.fetch_pois_for_participant(9).await.unwrap();
    assert!(none.is_empty());
    assert_eq!(store.calls_to("poi"), 1);
}

#[tokio::test]
async fn test_child_failure_fails_the_whole_batch() {
    let store = Arc::new(dataset().failing_on("route_points"));

    let err = service(store)
        .fetch_routes(&RouteFilter::default())
        .await
        .unwrap_err();
    match err {
        FetchError::Related {
            parent, related, ..
        } => {
            assert_eq!(parent, "route");
            assert_eq!(related, "route_points");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_top_level_failure_is_propagated() {
    let store = Arc::new(dataset().failing_on("participants"));

    let err = service(store)
        .fetch_participants(&ParticipantFilter::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("participants"));
}
