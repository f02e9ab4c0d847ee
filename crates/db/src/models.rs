//! Domain models and filter types.

use serde::{Deserialize, Deserializer, Serialize};

/// A historical route with its path and the participants linked to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    pub name: String,
    pub transport: String,
    pub is_global: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_participant_id: Option<i64>,
    /// Path points in the order the store returned them.
    #[serde(default)]
    pub path: Vec<RoutePoint>,
    /// `None` when participants were not assembled for this route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,
}

/// A single point on a route's path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub id: i64,
    pub route_id: i64,
    pub lat: f64,
    pub lng: f64,
}

/// A point of interest with its photos and resident participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "type")]
    pub poi_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "flag_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_living_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident_participant_id: Option<i64>,
    #[serde(default)]
    pub photos: Vec<PoiPhoto>,
    /// `None` when participants were not assembled for this POI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,
}

/// A photo attached to a POI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiPhoto {
    pub id: i64,
    pub poi_id: i64,
    pub url: String,
}

/// A person or entity linked to routes and POIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub role: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

/// Initial map viewport. The store holds exactly one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub id: i64,
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: i32,
}

/// Route selection criteria. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouteFilter {
    pub country: Option<String>,
    pub transport: Option<String>,
    pub is_global: Option<bool>,
}

/// POI selection criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PoiFilter {
    #[serde(rename = "type")]
    pub poi_type: Option<String>,
    pub is_living_place: Option<bool>,
}

/// Participant selection criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ParticipantFilter {
    pub country: Option<String>,
    pub role: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// The store keeps this flag as nullable text; older rows carry a JSON boolean.
fn flag_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(value) => value.to_string(),
        Flag::Text(text) => text,
    }))
}
