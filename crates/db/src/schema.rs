//! Collection and column names in the remote store.

pub const ROUTES: &str = "routes";
pub const ROUTE_POINTS: &str = "route_points";
pub const ROUTE_PARTICIPANTS: &str = "route_participants";
pub const POI: &str = "poi";
pub const POI_PHOTOS: &str = "poi_photos";
pub const POI_RESIDENTS: &str = "poi_residents";
pub const PARTICIPANTS: &str = "participants";
pub const MAP_CONFIG: &str = "map_config";

pub const ID: &str = "id";
pub const ROUTE_ID: &str = "route_id";
pub const POI_ID: &str = "poi_id";
pub const PARTICIPANT_ID: &str = "participant_id";
