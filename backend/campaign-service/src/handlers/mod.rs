/// HTTP handlers for campaign-service
///
/// - Maps: map settings CRUD, analyzed areas, coordinate conversion
/// - Locations: pins on a map
/// - Wiki + chat: document ingestion, retrieval and the lore assistant
/// - Invitations: invites, acceptance and user roles
pub mod chat;
pub mod health;
pub mod icons;
pub mod invitations;
pub mod locations;
pub mod map_analysis;
pub mod maps;
pub mod wiki;

pub use chat::chat;
pub use health::health;
pub use icons::{create_icon, delete_icon, list_icons};
pub use invitations::{
    accept_invitation, create_invitation, get_role, list_invitations, list_roles,
    revoke_invitation, set_role,
};
pub use locations::{create_location, delete_location, get_location, list_locations, update_location};
pub use map_analysis::{analyze_map, analyze_map_by_body, list_map_areas};
pub use maps::{convert_coordinates, create_map, delete_map, get_map, list_maps, update_map};
pub use wiki::{
    backfill_embeddings, delete_document, get_document, ingest_document, list_documents,
    search_documents,
};
