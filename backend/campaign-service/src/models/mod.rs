/// Data models for campaign-service
///
/// Rows map one-to-one onto the tables created by `migrations/`.
use crate::services::coordinates::{CoordinateError, MapBounds};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// World map configuration: image, geographic frame and zoom limits
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MapSettings {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub bounds_north: f64,
    pub bounds_south: f64,
    pub bounds_east: f64,
    pub bounds_west: f64,
    pub default_zoom: i32,
    pub min_zoom: i32,
    pub max_zoom: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MapSettings {
    pub fn bounds(&self) -> Result<MapBounds, CoordinateError> {
        MapBounds::new(
            self.bounds_north,
            self.bounds_south,
            self.bounds_east,
            self.bounds_west,
        )
    }
}

/// Marker icon available to pins
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Icon {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// User-placed pin, stored in image percentages
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: Uuid,
    pub map_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub x_percent: f64,
    pub y_percent: f64,
    pub icon_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scraped wiki page; the embedding itself is never loaded into Rust
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WikiDocument {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub content: String,
    pub category: Option<String>,
    pub has_embedding: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wiki page returned by a retrieval query with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScoredDocument {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub content: String,
    /// Cosine similarity for vector matches, `ts_rank` for keyword matches
    pub similarity: f64,
}

/// Region of the map image identified by image analysis
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MapArea {
    pub id: Uuid,
    pub map_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub area_type: String,
    pub x_percent: f64,
    pub y_percent: f64,
    pub width_percent: f64,
    pub height_percent: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub token: Uuid,
    pub status: String,
    pub invited_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRole {
    pub user_id: Uuid,
    pub role: String,
    pub granted_at: DateTime<Utc>,
}

/// Campaign membership role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Revoked,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Revoked => "revoked",
        }
    }
}

impl FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "revoked" => Ok(InvitationStatus::Revoked),
            other => Err(format!("unknown invitation status '{}'", other)),
        }
    }
}

/// Kinds of area the map analysis may return
pub const AREA_TYPES: &[&str] = &[
    "region", "city", "town", "forest", "mountain", "water", "desert", "swamp", "ruin",
    "dungeon", "road", "landmark",
];

pub const DEFAULT_AREA_TYPE: &str = "region";

/// Deserialize a PATCH field: absent stays `None`, `null` becomes `Some(None)`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
