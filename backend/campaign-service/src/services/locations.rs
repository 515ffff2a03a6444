/// Location (pin) service
///
/// Pins are stored as image percentages. Callers may place them either by
/// percentage or by geographic coordinate; the latter is converted with the
/// owning map's bounds, and every response carries both forms.
use crate::db::location_repo::{self, LocationValues};
use crate::db::map_settings_repo;
use crate::error::{AppError, Result};
use crate::models::{Location, MapSettings};
use crate::services::coordinates::{
    clamp_percent, round_to, to_lat_lng, to_percent, LatLng, MapBounds, MapPercent,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Decimal places of derived coordinates in responses
pub const COORDINATE_PLACES: u32 = 6;

/// Position given either as `{x, y}` percentages or as `{lat, lng}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct PositionInput {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl PositionInput {
    /// Percent position on the map, `None` when no coordinate was given
    pub fn resolve(&self, bounds: &MapBounds) -> Result<Option<MapPercent>> {
        let finite = |v: f64, field: &str| {
            if v.is_finite() {
                Ok(v)
            } else {
                Err(AppError::Validation(format!("{} must be a finite number", field)))
            }
        };

        match (self.x, self.y, self.lat, self.lng) {
            (None, None, None, None) => Ok(None),
            (Some(x), Some(y), None, None) => Ok(Some(MapPercent {
                x: clamp_percent(finite(x, "x")?),
                y: clamp_percent(finite(y, "y")?),
            })),
            (None, None, Some(lat), Some(lng)) => {
                let point = LatLng {
                    lat: finite(lat, "lat")?,
                    lng: finite(lng, "lng")?,
                };
                Ok(Some(to_percent(bounds, point)))
            }
            _ => Err(AppError::Validation(
                "position must be either {x, y} or {lat, lng}".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub icon_id: Option<Uuid>,

    pub created_by: Option<Uuid>,

    #[serde(flatten)]
    pub position: PositionInput,
}

/// Partial update; `null` clears `description` or `icon_id`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLocationRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub icon_id: Option<Option<Uuid>>,

    #[serde(flatten)]
    pub position: PositionInput,
}

/// Stored pin plus its geographic position on the map
#[derive(Debug, Clone, Serialize)]
pub struct LocationView {
    #[serde(flatten)]
    pub location: Location,
    pub lat: f64,
    pub lng: f64,
}

impl LocationView {
    pub fn new(location: Location, bounds: &MapBounds) -> Self {
        let point = to_lat_lng(
            bounds,
            MapPercent {
                x: location.x_percent,
                y: location.y_percent,
            },
        );
        Self {
            location,
            lat: round_to(point.lat, COORDINATE_PLACES),
            lng: round_to(point.lng, COORDINATE_PLACES),
        }
    }
}

pub struct LocationService {
    pool: PgPool,
}

impl LocationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_map(&self, map_id: Uuid) -> Result<(MapSettings, MapBounds)> {
        let map = map_settings_repo::find_map_by_id(&self.pool, map_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("map {}", map_id)))?;
        let bounds = map.bounds()?;
        Ok((map, bounds))
    }

    pub async fn create(&self, map_id: Uuid, req: CreateLocationRequest) -> Result<LocationView> {
        req.validate()?;
        let title = non_blank_title(&req.title)?;

        let (_, bounds) = self.load_map(map_id).await?;
        let position = req
            .position
            .resolve(&bounds)?
            .ok_or_else(|| AppError::Validation("position is required".to_string()))?;

        let values = LocationValues {
            title,
            description: clean_description(req.description),
            x_percent: position.x,
            y_percent: position.y,
            icon_id: req.icon_id,
        };

        let location =
            location_repo::create_location(&self.pool, map_id, &values, req.created_by).await?;

        tracing::info!(location_id = %location.id, %map_id, "Location created");

        Ok(LocationView::new(location, &bounds))
    }

    pub async fn get(&self, location_id: Uuid) -> Result<LocationView> {
        let location = self.find(location_id).await?;
        let (_, bounds) = self.load_map(location.map_id).await?;
        Ok(LocationView::new(location, &bounds))
    }

    pub async fn list_for_map(&self, map_id: Uuid) -> Result<Vec<LocationView>> {
        let (_, bounds) = self.load_map(map_id).await?;
        let locations = location_repo::list_locations_by_map(&self.pool, map_id).await?;

        Ok(locations
            .into_iter()
            .map(|location| LocationView::new(location, &bounds))
            .collect())
    }

    pub async fn update(&self, location_id: Uuid, req: UpdateLocationRequest) -> Result<LocationView> {
        req.validate()?;

        let current = self.find(location_id).await?;
        let (_, bounds) = self.load_map(current.map_id).await?;

        let position = req.position.resolve(&bounds)?;
        let values = LocationValues {
            title: match &req.title {
                Some(title) => non_blank_title(title)?,
                None => current.title.clone(),
            },
            description: match req.description {
                Some(description) => clean_description(description),
                None => current.description.clone(),
            },
            x_percent: position.map_or(current.x_percent, |p| p.x),
            y_percent: position.map_or(current.y_percent, |p| p.y),
            icon_id: req.icon_id.unwrap_or(current.icon_id),
        };

        let location = location_repo::update_location(&self.pool, location_id, &values)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("location {}", location_id)))?;

        tracing::info!(%location_id, "Location updated");

        Ok(LocationView::new(location, &bounds))
    }

    pub async fn delete(&self, location_id: Uuid) -> Result<()> {
        if !location_repo::delete_location(&self.pool, location_id).await? {
            return Err(AppError::NotFound(format!("location {}", location_id)));
        }
        tracing::info!(%location_id, "Location deleted");
        Ok(())
    }

    async fn find(&self, location_id: Uuid) -> Result<Location> {
        location_repo::find_location_by_id(&self.pool, location_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("location {}", location_id)))
    }
}

fn non_blank_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title must not be blank".to_string()));
    }
    Ok(title.to_string())
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
