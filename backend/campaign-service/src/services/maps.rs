/// Map settings service - CRUD with bounds/zoom validation and coordinate conversion
use crate::db::map_settings_repo::{self, MapSettingsValues};
use crate::error::{AppError, Result};
use crate::models::MapSettings;
use crate::services::coordinates::{round_to, to_lat_lng, MapBounds, PERCENT_MAX, PERCENT_MIN};
use crate::services::locations::{PositionInput, COORDINATE_PLACES};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_ZOOM: i32 = 0;
pub const DEFAULT_MIN_ZOOM: i32 = -2;
pub const DEFAULT_MAX_ZOOM: i32 = 4;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMapRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(url)]
    pub image_url: Option<String>,

    pub bounds_north: Option<f64>,
    pub bounds_south: Option<f64>,
    pub bounds_east: Option<f64>,
    pub bounds_west: Option<f64>,

    pub default_zoom: Option<i32>,
    pub min_zoom: Option<i32>,
    pub max_zoom: Option<i32>,
}

/// Partial update; `image_url: null` removes the image
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMapRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub image_url: Option<Option<String>>,

    pub bounds_north: Option<f64>,
    pub bounds_south: Option<f64>,
    pub bounds_east: Option<f64>,
    pub bounds_west: Option<f64>,

    pub default_zoom: Option<i32>,
    pub min_zoom: Option<i32>,
    pub max_zoom: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConvertRequest {
    pub map_id: Uuid,

    #[serde(flatten)]
    pub position: PositionInput,
}

/// Both coordinate forms of one point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertResponse {
    pub map_id: Uuid,
    pub x: f64,
    pub y: f64,
    pub lat: f64,
    pub lng: f64,
}

impl CreateMapRequest {
    fn into_values(self) -> MapSettingsValues {
        MapSettingsValues {
            name: self.name.trim().to_string(),
            image_url: clean_url(self.image_url),
            bounds_north: self.bounds_north.unwrap_or(PERCENT_MAX),
            bounds_south: self.bounds_south.unwrap_or(PERCENT_MIN),
            bounds_east: self.bounds_east.unwrap_or(PERCENT_MAX),
            bounds_west: self.bounds_west.unwrap_or(PERCENT_MIN),
            default_zoom: self.default_zoom.unwrap_or(DEFAULT_ZOOM),
            min_zoom: self.min_zoom.unwrap_or(DEFAULT_MIN_ZOOM),
            max_zoom: self.max_zoom.unwrap_or(DEFAULT_MAX_ZOOM),
        }
    }
}

impl UpdateMapRequest {
    /// Overlay the patch on the stored values
    fn apply(self, current: &MapSettings) -> MapSettingsValues {
        MapSettingsValues {
            name: self
                .name
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| current.name.clone()),
            image_url: match self.image_url {
                Some(url) => clean_url(url),
                None => current.image_url.clone(),
            },
            bounds_north: self.bounds_north.unwrap_or(current.bounds_north),
            bounds_south: self.bounds_south.unwrap_or(current.bounds_south),
            bounds_east: self.bounds_east.unwrap_or(current.bounds_east),
            bounds_west: self.bounds_west.unwrap_or(current.bounds_west),
            default_zoom: self.default_zoom.unwrap_or(current.default_zoom),
            min_zoom: self.min_zoom.unwrap_or(current.min_zoom),
            max_zoom: self.max_zoom.unwrap_or(current.max_zoom),
        }
    }
}

fn clean_url(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}

/// Bounds must form a valid frame and zooms must be ordered
pub fn validate_values(values: &MapSettingsValues) -> Result<()> {
    if values.name.is_empty() {
        return Err(AppError::Validation("name must not be blank".to_string()));
    }

    MapBounds::new(
        values.bounds_north,
        values.bounds_south,
        values.bounds_east,
        values.bounds_west,
    )?;

    if !(values.min_zoom <= values.default_zoom && values.default_zoom <= values.max_zoom) {
        return Err(AppError::Validation(format!(
            "zoom levels must satisfy min_zoom ({}) <= default_zoom ({}) <= max_zoom ({})",
            values.min_zoom, values.default_zoom, values.max_zoom
        )));
    }

    Ok(())
}

pub struct MapService {
    pool: PgPool,
}

impl MapService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<MapSettings>> {
        Ok(map_settings_repo::list_maps(&self.pool).await?)
    }

    pub async fn get(&self, map_id: Uuid) -> Result<MapSettings> {
        map_settings_repo::find_map_by_id(&self.pool, map_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("map {}", map_id)))
    }

    pub async fn create(&self, req: CreateMapRequest) -> Result<MapSettings> {
        req.validate()?;
        let values = req.into_values();
        validate_values(&values)?;

        let map = map_settings_repo::create_map(&self.pool, &values).await?;
        tracing::info!(map_id = %map.id, name = %map.name, "Map created");

        Ok(map)
    }

    pub async fn update(&self, map_id: Uuid, req: UpdateMapRequest) -> Result<MapSettings> {
        req.validate()?;
        if let Some(Some(url)) = &req.image_url {
            if !validator::ValidateUrl::validate_url(url) {
                return Err(AppError::Validation("image_url must be a valid URL".to_string()));
            }
        }

        let current = self.get(map_id).await?;
        let values = req.apply(&current);
        validate_values(&values)?;

        let map = map_settings_repo::update_map(&self.pool, map_id, &values)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("map {}", map_id)))?;

        tracing::info!(%map_id, "Map updated");

        Ok(map)
    }

    pub async fn delete(&self, map_id: Uuid) -> Result<()> {
        if !map_settings_repo::delete_map(&self.pool, map_id).await? {
            return Err(AppError::NotFound(format!("map {}", map_id)));
        }
        tracing::info!(%map_id, "Map deleted");
        Ok(())
    }

    pub async fn convert(&self, req: ConvertRequest) -> Result<ConvertResponse> {
        let map = self.get(req.map_id).await?;
        convert_position(&map, &req.position)
    }
}

/// Express a position in both percent and geographic form
pub fn convert_position(map: &MapSettings, position: &PositionInput) -> Result<ConvertResponse> {
    let bounds = map.bounds()?;
    let percent = position
        .resolve(&bounds)?
        .ok_or_else(|| AppError::Validation("either {x, y} or {lat, lng} is required".to_string()))?;
    let point = to_lat_lng(&bounds, percent);

    Ok(ConvertResponse {
        map_id: map.id,
        x: round_to(percent.x, COORDINATE_PLACES),
        y: round_to(percent.y, COORDINATE_PLACES),
        lat: round_to(point.lat, COORDINATE_PLACES),
        lng: round_to(point.lng, COORDINATE_PLACES),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stored_map() -> MapSettings {
        let now = Utc::now();
        MapSettings {
            id: Uuid::new_v4(),
            name: "Faerun".into(),
            image_url: Some("https://cdn.example.com/faerun.jpg".into()),
            bounds_north: 60.0,
            bounds_south: 20.0,
            bounds_east: 30.0,
            bounds_west: -10.0,
            default_zoom: 1,
            min_zoom: -1,
            max_zoom: 3,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn create_defaults_to_image_frame() {
        let req: CreateMapRequest = serde_json::from_str(r#"{"name": " World "}"#).unwrap();
        let values = req.into_values();

        assert_eq!(values.name, "World");
        assert_eq!(
            (values.bounds_north, values.bounds_south, values.bounds_east, values.bounds_west),
            (100.0, 0.0, 100.0, 0.0)
        );
        assert_eq!((values.default_zoom, values.min_zoom, values.max_zoom), (0, -2, 4));
        assert!(validate_values(&values).is_ok());
    }

    #[test]
    fn partial_update_revalidates_bounds_as_a_whole() {
        let current = stored_map();

        // south above the stored north
        let patch = UpdateMapRequest {
            bounds_south: Some(70.0),
            ..Default::default()
        };
        let values = patch.apply(&current);
        assert!(matches!(validate_values(&values), Err(AppError::BadRequest(_))));

        let patch = UpdateMapRequest {
            bounds_south: Some(70.0),
            bounds_north: Some(80.0),
            image_url: Some(None),
            ..Default::default()
        };
        let values = patch.apply(&current);
        assert!(validate_values(&values).is_ok());
        assert_eq!(values.image_url, None);
        assert_eq!(values.name, "Faerun");
    }

    #[test]
    fn zoom_order_is_enforced() {
        let patch = UpdateMapRequest {
            default_zoom: Some(5),
            ..Default::default()
        };
        let values = patch.apply(&stored_map());
        assert!(matches!(validate_values(&values), Err(AppError::Validation(_))));
    }

    #[test]
    fn convert_reports_both_forms() {
        let map = stored_map();
        let position = PositionInput {
            lat: Some(30.0),
            lng: Some(0.0),
            ..Default::default()
        };

        let converted = convert_position(&map, &position).unwrap();
        assert_eq!(converted.x, 25.0);
        assert_eq!(converted.y, 75.0);
        assert_eq!(converted.lat, 30.0);
        assert_eq!(converted.lng, 0.0);

        assert!(convert_position(&map, &PositionInput::default()).is_err());
    }
}
