/// Map analysis - asks the vision model to outline areas on the map image
/// and stores them as `map_areas` rows
use crate::db::map_area_repo::{self, NewMapArea};
use crate::db::map_settings_repo;
use crate::error::{AppError, Result};
use crate::metrics::MAP_ANALYSIS_AREAS;
use crate::models::{MapArea, AREA_TYPES, DEFAULT_AREA_TYPE};
use crate::services::coordinates::{clamp_percent, PERCENT_MAX};
use llm_client::LlmProvider;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound on areas kept from one analysis
pub const MAX_AREAS: usize = 100;

const ANALYZE_MAP_PROMPT: &str = r#"You are analysing a fantasy world map for a tabletop campaign.
Identify the distinct named or visually clear areas on the map: regions, cities, towns, forests,
mountains, bodies of water, deserts, swamps, ruins, dungeons, roads and landmarks.

Respond with JSON only, no commentary, in this exact shape:
[
  {"name": "Sword Coast", "description": "short description", "area_type": "region",
   "x": 10.5, "y": 20.0, "width": 15.0, "height": 30.0}
]

x and y are the top-left corner of the area's bounding box and width and height its size, all as
percentages (0-100) of the image width and height. area_type must be one of: region, city, town,
forest, mountain, water, desert, swamp, ruin, dungeon, road, landmark."#;

#[derive(Debug, Serialize)]
pub struct AnalyzeMapResponse {
    pub map_id: Uuid,
    pub areas: Vec<MapArea>,
    pub count: usize,
}

pub struct MapAnalysisService {
    pool: PgPool,
    llm: Arc<dyn LlmProvider>,
}

impl MapAnalysisService {
    pub fn new(pool: PgPool, llm: Arc<dyn LlmProvider>) -> Self {
        Self { pool, llm }
    }

    pub async fn analyze(&self, map_id: Uuid) -> Result<AnalyzeMapResponse> {
        let map = map_settings_repo::find_map_by_id(&self.pool, map_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("map {}", map_id)))?;

        let image_url = map
            .image_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("map {} has no image to analyze", map_id)))?;

        tracing::info!(%map_id, provider = self.llm.name(), "Analyzing map image");

        let completion = self.llm.describe_image(image_url, ANALYZE_MAP_PROMPT).await?;
        let parsed = parse_areas(&completion.content)?;

        let areas = map_area_repo::replace_areas_for_map(&self.pool, map_id, &parsed).await?;
        MAP_ANALYSIS_AREAS.observe(areas.len() as f64);

        tracing::info!(%map_id, count = areas.len(), "Stored analyzed map areas");

        Ok(AnalyzeMapResponse {
            map_id,
            count: areas.len(),
            areas,
        })
    }

    pub async fn list_areas(&self, map_id: Uuid) -> Result<Vec<MapArea>> {
        if map_settings_repo::find_map_by_id(&self.pool, map_id).await?.is_none() {
            return Err(AppError::NotFound(format!("map {}", map_id)));
        }
        Ok(map_area_repo::list_areas_by_map(&self.pool, map_id).await?)
    }
}

/// Turn the model's answer into clamped areas.
///
/// Accepts a bare array or `{"areas": [...]}`, optionally wrapped in a
/// Markdown code fence or surrounded by prose.
pub fn parse_areas(raw: &str) -> Result<Vec<NewMapArea>> {
    let body = strip_code_fence(raw);

    let value = serde_json::from_str::<Value>(body)
        .ok()
        .or_else(|| extract_json(body))
        .or_else(|| extract_json(raw))
        .ok_or_else(|| AppError::Upstream("map analysis did not return JSON".to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("areas") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(AppError::Upstream(
                    "map analysis JSON has no areas list".to_string(),
                ))
            }
        },
        _ => {
            return Err(AppError::Upstream(
                "map analysis JSON has no areas list".to_string(),
            ))
        }
    };

    Ok(items
        .iter()
        .filter_map(area_from_value)
        .take(MAX_AREAS)
        .collect())
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // drop the info string (```json)
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    body.trim()
}

fn extract_json(text: &str) -> Option<Value> {
    [('[', ']'), ('{', '}')].iter().find_map(|(open, close)| {
        let start = text.find(*open)?;
        let end = text.rfind(*close)?;
        if end <= start {
            return None;
        }
        serde_json::from_str(&text[start..=end]).ok()
    })
}

fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn area_from_value(value: &Value) -> Option<NewMapArea> {
    let obj = value.as_object()?;
    let name = text(obj.get("name"))?;

    let area_type = text(obj.get("area_type").or_else(|| obj.get("type")))
        .map(|t| t.to_lowercase())
        .filter(|t| AREA_TYPES.contains(&t.as_str()))
        .unwrap_or_else(|| DEFAULT_AREA_TYPE.to_string());

    let x = clamp_percent(number(obj.get("x")).unwrap_or(0.0));
    let y = clamp_percent(number(obj.get("y")).unwrap_or(0.0));
    let width = number(obj.get("width"))
        .unwrap_or(0.0)
        .clamp(0.0, PERCENT_MAX - x);
    let height = number(obj.get("height"))
        .unwrap_or(0.0)
        .clamp(0.0, PERCENT_MAX - y);

    Some(NewMapArea {
        name,
        description: text(obj.get("description")),
        area_type,
        x_percent: x,
        y_percent: y,
        width_percent: width,
        height_percent: height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_array() {
        let raw = r#"[{"name":"Sword Coast","description":"Western shore","area_type":"region","x":5,"y":10,"width":20,"height":60}]"#;
        let areas = parse_areas(raw).unwrap();

        assert_eq!(
            areas,
            vec![NewMapArea {
                name: "Sword Coast".into(),
                description: Some("Western shore".into()),
                area_type: "region".into(),
                x_percent: 5.0,
                y_percent: 10.0,
                width_percent: 20.0,
                height_percent: 60.0,
            }]
        );
    }

    #[test]
    fn parses_fenced_object_with_areas() {
        let raw = "```json\n{\"areas\": [{\"name\": \"Neverwinter Wood\", \"type\": \"Forest\", \"x\": \"40%\", \"y\": 30, \"width\": 10, \"height\": 8}]}\n```";
        let areas = parse_areas(raw).unwrap();

        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].area_type, "forest");
        assert_eq!(areas[0].x_percent, 40.0);
        assert_eq!(areas[0].description, None);
    }

    #[test]
    fn parses_fence_on_a_single_line() {
        let raw = r#"```json [{"name":"Luskan","x":10,"y":20,"width":5,"height":5}] ```"#;
        let areas = parse_areas(raw).unwrap();

        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].name, "Luskan");
        assert_eq!(areas[0].y_percent, 20.0);

        let bare = r#"```[{"name":"Mirabar"}]```"#;
        assert_eq!(parse_areas(bare).unwrap()[0].name, "Mirabar");
    }

    #[test]
    fn parses_json_surrounded_by_prose() {
        let raw = "Here are the areas I found:\n[{\"name\": \"Icewind Dale\", \"x\": 0, \"y\": 0, \"width\": 30, \"height\": 15}]\nLet me know!";
        let areas = parse_areas(raw).unwrap();
        assert_eq!(areas[0].name, "Icewind Dale");
    }

    #[test]
    fn clamps_boxes_inside_the_image() {
        let raw = r#"[{"name":"Sea of Swords","x":-10,"y":95,"width":250,"height":40}]"#;
        let area = &parse_areas(raw).unwrap()[0];

        assert_eq!(area.x_percent, 0.0);
        assert_eq!(area.y_percent, 95.0);
        assert_eq!(area.width_percent, 100.0);
        assert_eq!(area.height_percent, 5.0);
    }

    #[test]
    fn drops_nameless_entries_and_defaults_unknown_types() {
        let raw = r#"[
            {"name": "  ", "x": 1, "y": 1},
            {"description": "no name"},
            "not an object",
            {"name": "Castle Ward", "area_type": "district", "x": 50, "y": 50, "width": 5, "height": 5}
        ]"#;
        let areas = parse_areas(raw).unwrap();

        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].name, "Castle Ward");
        assert_eq!(areas[0].area_type, DEFAULT_AREA_TYPE);
    }

    #[test]
    fn rejects_answers_without_json() {
        assert!(matches!(
            parse_areas("I cannot see any map."),
            Err(AppError::Upstream(_))
        ));
        assert!(matches!(
            parse_areas(r#"{"regions": []}"#),
            Err(AppError::Upstream(_))
        ));
    }

    #[test]
    fn empty_list_is_valid() {
        assert!(parse_areas("[]").unwrap().is_empty());
    }
}
