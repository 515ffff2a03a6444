/// Campaign Service Library
///
/// Backend for a tabletop campaign companion: the world map and its pins,
/// image analysis of the map, a lore assistant grounded in scraped wiki
/// content, and player invitations.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `services`: Business logic (coordinates, retrieval, chat, map analysis)
/// - `db`: Repositories over PostgreSQL + pgvector
/// - `models`: Row and enum types
/// - `error`: Error types and HTTP error rendering
/// - `config`: Environment configuration
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use actix_web::web;
use llm_client::LlmProvider;
use services::{
    ChatService, DocumentSearch, InvitationService, MapAnalysisService, PgDocumentSearch,
    Retriever, WikiService,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Largest accepted JSON body (wiki pages can be long)
pub const JSON_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Retrieval tuning shared by chat and wiki search
#[derive(Debug, Clone, Copy)]
pub struct RetrievalSettings {
    pub match_threshold: f64,
    pub match_count: i64,
    pub max_context_chars_per_doc: usize,
}

impl From<&Config> for RetrievalSettings {
    fn from(config: &Config) -> Self {
        Self {
            match_threshold: config.match_threshold,
            match_count: config.match_count,
            max_context_chars_per_doc: config.max_context_chars_per_doc,
        }
    }
}

/// Shared application data registered on every worker
#[derive(Clone)]
pub struct AppState {
    pub pool: web::Data<PgPool>,
    pub chat: web::Data<ChatService>,
    pub wiki: web::Data<WikiService>,
    pub map_analysis: web::Data<MapAnalysisService>,
    pub invitations: web::Data<InvitationService>,
}

impl AppState {
    pub fn new(pool: PgPool, llm: Arc<dyn LlmProvider>, config: &Config) -> Self {
        let search: Arc<dyn DocumentSearch> = Arc::new(PgDocumentSearch::new(pool.clone()));
        Self::with_search(
            pool,
            llm,
            search,
            RetrievalSettings::from(config),
            config.invitation_ttl_hours,
        )
    }

    /// Build the state with an explicit document search backend
    pub fn with_search(
        pool: PgPool,
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn DocumentSearch>,
        retrieval: RetrievalSettings,
        invitation_ttl_hours: i64,
    ) -> Self {
        let retriever = Arc::new(Retriever::new(
            search,
            llm.clone(),
            retrieval.match_threshold,
            retrieval.match_count,
        ));

        Self {
            chat: web::Data::new(ChatService::new(
                retriever.clone(),
                llm.clone(),
                retrieval.max_context_chars_per_doc,
            )),
            wiki: web::Data::new(WikiService::new(pool.clone(), llm.clone(), retriever)),
            map_analysis: web::Data::new(MapAnalysisService::new(pool.clone(), llm)),
            invitations: web::Data::new(InvitationService::new(pool.clone(), invitation_ttl_hours)),
            pool: web::Data::new(pool),
        }
    }

    /// Register app data, extractor error handlers and every route
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.pool.clone())
            .app_data(self.chat.clone())
            .app_data(self.wiki.clone())
            .app_data(self.map_analysis.clone())
            .app_data(self.invitations.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(JSON_BODY_LIMIT)
                    .error_handler(error::json_error_handler),
            )
            .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
            .app_data(web::PathConfig::default().error_handler(error::path_error_handler));

        configure_routes(cfg);
    }
}

/// Route table for the HTTP surface
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics::serve_metrics))
        .service(
            web::scope("/api/v1")
                .route("/health", web::get().to(handlers::health))
                .service(
                    web::scope("/maps")
                        .service(
                            web::resource("")
                                .route(web::get().to(handlers::list_maps))
                                .route(web::post().to(handlers::create_map)),
                        )
                        .service(
                            web::resource("/{map_id}")
                                .route(web::get().to(handlers::get_map))
                                .route(web::patch().to(handlers::update_map))
                                .route(web::delete().to(handlers::delete_map)),
                        )
                        .service(
                            web::resource("/{map_id}/analyze")
                                .route(web::post().to(handlers::analyze_map)),
                        )
                        .service(
                            web::resource("/{map_id}/areas")
                                .route(web::get().to(handlers::list_map_areas)),
                        )
                        .service(
                            web::resource("/{map_id}/locations")
                                .route(web::get().to(handlers::list_locations))
                                .route(web::post().to(handlers::create_location)),
                        ),
                )
                .service(
                    web::resource("/locations/{location_id}")
                        .route(web::get().to(handlers::get_location))
                        .route(web::patch().to(handlers::update_location))
                        .route(web::delete().to(handlers::delete_location)),
                )
                .route(
                    "/coordinates/convert",
                    web::post().to(handlers::convert_coordinates),
                )
                .service(
                    web::scope("/icons")
                        .service(
                            web::resource("")
                                .route(web::get().to(handlers::list_icons))
                                .route(web::post().to(handlers::create_icon)),
                        )
                        .service(
                            web::resource("/{icon_id}").route(web::delete().to(handlers::delete_icon)),
                        ),
                )
                .service(
                    web::scope("/wiki")
                        .service(
                            web::resource("/documents")
                                .route(web::get().to(handlers::list_documents))
                                .route(web::post().to(handlers::ingest_document)),
                        )
                        .service(
                            web::resource("/documents/{document_id}")
                                .route(web::get().to(handlers::get_document))
                                .route(web::delete().to(handlers::delete_document)),
                        )
                        .route("/search", web::get().to(handlers::search_documents))
                        .route(
                            "/embeddings/backfill",
                            web::post().to(handlers::backfill_embeddings),
                        ),
                )
                .route("/chat", web::post().to(handlers::chat))
                .route("/analyze-map", web::post().to(handlers::analyze_map_by_body))
                .service(
                    web::scope("/invitations")
                        .service(
                            web::resource("")
                                .route(web::get().to(handlers::list_invitations))
                                .route(web::post().to(handlers::create_invitation)),
                        )
                        .route("/accept", web::post().to(handlers::accept_invitation))
                        .route(
                            "/{invitation_id}/revoke",
                            web::post().to(handlers::revoke_invitation),
                        ),
                )
                .service(
                    web::scope("/roles")
                        .route("", web::get().to(handlers::list_roles))
                        .service(
                            web::resource("/{user_id}")
                                .route(web::get().to(handlers::get_role))
                                .route(web::put().to(handlers::set_role)),
                        ),
                ),
        );
}
