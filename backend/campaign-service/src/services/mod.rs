/// Business logic for campaign-service
///
/// - `coordinates`: lat/lng <-> map percentage transform
/// - `retrieval`: vector search with keyword fallback over wiki content
/// - `chat`: retrieval-augmented lore assistant
/// - `map_analysis`: image understanding of the map into stored areas
pub mod chat;
pub mod coordinates;
pub mod invitations;
pub mod locations;
pub mod map_analysis;
pub mod maps;
pub mod retrieval;
pub mod wiki;

pub use chat::{ChatRequest, ChatResponse, ChatService, SourceRef};
pub use invitations::InvitationService;
pub use locations::{LocationService, LocationView};
pub use map_analysis::{AnalyzeMapResponse, MapAnalysisService};
pub use maps::MapService;
pub use retrieval::{DocumentSearch, PgDocumentSearch, Retrieval, RetrievalMode, Retriever};
pub use wiki::WikiService;
