//! HTTP surface: the `/agent` endpoint and the liveness probe.

mod routes;

pub use self::routes::{app_router, AgentRequest, AppState};
pub use self::routes::{KEY_ID_HEADER, SIGNATURE_HEADER, TOKEN_HEADER};
