//! HTTP middleware stack for the site.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (binary only, capture errors and transactions)
//! 2. Security headers (CSP, frame options, etc.)
//! 3. Request ID (add unique ID to each request)
//! 4. `TraceLayer` (request tracing)
//! 5. Session layer (tower-sessions with in-memory store)
//!
//! `POST /login` additionally carries a per-IP rate limiter (governor).

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{GateDecision, OptionalAuth, RequireAuth, gate};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
