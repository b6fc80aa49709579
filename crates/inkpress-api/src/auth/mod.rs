//! Authentication: JWT issuance/verification, the per-request identity
//! middleware, and the extracted user context.

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::JwtService;
pub use models::UserContext;
