// Public API - what other modules can use
pub use middleware::jwt_auth;
pub use token::TokenConfig;
pub use types::IdentityClaims;

// Internal modules
mod middleware;
mod token;
mod types;
