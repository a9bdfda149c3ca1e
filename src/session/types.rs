use serde::{Deserialize, Serialize};

/// JWT claims identifying an authenticated player
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityClaims {
    /// Stable external identity
    pub mobile_number: String,
    pub username: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

impl IdentityClaims {
    /// Name to show in a room: the requested one if given, else the account
    /// username, else a generated pet name
    pub fn display_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or_else(|| Some(self.username.trim()).filter(|name| !name.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| petname::Petnames::default().generate_one(2, "-"))
    }
}
