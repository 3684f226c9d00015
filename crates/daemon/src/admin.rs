//! Shared-secret admin access.
//!
//! A correct password is exchanged for the admin token; write routes require
//! that token in the `x-admin-token` header. The token does not expire.

use uuid::Uuid;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Clone)]
pub struct AdminAuth {
    password: String,
    token: String,
}

impl AdminAuth {
    /// Use `token` if given, otherwise generate one for this process.
    pub fn new(password: impl Into<String>, token: Option<String>) -> Self {
        let token = token
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        Self {
            password: password.into(),
            token,
        }
    }

    /// The admin token, if `password` is correct.
    pub fn login(&self, password: &str) -> Option<&str> {
        (password == self.password).then_some(self.token.as_str())
    }

    pub fn authorize(&self, token: Option<&str>) -> bool {
        token == Some(self.token.as_str())
    }
}

// keep secrets out of logs
impl std::fmt::Debug for AdminAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuth").finish_non_exhaustive()
    }
}
