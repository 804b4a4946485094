// Start of file: /src/auth/mod.rs

/*
    * Authentication collaborators: the request Identity, JWT issuing and
    * validation, and the Google OAuth provider.
*/

pub mod identity;
pub mod jwt;
pub mod oauth;

pub use identity::{AuthError, Identity};
pub use jwt::{IssuedToken, JwtService, TokenValidator};
pub use oauth::{GoogleOAuth, OAuthProvider, OAuthStateStore};

// End of file: /src/auth/mod.rs
