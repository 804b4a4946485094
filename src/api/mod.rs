// Start of file: /src/api/mod.rs

/*
    * HTTP surface: one folder per feature with its handlers and route
    * registrations, plus the interceptors shared by protected routes.
*/

pub mod auth;
pub mod friends;
pub mod health;
pub mod middleware;
pub mod profile;
pub mod rides;

// End of file: /src/api/mod.rs
