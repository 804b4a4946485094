// Start of file: /src/core/mod.rs

/*
    * Server plumbing: the route table, CORS policy, tracing setup and
    * the listener/shutdown lifecycle.
*/

pub mod cors;
pub mod logging;
pub mod router;
pub mod server;

// End of file: /src/core/mod.rs
