// Start of file: /src/utils/mod.rs

/*
    * Cross-cutting helpers: typed request errors, layer error mapping
    * and the unified response format.
*/

pub mod api_error;
pub mod error_handler;
pub mod response_handler;

// End of file: /src/utils/mod.rs
