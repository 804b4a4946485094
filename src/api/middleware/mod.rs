// Request interceptors run before handlers

pub mod auth;
