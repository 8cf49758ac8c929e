// HealthMonitor-api lib.rs
//
// Library side of the HealthMonitor API: routing, handlers, wire types and
// the OpenAPI document. The server binary lives in src/bin/main.rs.

// Public modules
pub mod api;
pub mod entities;
pub mod openapi;
