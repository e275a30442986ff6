// Debit notes: record model, context building, batch generation and the HTTP handlers.
// Everything below `handlers` is synchronous and free of I/O except the renderer call.

pub mod batch;
pub mod context;
pub mod currency;
pub mod filename;
pub mod handlers;
pub mod models;
