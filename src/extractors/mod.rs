//! Request extractors that reject with JSON:API error documents instead of axum's plain-text bodies.

mod body;
mod query;

pub use body::JsonBody;
