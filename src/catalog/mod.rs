//! Song catalog: data model and the HTTP contract of the catalog service.

pub mod api;
pub mod models;

pub use api::CatalogClient;
pub use models::{QueryKey, Song, SongId, SongPage};
