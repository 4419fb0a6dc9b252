//! # albumdb-http
//!
//! JSON-over-HTTP front end for the albumdb record store.
//!
//! ## Example
//!
//! ```rust,ignore
//! use albumdb::Store;
//! use albumdb_http::{AlbumService, HttpServer};
//!
//! #[tokio::main]
//! async fn main() -> albumdb_http::Result<()> {
//!     let store = Store::open("./data/albums")?;
//!     HttpServer::bind("127.0.0.1:8080", AlbumService::new(store))
//!         .await?
//!         .serve()
//!         .await
//! }
//! ```

mod error;
mod request;
mod response;
pub mod routes;
mod server;
pub mod telemetry;

pub use error::{HttpError, Result};
pub use request::Request;
pub use response::Response;
pub use routes::AlbumService;
pub use server::HttpServer;
pub use telemetry::{init_tracing, TracingConfig};

// Re-export http types
pub use http::{Method, StatusCode};
