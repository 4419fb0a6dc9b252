//! Album routes.
//!
//! | Method | Path      | Body                 | Response                      |
//! |--------|-----------|----------------------|-------------------------------|
//! | GET    | `/ping`   |                      | `{"message":"pong"}`          |
//! | GET    | `/albums` |                      | `[Record]`                    |
//! | POST   | `/albums` | `[Record]`           | 201 `[Record]` with ids       |
//! | DELETE | `/albums` | `[id]`               | `{"keysDeleted":[id]}`        |
//! | PATCH  | `/albums` | `[PartialRecord]`    | `[Record]` after the merge    |

use crate::{HttpError, Request, Response, Result};
use albumdb::{PartialRecord, Record, Store};
use http::Method;
use serde::Serialize;

pub const PING_PATH: &str = "/ping";
pub const ALBUMS_PATH: &str = "/albums";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteResponse {
    keys_deleted: Vec<String>,
}

/// Request handler bound to one store.
#[derive(Debug, Clone)]
pub struct AlbumService {
    store: Store,
}

impl AlbumService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Dispatch a request to its route.
    pub async fn handle(&self, req: Request) -> Response {
        let result = match (req.method(), req.path()) {
            (&Method::GET, PING_PATH) => {
                Ok(Response::ok().json(&serde_json::json!({ "message": "pong" })))
            }
            (&Method::GET, ALBUMS_PATH) => self.list().await,
            (&Method::POST, ALBUMS_PATH) => self.create(&req).await,
            (&Method::DELETE, ALBUMS_PATH) => self.remove(&req).await,
            (&Method::PATCH, ALBUMS_PATH) => self.patch(&req).await,
            (method, path @ (PING_PATH | ALBUMS_PATH)) => {
                return Response::method_not_allowed().json(&serde_json::json!({
                    "error": "method not allowed",
                    "method": method.as_str(),
                    "path": path
                }));
            }
            (_, path) => {
                return Response::not_found().json(&serde_json::json!({
                    "error": "not found",
                    "path": path
                }));
            }
        };

        result.unwrap_or_else(|e| error_response(&req, e))
    }

    async fn list(&self) -> Result<Response> {
        let records = self.blocking(|store| store.get()).await?;
        Ok(Response::ok().json(&records))
    }

    async fn create(&self, req: &Request) -> Result<Response> {
        let records: Vec<Record> = req.json()?;
        let added = self.blocking(move |store| store.add(records)).await?;
        Ok(Response::created().json(&added))
    }

    async fn remove(&self, req: &Request) -> Result<Response> {
        let keys: Vec<String> = req.json()?;
        let keys_deleted = self.blocking(move |store| store.delete(keys)).await?;
        Ok(Response::ok().json(&DeleteResponse { keys_deleted }))
    }

    async fn patch(&self, req: &Request) -> Result<Response> {
        let partials: Vec<PartialRecord> = req.json()?;
        if let Some(missing) = partials.iter().position(|p| p.id.is_empty()) {
            return Err(HttpError::BadRequest(format!("item {missing} has no id")));
        }
        let updated = self.blocking(move |store| store.update(partials)).await?;
        Ok(Response::ok().json(&updated))
    }

    /// Run a store call on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(Store) -> albumdb::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(store))
            .await
            .map_err(|e| HttpError::Internal(e.to_string()))?
            .map_err(HttpError::from)
    }
}

fn error_response(req: &Request, err: HttpError) -> Response {
    let status = err.status_code();

    let remote = req.remote_addr().map(|addr| addr.to_string()).unwrap_or_default();

    if err.is_client_error() {
        tracing::debug!(method = %req.method(), path = req.path(), %remote, error = %err, "rejected request");
        Response::error(status, &err.to_string())
    } else {
        tracing::error!(method = %req.method(), path = req.path(), %remote, error = %err, "request failed");
        Response::internal_error().json(&serde_json::json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use tempfile::tempdir;

    fn request(method: Method, uri: &str, body: &str) -> Request {
        Request::new(method, uri.parse().unwrap(), Bytes::from(body.to_string()))
    }

    fn body_json(resp: &Response) -> serde_json::Value {
        serde_json::from_slice(resp.body_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let dir = tempdir().unwrap();
        let service = AlbumService::new(Store::open(dir.path().join("albums")).unwrap());

        let resp = service.handle(request(Method::GET, "/ping", "")).await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        assert_eq!(body_json(&resp)["message"], "pong");
    }

    #[tokio::test]
    async fn test_unknown_routes() {
        let dir = tempdir().unwrap();
        let service = AlbumService::new(Store::open(dir.path().join("albums")).unwrap());

        let resp = service.handle(request(Method::PUT, "/albums", "[]")).await;
        assert_eq!(resp.status_code(), StatusCode::METHOD_NOT_ALLOWED);

        let resp = service.handle(request(Method::GET, "/nope", "")).await;
        assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_patch_requires_id() {
        let dir = tempdir().unwrap();
        let service = AlbumService::new(Store::open(dir.path().join("albums")).unwrap());

        let resp = service
            .handle(request(Method::PATCH, "/albums", r#"[{"title":"x"}]"#))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);

        let resp = service
            .handle(request(Method::PATCH, "/albums", r#"[{"id":"","title":"x"}]"#))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_failure_is_opaque_500() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("albums");
        let service = AlbumService::new(Store::open(&path).unwrap());
        std::fs::write(&path, "a1;Song;Band;ten\n").unwrap();

        let resp = service.handle(request(Method::GET, "/albums", "")).await;
        assert_eq!(resp.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&resp), serde_json::json!({}));
    }
}
