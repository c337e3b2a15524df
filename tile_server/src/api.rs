use std::sync::Arc;

use anyhow::Result;
use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use hyper::body::HttpBody;
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use geom::{GeomError, PolygonFeature};
use tilestore::{FeatureStore, StoreUnavailable};

use crate::tiles::get_intersecting_tiles;

pub const TILE_ROUTE: &str = "/api/v1/tile";
const SKIPPED_HEADER: &str = "x-skipped-candidates";
/// Query tiles are single polygons; anything bigger than this isn't one.
const MAX_BODY_BYTES: usize = 1 << 20;

#[derive(Deserialize)]
struct TileRequest {
    data: geojson::Feature,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TileResponse {
    Success { data: Vec<geojson::Feature> },
    Error { message: String },
}

pub struct Reply {
    pub status: StatusCode,
    pub body: TileResponse,
    /// Stored tiles left out because their geometry was unusable
    pub skipped: usize,
}

impl Reply {
    fn error(status: StatusCode, message: String) -> Reply {
        Reply {
            status,
            body: TileResponse::Error { message },
            skipped: 0,
        }
    }

    fn into_response(self) -> Response<Body> {
        let (status, body) = match serde_json::to_string(&self.body) {
            Ok(body) => (self.status, body),
            Err(err) => {
                error!("Couldn't serialize response: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, String::new())
            }
        };
        let mut resp = Response::new(Body::from(body));
        *resp.status_mut() = status;
        resp.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if self.skipped > 0 {
            resp.headers_mut().insert(
                HeaderName::from_static(SKIPPED_HEADER),
                HeaderValue::from(self.skipped),
            );
        }
        resp
    }
}

pub async fn serve_req(
    store: Arc<dyn FeatureStore>,
    req: Request<Body>,
) -> Result<Response<Body>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    info!("Handling {} {}", method, path);

    let mut resp = match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => {
            let mut resp = Response::new(Body::empty());
            *resp.status_mut() = StatusCode::NO_CONTENT;
            resp
        }
        (&Method::POST, TILE_ROUTE) => {
            match read_body(req.into_body()).await? {
                Some(body) => {
                    // Store access is blocking
                    match tokio::task::spawn_blocking(move || {
                        handle_tile_request(store.as_ref(), &body)
                    })
                    .await
                    {
                        Ok(reply) => reply.into_response(),
                        Err(err) => Reply::error(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            format!("Query task failed: {}", err),
                        )
                        .into_response(),
                    }
                }
                None => {
                    warn!("Rejecting a request body over {} bytes", MAX_BODY_BYTES);
                    Reply::error(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        format!("Request body is over {} bytes", MAX_BODY_BYTES),
                    )
                    .into_response()
                }
            }
        }
        _ => Reply::error(
            StatusCode::NOT_FOUND,
            format!("No route for {} {}", method, path),
        )
        .into_response(),
    };
    allow_cors(resp.headers_mut());
    Ok(resp)
}

/// Collects the body, giving up with `None` once it passes `MAX_BODY_BYTES`.
async fn read_body(mut body: Body) -> Result<Option<Vec<u8>>, hyper::Error> {
    if body.size_hint().lower() > MAX_BODY_BYTES as u64 {
        return Ok(None);
    }
    let mut bytes = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk?;
        if bytes.len() + chunk.len() > MAX_BODY_BYTES {
            return Ok(None);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(Some(bytes))
}

fn allow_cors(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Origin, X-Requested-With, Content-Type, Accept"),
    );
}

/// Parses `{ "data": <Feature> }`, runs the query, and decides on a status code.
pub fn handle_tile_request(store: &dyn FeatureStore, body: &[u8]) -> Reply {
    match find_tiles(store, body) {
        Ok((data, skipped)) => Reply {
            status: StatusCode::OK,
            body: TileResponse::Success { data },
            skipped,
        },
        Err(err) => {
            let status = status_for(&err);
            error!("{} failed ({}): {:#}", TILE_ROUTE, status, err);
            Reply::error(status, format!("{:#}", err))
        }
    }
}

fn find_tiles(store: &dyn FeatureStore, body: &[u8]) -> Result<(Vec<geojson::Feature>, usize)> {
    let req: TileRequest = serde_json::from_slice(body)?;
    let input = PolygonFeature::from_geojson(&req.data)?;
    debug!("Received query tile {:?}", input);

    let query = get_intersecting_tiles(store, &input)?;
    let data = query
        .tiles
        .iter()
        .map(|(id, tile)| tile.to_geojson(Some(*id)))
        .collect();
    Ok((data, query.skipped))
}

fn status_for(err: &anyhow::Error) -> StatusCode {
    if err.downcast_ref::<serde_json::Error>().is_some()
        || err.downcast_ref::<GeomError>().is_some()
    {
        StatusCode::BAD_REQUEST
    } else if err.downcast_ref::<StoreUnavailable>().is_some() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
