//! Serves the tile overlap query over HTTP. A client POSTs a drawn polygon and gets back every
//! stored tile whose bounding box touches it.

#[macro_use]
extern crate log;

mod api;
mod tiles;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use structopt::StructOpt;

use tilestore::{FeatureStore, FileStore, MemoryStore};

#[derive(StructOpt)]
#[structopt(
    name = "tile_server",
    about = "Finds stored polygon tiles overlapping a drawn query tile"
)]
struct Args {
    /// The port to listen on
    #[structopt(long, env = "PORT", default_value = "8000")]
    port: u16,
    /// A GeoJSON file to persist tiles in. If unset, tiles only live in memory.
    #[structopt(long, env = "DATABASE_PATH")]
    database: Option<String>,
    /// A GeoJSON FeatureCollection loaded into the store at startup, only if the store is empty
    #[structopt(long, env = "FIXTURE_PATH", default_value = "karnataka.geojson")]
    fixture: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tileutil::logger::setup();
    let args = Args::from_args();

    let store: Arc<dyn FeatureStore> = match args.database {
        Some(ref path) => {
            info!("Storing tiles in {}", path);
            Arc::new(FileStore::new(path))
        }
        None => {
            info!("Storing tiles in memory");
            Arc::new(MemoryStore::new())
        }
    };
    // Serving an empty store is still useful, so a bad fixture isn't fatal
    if let Err(err) = tilestore::load_fixture(store.as_ref(), &args.fixture) {
        warn!("Fixture loading failed: {:#}", err);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Listening on http://{}", addr);
    let make_svc = make_service_fn(move |_conn| {
        let store = store.clone();
        async move {
            Ok::<_, hyper::Error>(service_fn(move |req| api::serve_req(store.clone(), req)))
        }
    });
    Server::bind(&addr)
        .serve(make_svc)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Can't listen for ctrl-c: {}", err);
        // Never resolve, so the server keeps running
        std::future::pending::<()>().await;
    }
}
