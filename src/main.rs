//! Process bootstrap.
//!
//! Reads configuration, connects to the document store (fatal when it is
//! unreachable — no partial startup), and hands the router plus the shared
//! storage handle to the server. Everything after this point is the
//! server's lifecycle: serve until interrupted, drain, exit.

use std::sync::Arc;

use tracing::error;
use tudu::config::Config;
use tudu::storage::AppContext;
use tudu::{Server, storage, todo};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    let store = match storage::connect(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, uri = %config.mongo_uri, "cannot reach the document store");
            std::process::exit(1);
        }
    };

    let ctx = Arc::new(AppContext::new(Arc::new(store)));

    if let Err(e) = Server::bind(&config.listen_addr)
        .serve(todo::routes(), ctx)
        .await
    {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}
