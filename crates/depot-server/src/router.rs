use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use depot_protocol::endpoints;

use crate::handler::{self, gpg, module, provider};
use crate::state::AppState;

/// Build the axum router with all registry endpoints. Route groups disabled
/// in the configuration are left out entirely.
pub fn build_router(state: AppState) -> Router {
    let config = state.config();
    let mut router = Router::new()
        .route(endpoints::DISCOVERY, get(handler::discovery_handler))
        .route(endpoints::HEALTH, get(handler::health_handler));

    if config.enable_modules {
        router = router.merge(module_routes());
    }
    if config.enable_providers {
        router = router.merge(provider_routes());
    }

    let body_limit = config.max_upload_size;
    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn module_routes() -> Router<AppState> {
    Router::new()
        .route(endpoints::MODULE_CREATE, post(module::create_module))
        .route(
            endpoints::MODULE_VERSIONS,
            get(module::list_versions).post(module::create_version),
        )
        .route(endpoints::MODULE_DOWNLOAD, get(module::download))
        .route(
            endpoints::MODULE_PACKAGE,
            put(module::upload_package).get(module::download_package),
        )
}

fn provider_routes() -> Router<AppState> {
    Router::new()
        .route(endpoints::PROVIDERS, post(provider::create_provider))
        .route(
            endpoints::PROVIDER_VERSIONS,
            get(provider::list_versions).post(provider::create_version),
        )
        .route(endpoints::PROVIDER_DOWNLOAD, get(provider::find_package))
        .route(endpoints::PROVIDER_PLATFORMS, post(provider::create_platform))
        .route(
            endpoints::PROVIDER_SHASUMS,
            put(provider::upload_shasums).get(provider::download_shasums),
        )
        .route(
            endpoints::PROVIDER_SHASUMS_SIG,
            put(provider::upload_shasums_sig).get(provider::download_shasums_sig),
        )
        .route(
            endpoints::PROVIDER_BINARY,
            put(provider::upload_binary).get(provider::download_binary),
        )
        .route(endpoints::GPG_KEYS, post(gpg::add_key))
        .route(endpoints::GPG_KEY, get(gpg::get_key))
}
