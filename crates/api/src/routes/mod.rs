pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// POST /replicate            create a prediction, or poll one when the
///                            body carries `predictionId`
/// POST /replicate-cancel     cancel a prediction
/// POST /cloudinary-delete    delete a stored image
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/replicate", post(handlers::replicate::create_or_poll))
        .route("/replicate-cancel", post(handlers::replicate::cancel))
        .route("/cloudinary-delete", post(handlers::cloudinary::delete_image))
}
