//! HTTP inbound adapter exposing the roster REST API.

pub mod caller;
pub mod class_sessions;
pub mod clusters;
pub mod deletion;
pub mod error;
pub mod health;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every roster endpoint. Mount inside the `/api/v1` scope.
///
/// `/users/me` is registered ahead of `/users/{id}` so the literal segment
/// wins.
///
/// ```
/// use actix_web::{App, web};
/// use roster::inbound::http::configure_api;
///
/// let _app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(error::extractor_config)
        .service(users::create_user)
        .service(users::list_users)
        .service(users::current_user)
        .service(users::get_user)
        .service(users::remove_user)
        .service(users::user_sessions)
        .service(clusters::list_clusters)
        .service(clusters::create_cluster)
        .service(clusters::get_cluster)
        .service(clusters::update_cluster)
        .service(clusters::delete_cluster)
        .service(clusters::add_cluster_student)
        .service(clusters::remove_cluster_student)
        .service(clusters::cluster_sessions)
        .service(class_sessions::list_sessions)
        .service(class_sessions::create_session)
        .service(class_sessions::update_session)
        .service(class_sessions::delete_session);
}
