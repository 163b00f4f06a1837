//! Resource routes mounted under `/api/v1`. Every path answers unknown verbs with a 405 error document.

use crate::handlers::fallback::method_not_allowed;
use crate::handlers::{contacts, phone_numbers};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/contacts",
            get(contacts::list).post(contacts::create).fallback(method_not_allowed),
        )
        .route(
            "/contacts/:id",
            get(contacts::read)
                .patch(contacts::update)
                .put(contacts::update)
                .delete(contacts::delete)
                .fallback(method_not_allowed),
        )
        .route(
            "/contacts/:id/phone_numbers",
            get(contacts::related_phone_numbers).fallback(method_not_allowed),
        )
        .route(
            "/contacts/:id/relationships/phone_numbers",
            get(contacts::phone_numbers_relationship).fallback(method_not_allowed),
        )
        .route(
            "/phone_numbers",
            post(phone_numbers::create)
                .get(phone_numbers::list)
                .fallback(method_not_allowed),
        )
        .route(
            "/phone_numbers/:id",
            get(phone_numbers::read)
                .patch(phone_numbers::update)
                .put(phone_numbers::update)
                .delete(phone_numbers::delete)
                .fallback(method_not_allowed),
        )
        .route(
            "/phone_numbers/:id/contact",
            get(phone_numbers::related_contact).fallback(method_not_allowed),
        )
        .route(
            "/phone_numbers/:id/relationships/contact",
            get(phone_numbers::contact_relationship)
                .patch(phone_numbers::replace_contact)
                .fallback(method_not_allowed),
        )
}
