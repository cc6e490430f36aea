//! OpenAPI documentation.
//!
//! Served at /api/openapi.json with the RapiDoc UI mounted at /docs.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Licentra API",
        version = "0.1.0",
        description = "License and subscription management API. Admins manage customers and subscription packs; customers sign up and manage their subscription; SDK clients authenticate with an API key."
    ),
    paths(
        // Auth
        handlers::admin_auth::admin_login,
        handlers::customer_auth::customer_login,
        handlers::customer_auth::customer_signup,
        handlers::sdk_auth::sdk_login,
        // Admin
        handlers::dashboard::get_dashboard,
        handlers::customers::list_customers,
        handlers::customers::create_customer,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
        handlers::packs::list_packs,
        handlers::packs::create_pack,
        handlers::packs::get_pack,
        handlers::packs::update_pack,
        handlers::packs::delete_pack,
        handlers::subscriptions::list_subscriptions,
        handlers::subscriptions::approve_subscription,
        handlers::subscriptions::assign_subscription,
        // Customer
        handlers::customer_subscription::list_packs,
        handlers::customer_subscription::get_subscription,
        handlers::customer_subscription::request_subscription,
        handlers::customer_subscription::deactivate_subscription,
        handlers::customer_subscription::subscription_history,
        // SDK
        handlers::sdk_subscription::get_subscription,
        handlers::sdk_subscription::request_subscription,
        handlers::sdk_subscription::deactivate_subscription,
        handlers::sdk_subscription::subscription_history,
    ),
    components(schemas(error::ErrorResponse))
)]
pub struct ApiDoc;
