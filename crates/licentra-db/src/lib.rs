//! Licentra database layer
//!
//! Repository-per-aggregate access to the backing Postgres store. All SQL
//! lives here, including the atomic conditional writes the subscription
//! lifecycle engine relies on.

pub mod db;

pub use db::{
    AdminSubscriptionRow, ApiKeyRepository, CustomerRepository, NewSubscriptionPack,
    PackRepository, PrincipalRepository, RecentActivity, ReportingRepository,
    SubscriptionRepository, SubscriptionWithPack, UpdateCustomer, UpdateSubscriptionPack,
};
