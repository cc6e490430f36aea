pub mod api_key;
pub mod customer;
pub mod pack;
pub mod principal;
pub mod reporting;
pub mod subscription;

pub use api_key::ApiKeyRepository;
pub use customer::{CustomerRepository, UpdateCustomer};
pub use pack::{NewSubscriptionPack, PackRepository, UpdateSubscriptionPack};
pub use principal::PrincipalRepository;
pub use reporting::{RecentActivity, ReportingRepository};
pub use subscription::{AdminSubscriptionRow, SubscriptionRepository, SubscriptionWithPack};
