//! Application services layer.

pub mod error;
pub mod repos;
pub mod subscription_repo;
pub mod subscriptions;
pub mod total_query;
