pub mod calendar;
pub mod call;
pub mod customer;
pub mod provider_settings;
pub mod task;
