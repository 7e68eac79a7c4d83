pub mod auction;
pub mod bidding;
pub mod config;
pub mod database;
pub mod error;
pub mod event_store;
pub mod invoice;
pub mod message_broker;
pub mod query;
pub mod scheduler;
pub mod settlement;
