pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod reminder;
pub mod reorder;
pub mod session;
pub mod storage;
pub mod store;
pub mod view;
