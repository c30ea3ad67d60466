pub mod constants;
pub mod errors;
pub mod invite;
pub mod live;
pub mod models;
pub mod query;
pub mod services;
pub mod session;
