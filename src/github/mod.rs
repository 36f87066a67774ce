pub mod models;
pub mod signature;

pub use models::PushEvent;
