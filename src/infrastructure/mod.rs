pub mod logging;
pub mod tls;
