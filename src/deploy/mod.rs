pub mod runner;

pub use runner::ScriptRunner;
