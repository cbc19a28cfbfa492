pub mod policy;
pub mod runner;
