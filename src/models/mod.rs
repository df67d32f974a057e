pub mod actor;
pub mod worker;
