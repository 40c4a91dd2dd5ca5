//! Canonical store: schema initialization, models and queries

pub mod goals;
pub mod init;
pub mod locations;
pub mod models;
pub mod notes;
pub mod visits;

pub use goals::*;
pub use init::*;
pub use locations::*;
pub use models::*;
pub use notes::*;
pub use visits::*;
