pub mod config;
pub mod goto;
pub mod scroll;
