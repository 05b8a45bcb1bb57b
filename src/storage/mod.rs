pub mod db;
pub mod models;
mod tables;
mod uploads;

pub use db::{Database, DatabaseError};
pub use tables::*;
