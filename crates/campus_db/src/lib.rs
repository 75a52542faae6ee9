mod db;
pub mod reaction_roles;

pub use db::*;
