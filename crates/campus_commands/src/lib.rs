pub mod checks;
pub mod commands;
pub mod report;
