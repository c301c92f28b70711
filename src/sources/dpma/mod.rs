//! DPMAregister, the German Patent and Trade Mark Office's file register.

pub mod access;
pub mod compact;
pub mod file_number;
pub mod parser;
pub mod resolver;
pub mod session;
