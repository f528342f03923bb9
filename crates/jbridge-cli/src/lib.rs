//! Command-line front end for the jbridge resolution driver.

pub mod args;
pub mod driver;
pub mod reporter;
pub mod request;
