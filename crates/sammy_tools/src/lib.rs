#![forbid(unsafe_code)]

pub mod sammy_cli;
