//! Terminal front end for playing a dialogue database

pub mod play;
