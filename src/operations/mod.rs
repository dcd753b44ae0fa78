pub mod region;
pub mod search;
