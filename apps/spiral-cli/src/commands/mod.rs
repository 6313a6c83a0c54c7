pub mod glints;
pub mod modules;
