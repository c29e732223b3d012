pub mod bb_provider;
pub mod client;
pub mod util;
