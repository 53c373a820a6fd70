pub mod app;
pub mod collection;
pub mod util;
