mod probe_app;

pub use probe_app::{ProbeApp, ProbeOperation};
