//! Project configuration: settings and the root URLconf

pub mod settings;
pub mod urls;
