pub mod settings;

pub use settings::{AppSettings, EngineSettings, Language, UiSettings};
