mod settings;

pub use settings::{
    AppConfig, MissingTemplatePolicy, ServerConfig, SessionConfig, Settings, TemplateConfig,
};
