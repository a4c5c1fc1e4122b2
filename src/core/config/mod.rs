pub mod credentials;
pub mod paths;
pub mod service;
pub mod settings;
pub mod validation;

pub use credentials::{ConfigCredentials, CredentialKey, CredentialProvider};
pub use paths::AppPaths;
pub use service::ConfigService;
pub use settings::Settings;
