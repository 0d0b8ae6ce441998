pub mod components;
pub mod error;
pub mod loader;

pub use components::{ConversationConfig, ForgeConfig, ModelsConfig, ServerConfig};
pub use loader::{load_config, DEFAULT_CONFIG_FILE};
