mod schema;

pub use schema::{
    Config, ConversationSettings, GeminiConfig, ProvidersConfig, ServerConfig, TwilioConfig,
};
