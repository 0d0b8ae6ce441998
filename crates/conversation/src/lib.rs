mod error;
mod explain;
mod store;

pub use error::ConversationError;
pub use explain::{explain, ExplainRequest, ExplainSettings, Explanation};
pub use store::{ConversationContext, ConversationSnapshot, ConversationStore, Message, Role};
