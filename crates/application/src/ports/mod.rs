mod conversation_store;
mod response_writer;

pub use conversation_store::{
    Conversation, ConversationCursor, ConversationReader, ConversationWriter,
};
pub use response_writer::ResponseWriter;
