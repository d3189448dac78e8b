mod jsonl;
mod memory;
mod middleware;

pub use jsonl::JsonlConversationWriter;
pub use memory::MemoryConversationStore;
pub use middleware::Persister;
