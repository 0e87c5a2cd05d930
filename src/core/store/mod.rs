mod store_trait;
pub use store_trait::{PrincipalSecret, PrincipalStore};

mod memory;
pub use memory::MemoryStore;
