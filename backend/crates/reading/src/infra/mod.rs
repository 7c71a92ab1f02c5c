pub mod memory;
pub mod postgres;

pub use memory::InMemoryEntryRepository;
pub use postgres::PgEntryRepository;
