pub mod entities;
pub mod repository;
pub mod value_objects;

pub use entities::{Entry, EntryPatch};
pub use repository::{EntryFilter, EntryRepository};
pub use value_objects::{Actor, Description, EntryKind, EntryStatus, Link, Page, Title};
