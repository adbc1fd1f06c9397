//! Deliberation repository adapters

mod memory;

pub use memory::InMemoryDeliberationRepository;
