//! Adapters behind the domain ports: ledgers, the mock processor gateway,
//! clocks, and alert sinks.

pub mod alerts;
pub mod clock;
pub mod in_memory;
pub mod processor;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
