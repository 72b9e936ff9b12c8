// # ddns-core
//
// Core library for the DNS-to-public-address reconciler.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping DNS records in
// step with the machine's public addresses:
// - **AddressSource**: Trait for discovering the current public address
// - **AddressSourcePool**: Ordered per-family sources, first success wins
// - **DnsProvider**: Trait for reading and updating DNS records via provider APIs
// - **RetryPolicy**: Bounded retry applied to every I/O step
// - **ReconcileEngine**: One full discover → compare → update cycle
// - **Scheduler**: Runs the engine once or on a fixed interval
// - **HostSuffix / synthesize**: IPv6 addresses built from a discovered prefix
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Level-Triggered**: Every cycle re-reads the record values; nothing is cached
// 3. **Fail Fast at Startup**: Bad configuration or unresolvable records stop the process
// 4. **Library-First**: All core functionality can be used as a library

pub mod bits;
pub mod config;
pub mod engine;
pub mod error;
pub mod pool;
pub mod records;
pub mod resolver;
pub mod retry;
pub mod scheduler;
pub mod subnet;
pub mod traits;

// Re-export core types for convenience
pub use bits::BitVector128;
pub use config::{Credentials, DdnsConfig, EngineConfig, RecordLookup, SubnetConfig, SubnetTargetConfig};
pub use engine::{CycleReport, EngineEvent, ReconcileEngine};
pub use error::{Error, Result};
pub use pool::AddressSourcePool;
pub use records::{SubnetTarget, WatchedRecord};
pub use retry::RetryPolicy;
pub use scheduler::{Schedule, Scheduler};
pub use subnet::{HostSuffix, PrefixLength, synthesize};
pub use traits::{AddressFamily, AddressSource, DnsProvider, ProviderRecord};
