//! Structure translation for callers whose pointer width differs from the
//! host's.
//!
//! Root parameters are described per entry point; everything reachable
//! through `pNext` is handled generically through [`schema`] so the 32-bit
//! and native layouts of one structure are derived from a single field
//! list.

pub mod chain;
pub mod convert;
pub mod schema;
pub mod space;

pub use chain::{find_next_struct, find_next_struct32, BaseStructure32};
pub use convert::{ChainReader, Converter};
pub use schema::{schema_for, FieldKind, StructLayout, StructSchema, Width};
pub use space::{read_pod, write_pod, AddressSpace32, Arena32, Identity32};
