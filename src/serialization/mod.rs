//! Dump and load engines
//!
//! - `validated`: validate the whole record, then dump; load with
//!   aggregated violations
//! - `fast`: dump with inline type checks only
//! - `bytes`: streaming encoder behind `fast_dump_bytes`
//!
//! All dump paths share the coercion steps in `coerce`.

mod bytes;
mod coerce;
mod fast;
mod load;
pub(crate) mod text;
mod validated;

pub use fast::{fast_dump, fast_dump_bytes, fast_dump_one};
pub use load::Loader;
pub use validated::{dump, dump_many, load_many};
