//! Small, dependency-light collection types shared by `mlooper-kernel`.
//!
//! Neither type here is a generic container in the sense `spec.md` puts out
//! of scope (intrusive linked lists, vectors, keyed vectors): they are
//! narrow, purpose-built structures for exactly one job each — a
//! time-ordered sequence with stable ties, and a bounded object recycle
//! pool — with no intrusive linkage and no unsafe code.

pub mod ordered;
pub mod pool;

pub use ordered::OrderedSeq;
pub use pool::Pool;
