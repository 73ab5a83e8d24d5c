//! Leaf probes. Each one reads a single kind of external state and knows
//! nothing about the others.

pub mod introspect;
pub mod logs;
pub mod scan;
pub mod system;

pub use introspect::inspect;
pub use logs::{
    classify,
    tail,
    LogKind,
    LogLevel,
    LogLine,
};
pub use scan::scan_size;
pub use system::{
    SystemProbe,
    SystemStats,
};
