mod collector;
mod context;
mod error;
mod format;
mod heap;
mod host;
mod interning;
mod object;
mod roots;
mod settings;
mod shared;
mod strings;
mod visitor;

pub use collector::{Collector, GcStats, MarkBits, Marker};
pub use context::{CallMark, Context};
pub use error::{Error, Result};
pub use format::format_number;
pub use heap::{CELL_SIZE, DEFAULT_ARENA_SIZE, Heap};
pub use host::{Host, NullHost};
pub use object::*;
pub use roots::{DEFAULT_ROOT_STACK_SIZE, RootMark, RootStack};
pub use settings::{
    ContextCreateInfo, ContextSettings, ErrorPolicy, MIN_CELLS, MIN_ROOT_STACK_SIZE,
};
pub use shared::SharedContext;
pub use strings::StringBytes;
pub use visitor::{Visitable, Visitor};
