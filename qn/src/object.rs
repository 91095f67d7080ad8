//! Obj: reference to a cell in a context's arena, or the nil sentinel
//!
//! Cell: the single heap unit. The variant is the kind discriminant, marks
//! live out of band in the collector.
//!
//! Kind: closed enumeration of what an object represents
use std::{ffi::c_void, fmt, mem};

use crate::{Context, Result};

/// String payload carried by a single chunk cell.
pub const STRING_CHUNK: usize = mem::size_of::<usize>() - 1;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Pair,
    Free,
    String,
    Number,
    Symbol,
    Object,
    Nil,
    Function,
    Primitive,
    NativeFunction,
    ForeignPointer,
    Macro,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Pair => "pair",
            Kind::Free => "free",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Symbol => "symbol",
            Kind::Object => "object",
            Kind::Nil => "nil",
            Kind::Function => "function",
            Kind::Primitive => "primitive",
            Kind::NativeFunction => "native-function",
            Kind::ForeignPointer => "foreign-pointer",
            Kind::Macro => "macro",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference to an object.
///
/// Either the index of a cell in the owning context's arena or [`Obj::NIL`],
/// the empty/falsy singleton, which has no slot and is never collected.
/// References stay valid across collections as long as the object is
/// reachable, cells never move.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Obj(u32);

impl Obj {
    pub const NIL: Obj = Obj(u32::MAX);

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize, "arena index out of range");
        Self(index as u32)
    }

    /// Arena slot of this object, `None` for nil.
    #[inline]
    pub fn index(self) -> Option<usize> {
        if self.is_nil() {
            None
        } else {
            Some(self.0 as usize)
        }
    }

    #[inline]
    pub fn is_nil(self) -> bool {
        self == Self::NIL
    }
}

impl Default for Obj {
    fn default() -> Self {
        Self::NIL
    }
}

impl fmt::Debug for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(index) => write!(f, "Obj({})", index),
            None => write!(f, "Obj(nil)"),
        }
    }
}

/// Host callable stored in a native-function cell, receives the argument list.
pub type NativeFn = fn(&mut Context, Obj) -> Result<Obj>;

/// Opaque, non-owning pointer to host memory.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ForeignPtr(*mut c_void);

// SAFETY: the core never dereferences foreign pointers, only the host does
unsafe impl Send for ForeignPtr {}

impl ForeignPtr {
    pub fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    pub fn from_addr(addr: usize) -> Self {
        Self(addr as *mut c_void)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }

    pub fn addr(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

/// A single arena cell: two words worth of payload plus the discriminant.
#[derive(Copy, Clone)]
pub enum Cell {
    Pair { first: Obj, rest: Obj },
    Free { next: Obj },
    /// One chunk of a string, zero bytes after the content act as terminator.
    String { chunk: [u8; STRING_CHUNK], next: Obj },
    Number(f32),
    /// `name` is the association `(name-string . global-value)`.
    Symbol { name: Obj },
    Object { class: u32, data: ForeignPtr },
    /// Evaluator closure, `body` layout belongs to the evaluator.
    Function { body: Obj },
    Primitive(u8),
    NativeFunction(NativeFn),
    ForeignPointer(ForeignPtr),
    Macro { body: Obj },
}

impl Cell {
    #[inline]
    pub fn kind(&self) -> Kind {
        match self {
            Cell::Pair { .. } => Kind::Pair,
            Cell::Free { .. } => Kind::Free,
            Cell::String { .. } => Kind::String,
            Cell::Number(_) => Kind::Number,
            Cell::Symbol { .. } => Kind::Symbol,
            Cell::Object { .. } => Kind::Object,
            Cell::Function { .. } => Kind::Function,
            Cell::Primitive(_) => Kind::Primitive,
            Cell::NativeFunction(_) => Kind::NativeFunction,
            Cell::ForeignPointer(_) => Kind::ForeignPointer,
            Cell::Macro { .. } => Kind::Macro,
        }
    }

    pub(crate) fn empty_chunk() -> Self {
        Cell::String {
            chunk: [0; STRING_CHUNK],
            next: Obj::NIL,
        }
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Pair { first, rest } => f
                .debug_struct("Pair")
                .field("first", first)
                .field("rest", rest)
                .finish(),
            Cell::Free { next } => f.debug_struct("Free").field("next", next).finish(),
            Cell::String { chunk, next } => f
                .debug_struct("String")
                .field("chunk", &String::from_utf8_lossy(chunk))
                .field("next", next)
                .finish(),
            Cell::Number(value) => f.debug_tuple("Number").field(value).finish(),
            Cell::Symbol { name } => f.debug_struct("Symbol").field("name", name).finish(),
            Cell::Object { class, data } => f
                .debug_struct("Object")
                .field("class", class)
                .field("data", data)
                .finish(),
            Cell::Function { body } => f.debug_struct("Function").field("body", body).finish(),
            Cell::Primitive(index) => f.debug_tuple("Primitive").field(index).finish(),
            Cell::NativeFunction(func) => write!(f, "NativeFunction({:#x})", *func as usize),
            Cell::ForeignPointer(ptr) => f.debug_tuple("ForeignPointer").field(ptr).finish(),
            Cell::Macro { body } => f.debug_struct("Macro").field("body", body).finish(),
        }
    }
}
