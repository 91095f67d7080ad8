use std::{
    io::{self, Write},
    mem, process,
};

use crate::{
    Cell, Collector, ContextCreateInfo, ContextSettings, Error, ErrorPolicy, ForeignPtr,
    GcStats, Heap, Host, Kind, NativeFn, NullHost, Obj, Result, RootMark, RootStack,
};

/// Longest backtrace frame written, in bytes.
const FRAME_LIMIT: usize = 255;

/// Call list position, restored by [`Context::pop_call`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallMark(Obj);

/// One interpreter session: the arena, its roots and the host hooks.
///
/// Every allocation pushes the new object on the root stack, callers
/// bracket temporaries with [`Context::save`] and [`Context::restore`].
/// The symbol table, the call list and `t` are roots for the whole
/// session. Once an operation fails the context is closed and every
/// further allocation returns the same error.
pub struct Context {
    pub(crate) heap: Heap,
    pub(crate) collector: Collector,
    pub(crate) roots: RootStack,
    pub(crate) symbols: Obj,
    pub(crate) calls: Obj,
    pub(crate) t: Obj,
    pub(crate) host: Box<dyn Host + Send>,
    diagnostics: Box<dyn Write + Send>,
    settings: ContextSettings,
    failure: Option<Error>,
    lookahead: Option<u8>,
}

impl Context {
    pub fn new(info: ContextCreateInfo) -> Result<Self> {
        Self::with_host(info, NullHost)
    }

    pub fn with_host(info: ContextCreateInfo, host: impl Host + Send + 'static) -> Result<Self> {
        let settings = ContextSettings::from_info(&info)?;
        let diagnostics = info
            .diagnostics
            .unwrap_or_else(|| Box::new(io::stderr()));

        let mut context = Self {
            heap: Heap::new(settings.cells),
            collector: Collector::new(settings.cells),
            roots: RootStack::new(settings.root_stack_size),
            symbols: Obj::NIL,
            calls: Obj::NIL,
            t: Obj::NIL,
            host: Box::new(host),
            diagnostics,
            settings,
            failure: None,
            lookahead: None,
        };

        let mark = context.save();
        let t = context.symbol("t")?;
        context.set(t, t)?;
        context.t = t;
        context.restore(mark);

        log::info!(
            "context created: {} cells, {} root entries",
            settings.cells,
            settings.root_stack_size
        );
        Ok(context)
    }

    /// Tears the session down, handing remaining foreign pointers to the host.
    pub fn close(self) {
        drop(self);
    }

    pub fn settings(&self) -> &ContextSettings {
        &self.settings
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn roots(&self) -> &RootStack {
        &self.roots
    }

    /// The true singleton.
    pub fn t(&self) -> Obj {
        self.t
    }

    pub fn stats(&self) -> GcStats {
        self.collector.stats()
    }

    pub(crate) fn allocate(&mut self, cell: Cell) -> Result<Obj> {
        self.ensure_open()?;
        let object = match self.heap.take_free() {
            Some(object) => object,
            None => {
                log::trace!("free list exhausted, collecting");
                self.collect();
                match self.heap.take_free() {
                    Some(object) => object,
                    None => return Err(self.fail(Error::OutOfMemory)),
                }
            }
        };
        self.heap.write(object, cell);
        self.push_root(object)?;
        Ok(object)
    }

    /// Runs a full collection and returns the number of reclaimed cells.
    pub fn collect(&mut self) -> usize {
        let roots = self
            .roots
            .entries()
            .iter()
            .copied()
            .chain([self.symbols, self.calls, self.t]);
        self.collector
            .collect(&mut self.heap, roots, self.host.as_mut())
    }

    pub fn push_root(&mut self, object: Obj) -> Result<()> {
        self.roots.push(object).map_err(|err| self.fail(err))
    }

    pub fn save(&self) -> RootMark {
        self.roots.save()
    }

    pub fn restore(&mut self, mark: RootMark) {
        self.roots.restore(mark);
    }

    pub fn reset_roots(&mut self) {
        self.roots.clear();
    }

    pub fn cons(&mut self, first: Obj, rest: Obj) -> Result<Obj> {
        self.allocate(Cell::Pair { first, rest })
    }

    pub fn number(&mut self, value: f32) -> Result<Obj> {
        self.allocate(Cell::Number(value))
    }

    /// Builds a proper list of `items`, one root entry per pair.
    /// The items themselves must already be rooted.
    pub fn list(&mut self, items: &[Obj]) -> Result<Obj> {
        let mut list = Obj::NIL;
        for &item in items.iter().rev() {
            list = self.cons(item, list)?;
        }
        Ok(list)
    }

    pub fn boolean(&self, value: bool) -> Obj {
        if value { self.t } else { Obj::NIL }
    }

    pub fn native_function(&mut self, function: NativeFn) -> Result<Obj> {
        self.allocate(Cell::NativeFunction(function))
    }

    pub fn foreign_pointer(&mut self, ptr: ForeignPtr) -> Result<Obj> {
        self.allocate(Cell::ForeignPointer(ptr))
    }

    pub fn host_object(&mut self, class: u32, data: ForeignPtr) -> Result<Obj> {
        self.allocate(Cell::Object { class, data })
    }

    pub fn closure(&mut self, body: Obj) -> Result<Obj> {
        self.allocate(Cell::Function { body })
    }

    pub fn macro_(&mut self, body: Obj) -> Result<Obj> {
        self.allocate(Cell::Macro { body })
    }

    pub fn primitive(&mut self, index: u8) -> Result<Obj> {
        self.allocate(Cell::Primitive(index))
    }

    pub fn kind(&self, object: Obj) -> Kind {
        self.heap.kind(object)
    }

    /// First slot of a pair, nil for nil.
    pub fn car(&mut self, object: Obj) -> Result<Obj> {
        if object.is_nil() {
            return Ok(Obj::NIL);
        }
        match self.heap.get(object).copied() {
            Some(Cell::Pair { first, .. }) => Ok(first),
            _ => Err(self.mismatch(object, Kind::Pair)),
        }
    }

    /// Second slot of a pair, nil for nil.
    pub fn cdr(&mut self, object: Obj) -> Result<Obj> {
        if object.is_nil() {
            return Ok(Obj::NIL);
        }
        match self.heap.get(object).copied() {
            Some(Cell::Pair { rest, .. }) => Ok(rest),
            _ => Err(self.mismatch(object, Kind::Pair)),
        }
    }

    pub fn set_car(&mut self, pair: Obj, value: Obj) -> Result<()> {
        self.check(pair, Kind::Pair)?;
        if let Some(Cell::Pair { first, .. }) = self.heap.get_mut(pair) {
            *first = value;
        }
        Ok(())
    }

    pub fn set_cdr(&mut self, pair: Obj, value: Obj) -> Result<()> {
        self.check(pair, Kind::Pair)?;
        if let Some(Cell::Pair { rest, .. }) = self.heap.get_mut(pair) {
            *rest = value;
        }
        Ok(())
    }

    pub fn number_value(&mut self, object: Obj) -> Result<f32> {
        match self.heap.get(object).copied() {
            Some(Cell::Number(value)) => Ok(value),
            _ => Err(self.mismatch(object, Kind::Number)),
        }
    }

    pub fn foreign_value(&mut self, object: Obj) -> Result<ForeignPtr> {
        match self.heap.get(object).copied() {
            Some(Cell::ForeignPointer(ptr)) => Ok(ptr),
            _ => Err(self.mismatch(object, Kind::ForeignPointer)),
        }
    }

    /// `(class, data)` of a host object.
    pub fn object_value(&mut self, object: Obj) -> Result<(u32, ForeignPtr)> {
        match self.heap.get(object).copied() {
            Some(Cell::Object { class, data }) => Ok((class, data)),
            _ => Err(self.mismatch(object, Kind::Object)),
        }
    }

    pub fn native_value(&mut self, object: Obj) -> Result<NativeFn> {
        match self.heap.get(object).copied() {
            Some(Cell::NativeFunction(function)) => Ok(function),
            _ => Err(self.mismatch(object, Kind::NativeFunction)),
        }
    }

    /// The cell behind `object` if it is of kind `expected`, a type error otherwise.
    pub(crate) fn check(&mut self, object: Obj, expected: Kind) -> Result<Cell> {
        match self.heap.get(object).copied() {
            Some(cell) if cell.kind() == expected => Ok(cell),
            _ => Err(self.mismatch(object, expected)),
        }
    }

    pub(crate) fn mismatch(&mut self, object: Obj, expected: Kind) -> Error {
        let got = self.heap.kind(object);
        self.fail(Error::TypeMismatch { expected, got })
    }

    /// Pops the next argument off `args`.
    pub fn next_arg(&mut self, args: &mut Obj) -> Result<Obj> {
        match self.heap.pair(*args) {
            Some((first, rest)) => {
                *args = rest;
                Ok(first)
            }
            None if args.is_nil() => Err(self.fail(Error::NotEnoughArguments)),
            None => Err(self.fail(Error::DottedArguments)),
        }
    }

    /// Identity, numbers by value, strings by content.
    pub fn equal(&self, a: Obj, b: Obj) -> bool {
        if a == b {
            return true;
        }
        match (self.heap.get(a), self.heap.get(b)) {
            (Some(Cell::Number(x)), Some(Cell::Number(y))) => x == y,
            (Some(Cell::String { .. }), Some(Cell::String { .. })) => self.heap.string_eq(a, b),
            _ => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    /// Fails the session with `message`.
    pub fn error(&mut self, message: impl Into<String>) -> Error {
        self.fail(Error::Message(message.into()))
    }

    /// Ends the session with `error`.
    ///
    /// The call list is detached first, then the host error hook runs and
    /// the diagnostic with one line per call frame is written. Under
    /// [`ErrorPolicy::Exit`] the process terminates afterwards. A session
    /// that already failed keeps its first error.
    pub fn fail(&mut self, error: Error) -> Error {
        if let Some(previous) = &self.failure {
            return previous.clone();
        }

        let calls = mem::replace(&mut self.calls, Obj::NIL);
        let message = error.to_string();
        log::error!("{}", message);

        self.host.error(&self.heap, &message, calls);
        if let Err(err) = self.write_diagnostic(&message, calls) {
            log::warn!("could not write diagnostic: {}", err);
        }

        self.failure = Some(error.clone());
        if self.settings.error_policy == ErrorPolicy::Exit {
            process::exit(1);
        }
        error
    }

    fn write_diagnostic(&mut self, message: &str, calls: Obj) -> io::Result<()> {
        writeln!(self.diagnostics, "error: {}", message)?;
        let mut current = calls;
        // a cyclic call list still ends
        for _ in 0..self.heap.capacity() {
            let Some((frame, rest)) = self.heap.pair(current) else {
                break;
            };
            let mut text = self.heap.render(frame);
            if text.len() > FRAME_LIMIT {
                let mut end = FRAME_LIMIT;
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                text.truncate(end);
            }
            writeln!(self.diagnostics, "=>  {}", text)?;
            current = rest;
        }
        self.diagnostics.flush()
    }

    fn ensure_open(&self) -> Result<()> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Records `expr` as the innermost call frame.
    pub fn push_call(&mut self, expr: Obj) -> Result<CallMark> {
        let mark = CallMark(self.calls);
        let roots = self.save();
        self.calls = self.cons(expr, self.calls)?;
        self.restore(roots);
        Ok(mark)
    }

    pub fn pop_call(&mut self, mark: CallMark) {
        self.calls = mark.0;
    }

    pub fn call_list(&self) -> Obj {
        self.calls
    }

    pub fn lookahead(&self) -> Option<u8> {
        self.lookahead
    }

    pub fn set_lookahead(&mut self, byte: Option<u8>) {
        self.lookahead = byte;
    }

    /// Next input byte, the lookahead slot first.
    pub fn read_byte(&mut self) -> Option<u8> {
        self.lookahead.take().or_else(|| self.host.read())
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.host.write(byte);
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.roots.clear();
        self.symbols = Obj::NIL;
        self.calls = Obj::NIL;
        self.t = Obj::NIL;
        let reclaimed = self.collect();
        log::info!("context closed, {} cells released", reclaimed);
    }
}
