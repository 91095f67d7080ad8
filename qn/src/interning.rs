use crate::{Cell, Context, Heap, Kind, Obj, Result, strings::content};

impl Heap {
    /// Finds the symbol named `name` in the symbol `table`.
    pub fn find_symbol(&self, table: Obj, name: &[u8]) -> Option<Obj> {
        let mut current = table;
        while let Some((symbol, rest)) = self.pair(current) {
            if self
                .symbol_name(symbol)
                .is_some_and(|text| self.string_matches(text, name))
            {
                return Some(symbol);
            }
            current = rest;
        }
        None
    }

    /// The name string of a symbol.
    pub fn symbol_name(&self, symbol: Obj) -> Option<Obj> {
        let (name, _) = self.pair(self.binding(symbol)?)?;
        Some(name)
    }

    // (name-string . global-value)
    fn binding(&self, symbol: Obj) -> Option<Obj> {
        match self.get(symbol)? {
            Cell::Symbol { name } => Some(*name),
            _ => None,
        }
    }
}

impl Context {
    /// Interns `name`: the same name always yields the same symbol object.
    ///
    /// A new symbol is prepended to the symbol table and lives as long as
    /// the context. On a miss exactly one root entry, the symbol, is left
    /// on the stack.
    pub fn symbol(&mut self, name: &str) -> Result<Obj> {
        if let Some(found) = self.heap.find_symbol(self.symbols, content(name.as_bytes())) {
            return Ok(found);
        }

        let mark = self.save();
        let symbol = self.allocate(Cell::Symbol { name: Obj::NIL })?;
        let text = self.string(name)?;
        let binding = self.cons(text, Obj::NIL)?;
        self.heap.write(symbol, Cell::Symbol { name: binding });
        self.symbols = self.cons(symbol, self.symbols)?;
        self.restore(mark);
        self.push_root(symbol)?;
        Ok(symbol)
    }

    /// Binds the global value of `symbol`.
    pub fn set(&mut self, symbol: Obj, value: Obj) -> Result<()> {
        let binding = self.binding(symbol)?;
        if let Some(Cell::Pair { rest, .. }) = self.heap.get_mut(binding) {
            *rest = value;
        }
        Ok(())
    }

    /// Global value of `symbol`, nil when unbound.
    pub fn global(&mut self, symbol: Obj) -> Result<Obj> {
        let binding = self.binding(symbol)?;
        Ok(self.heap.pair(binding).map_or(Obj::NIL, |(_, value)| value))
    }

    /// Name of `symbol` as text.
    pub fn symbol_text(&mut self, symbol: Obj) -> Result<String> {
        self.check(symbol, Kind::Symbol)?;
        let name = self.heap.symbol_name(symbol).unwrap_or(Obj::NIL);
        let bytes: Vec<u8> = self.heap.string_bytes(name).collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn symbol_count(&self) -> usize {
        let mut count = 0;
        let mut current = self.symbols;
        while let Some((_, rest)) = self.heap.pair(current) {
            count += 1;
            current = rest;
        }
        count
    }

    fn binding(&mut self, symbol: Obj) -> Result<Obj> {
        match self.heap.binding(symbol) {
            Some(binding) => Ok(binding),
            None => Err(self.mismatch(symbol, Kind::Symbol)),
        }
    }
}
