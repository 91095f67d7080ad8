use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::Context;

/// A context shared between threads.
///
/// The core itself is single threaded, every access goes through the lock.
#[derive(Clone)]
pub struct SharedContext(Arc<Mutex<Context>>);

impl SharedContext {
    pub fn new(context: Context) -> Self {
        Self(Arc::new(Mutex::new(context)))
    }

    pub fn lock(&self) -> MutexGuard<'_, Context> {
        self.0.lock()
    }

    /// Runs `f` with exclusive access to the context.
    pub fn with<R>(&self, f: impl FnOnce(&mut Context) -> R) -> R {
        f(&mut self.0.lock())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::{ContextCreateInfo, Kind};

    #[test]
    fn threads_intern_the_same_symbol() {
        let shared = SharedContext::new(Context::new(ContextCreateInfo::default()).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared.with(|ctx| {
                        let mark = ctx.save();
                        let symbol = ctx.symbol("shared").unwrap();
                        ctx.restore(mark);
                        symbol
                    })
                })
            })
            .collect();

        let symbols: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert!(symbols.windows(2).all(|pair| pair[0] == pair[1]));

        let ctx = shared.lock();
        assert_eq!(ctx.kind(symbols[0]), Kind::Symbol);
        assert_eq!(ctx.roots().depth(), 0);
    }
}
