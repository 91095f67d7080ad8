use crate::{Heap, Marker, Obj};

/// Callbacks the core invokes on the embedding host.
///
/// All hooks default to doing nothing. Hooks only ever get read access to the
/// heap, they cannot allocate while the core is collecting or failing.
pub trait Host {
    /// Invoked once when the session fails, before the diagnostic is written.
    /// `calls` is the call list as it was before it got cleared.
    fn error(&mut self, heap: &Heap, message: &str, calls: Obj) {
        let _ = (heap, message, calls);
    }

    /// Invoked during marking for every reachable foreign-pointer object.
    /// Objects the host keeps alive through it are marked via `marker`.
    fn mark(&mut self, marker: &mut Marker<'_>, object: Obj) {
        let _ = (marker, object);
    }

    /// Invoked exactly once for every foreign-pointer object about to be
    /// reclaimed. The cell still holds its pointer during the call.
    fn gc(&mut self, heap: &Heap, object: Obj) {
        let _ = (heap, object);
    }

    fn write(&mut self, byte: u8) {
        let _ = byte;
    }

    fn read(&mut self) -> Option<u8> {
        None
    }
}

/// Host without any hooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {}
