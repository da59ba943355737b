//! Named thread spawning.
//!
//! Every long-running loop (render, link, backend) runs on its own named
//! thread with an explicit stack size so it shows up by name in panics and
//! debuggers.  Spawn failures are returned to the caller rather than
//! panicking.

use std::io;
use std::thread::{Builder, JoinHandle};

/// Default stack for the service threads.
pub const DEFAULT_STACK_KB: usize = 64;

/// Spawn `f` on a thread called `name`.
pub fn spawn_named<T, F>(name: &'static str, stack_kb: usize, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    log::info!("Spawning '{}' (stack={}KB)", name, stack_kb);

    Builder::new()
        .name(name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}
