//! Binds the engine's [`Provider`](crate::core::session::Provider) to the
//! host's instrumentation service. Each OS exposes a `NativeProvider` so call
//! sites stay free of `#[cfg]` blocks.

#[cfg(not(windows))]
mod unsupported;
#[cfg(not(windows))]
pub use unsupported::NativeProvider;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::NativeProvider;
