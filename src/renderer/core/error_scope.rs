//! Validation error capture.
//!
//! GPU object creation and command submission report failures asynchronously. The
//! helpers here bracket a block of work with a validation + out-of-memory scope and
//! turn whatever was captured into an [`UmbraError`].

use crate::errors::{Result, UmbraError};

/// Runs `work` inside validation and out-of-memory error scopes.
///
/// `wrap` converts the captured message into the caller's error variant. The
/// result of `work` is only returned when no error was captured.
pub fn capture<T>(
    device: &wgpu::Device,
    wrap: impl FnOnce(String) -> UmbraError,
    work: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let oom_scope = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let validation_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let value = work();

    // Scopes are popped innermost first.
    let validation = pollster::block_on(validation_scope.pop());
    let oom = pollster::block_on(oom_scope.pop());

    if let Some(error) = validation.or(oom) {
        return Err(wrap(error.to_string()));
    }
    value
}

/// [`capture`] for setup and upload work.
pub fn capture_setup<T>(
    device: &wgpu::Device,
    stage: &'static str,
    work: impl FnOnce() -> Result<T>,
) -> Result<T> {
    capture(
        device,
        |message| {
            log::error!("GPU validation error during {stage}: {message}");
            UmbraError::GpuValidation { stage, message }
        },
        work,
    )
}
