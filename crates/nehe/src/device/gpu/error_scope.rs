use crate::error::{NeHeError, Result};

/// Captures wgpu errors raised by the device calls made while it is open.
///
/// Without an open scope wgpu hands errors to the uncaptured handler, which
/// panics. Scopes nest; `end` pops them innermost first.
#[must_use = "an error scope must be closed with `end`"]
pub(crate) struct ErrorScope {
    operation: &'static str,
    guards: Vec<wgpu::ErrorScopeGuard>,
}

impl ErrorScope {
    /// Out-of-memory and validation failures of a resource allocation.
    pub(crate) fn allocation(device: &wgpu::Device, operation: &'static str) -> Self {
        Self::new(device, operation, &[wgpu::ErrorFilter::OutOfMemory, wgpu::ErrorFilter::Validation])
    }

    /// Validation failures, e.g. a shader module that does not parse.
    pub(crate) fn validation(device: &wgpu::Device, operation: &'static str) -> Self {
        Self::new(device, operation, &[wgpu::ErrorFilter::Validation])
    }

    fn new(device: &wgpu::Device, operation: &'static str, filters: &[wgpu::ErrorFilter]) -> Self {
        let guards = filters.iter().map(|&filter| device.push_error_scope(filter)).collect();
        Self { operation, guards }
    }

    /// Closes the scope, turning the first captured error into a backend error.
    ///
    /// Native backends resolve the pop immediately.
    pub(crate) fn end(mut self) -> Result<()> {
        let mut first = None;
        while let Some(guard) = self.guards.pop() {
            let captured = pollster::block_on(guard.pop());
            if first.is_none() {
                first = captured;
            }
        }

        match first {
            Some(err) => Err(NeHeError::backend(self.operation, err)),
            None => Ok(()),
        }
    }
}
