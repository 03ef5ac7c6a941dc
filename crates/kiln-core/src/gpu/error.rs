// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the hierarchy of error types for the device layer.

use crate::gpu::api::QueueType;
use std::fmt;

/// A native API call that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    /// The native call, e.g. `"CreateCommittedResource"` or `"request_device"`.
    pub call: &'static str,
    /// Details reported by the backend.
    pub message: String,
}

impl NativeError {
    /// Creates an error for a failed native call.
    pub fn new(call: &'static str, message: impl Into<String>) -> Self {
        Self {
            call,
            message: message.into(),
        }
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.call, self.message)
    }
}

impl std::error::Error for NativeError {}

/// A misuse of the device layer's contracts by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// A resource was asked for an interface it does not implement.
    UnsupportedInterface {
        /// The resource's name.
        resource: String,
        /// The interface that was requested.
        interface: &'static str,
    },
    /// `reset` was called on a context that still holds an allocator.
    ContextStillHoldsAllocator,
    /// A recording operation was used on a context that is not recording.
    ContextNotRecording,
    /// A state that the context's queue cannot use, or an operation that
    /// needs a state the resource is not in.
    InvalidResourceState(String),
    /// A fence value was given to a queue that did not produce it.
    QueueMismatch {
        /// The queue the value was given to.
        expected: QueueType,
        /// The raw fence value.
        value: u64,
    },
    /// A wait was requested on a fence value its queue has not signalled yet.
    UnsignaledFence {
        /// The raw fence value.
        value: u64,
    },
    /// Creation parameters were rejected before reaching the native API.
    InvalidCreationParams(String),
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractViolation::UnsupportedInterface {
                resource,
                interface,
            } => {
                write!(f, "Resource '{resource}' does not support interface {interface}")
            }
            ContractViolation::ContextStillHoldsAllocator => {
                write!(f, "Command context reset while still holding an allocator")
            }
            ContractViolation::ContextNotRecording => {
                write!(f, "Command context is not recording")
            }
            ContractViolation::InvalidResourceState(msg) => {
                write!(f, "Invalid resource state: {msg}")
            }
            ContractViolation::QueueMismatch { expected, value } => {
                write!(f, "Fence value {value:#x} was not produced by the {expected} queue")
            }
            ContractViolation::UnsignaledFence { value } => {
                write!(f, "Fence value {value:#x} has not been signalled")
            }
            ContractViolation::InvalidCreationParams(msg) => {
                write!(f, "Invalid creation parameters: {msg}")
            }
        }
    }
}

impl std::error::Error for ContractViolation {}

/// The top-level error type for the device layer.
#[derive(Debug)]
pub enum GraphicsError {
    /// Enumeration produced no adapter that passes the selection policy.
    NoSuitableAdapter,
    /// The native instance could not be created.
    InstanceCreationFailed(NativeError),
    /// The logical device or one of its queues could not be created.
    DeviceCreationFailed(NativeError),
    /// The swap chain could not be created.
    SwapChainCreationFailed(NativeError),
    /// A queue family required for a queue type does not exist.
    QueueFamilyUnavailable(QueueType),
    /// An operation was attempted in the wrong lifecycle state.
    InvalidState {
        /// The operation attempted.
        operation: &'static str,
        /// The state the object was in.
        state: String,
    },
    /// The configuration could not be loaded.
    Configuration(String),
    /// A native call failed after startup.
    Native(NativeError),
    /// The caller broke a contract.
    Contract(ContractViolation),
}

impl GraphicsError {
    /// Returns `true` for errors that abort startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GraphicsError::NoSuitableAdapter
                | GraphicsError::InstanceCreationFailed(_)
                | GraphicsError::DeviceCreationFailed(_)
                | GraphicsError::SwapChainCreationFailed(_)
                | GraphicsError::QueueFamilyUnavailable(_)
        )
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::NoSuitableAdapter => write!(f, "No suitable graphics adapter found"),
            GraphicsError::InstanceCreationFailed(e) => {
                write!(f, "Failed to create graphics instance: {e}")
            }
            GraphicsError::DeviceCreationFailed(e) => {
                write!(f, "Failed to create graphics device: {e}")
            }
            GraphicsError::SwapChainCreationFailed(e) => {
                write!(f, "Failed to create swap chain: {e}")
            }
            GraphicsError::QueueFamilyUnavailable(queue) => {
                write!(f, "No queue family supports {queue} work")
            }
            GraphicsError::InvalidState { operation, state } => {
                write!(f, "Cannot {operation} while in state {state}")
            }
            GraphicsError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            GraphicsError::Native(e) => write!(f, "Native call error: {e}"),
            GraphicsError::Contract(e) => write!(f, "Contract violation: {e}"),
        }
    }
}

impl std::error::Error for GraphicsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphicsError::InstanceCreationFailed(e)
            | GraphicsError::DeviceCreationFailed(e)
            | GraphicsError::SwapChainCreationFailed(e)
            | GraphicsError::Native(e) => Some(e),
            GraphicsError::Contract(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NativeError> for GraphicsError {
    fn from(err: NativeError) -> Self {
        GraphicsError::Native(err)
    }
}

impl From<ContractViolation> for GraphicsError {
    fn from(err: ContractViolation) -> Self {
        GraphicsError::Contract(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn native_error_display() {
        let err = NativeError::new("CreateCommandQueue", "E_OUTOFMEMORY");
        assert_eq!(format!("{err}"), "CreateCommandQueue failed: E_OUTOFMEMORY");
    }

    #[test]
    fn graphics_error_wraps_native_error() {
        let err = GraphicsError::DeviceCreationFailed(NativeError::new(
            "request_device",
            "limits not met",
        ));
        assert_eq!(
            format!("{err}"),
            "Failed to create graphics device: request_device failed: limits not met"
        );
        assert!(err.source().is_some());
        assert!(err.is_fatal());
    }

    #[test]
    fn contract_violation_converts_into_graphics_error() {
        let err: GraphicsError = ContractViolation::ContextStillHoldsAllocator.into();
        assert_eq!(
            format!("{err}"),
            "Contract violation: Command context reset while still holding an allocator"
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn queue_family_error_names_queue() {
        let err = GraphicsError::QueueFamilyUnavailable(QueueType::Compute);
        assert_eq!(format!("{err}"), "No queue family supports Compute work");
        assert!(err.source().is_none());
    }
}
