//! Final lowering: IR class units to stack-machine assembly text.

mod jasmin;

use thiserror::Error;

use super::ClassUnit;

pub use jasmin::JasminEmitter;

/// The fixed per-method header values (`.limit stack`, `.limit locals`).
/// They are conservative constants, not computed from the code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceLimits {
    pub stack: u32,
    pub locals: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            stack: 99,
            locals: 99,
        }
    }
}

/// Internal faults of emission. Each one means the IR handed to the
/// emitter breaks an invariant the lowering guarantees.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EmitError {
    #[error("unknown operand '{name}' in method '{method}'")]
    UnknownOperand { name: String, method: String },
    #[error("assignment destination '{dest}' in method '{method}' is not an operand")]
    InvalidAssignTarget { dest: String, method: String },
    #[error("'{instruction}' in method '{method}' does not produce a value")]
    NotAValue { instruction: String, method: String },
    #[error("non-void return of type {ty} without a value in method '{method}'")]
    MissingReturnValue { ty: String, method: String },
    #[error("call target '{target}' in method '{method}' is not an object")]
    InvalidCallTarget { target: String, method: String },
}

/// Emit every unit with the same limits, in order.
pub fn emit_units(units: &[ClassUnit], limits: ResourceLimits) -> Result<Vec<String>, EmitError> {
    units
        .iter()
        .map(|unit| {
            JasminEmitter::new(unit)
                .with_limits(limits)
                .build()
                .map(str::to_string)
        })
        .collect()
}
