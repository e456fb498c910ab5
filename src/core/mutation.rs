/// Mutation execution: the write half of the variable system.

use thiserror::Error;

use crate::core::store::{IntScope, VariableStore};
use crate::schema::node::IntOperator;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("divide by zero mutating variable '{0}'")]
    DivideByZero(String),
}

/// Apply a `ModifyInt` node's operator to the store.
///
/// Absent variables are created at 0 before the operator applies; `Set`
/// writes unconditionally. Arithmetic saturates at the i64 bounds. On error
/// the store is untouched.
pub fn apply(
    store: &mut VariableStore,
    scope: IntScope,
    variable: &str,
    operator: IntOperator,
    operand: i64,
) -> Result<(), MutationError> {
    let current = store.int(scope, variable).unwrap_or(0);
    let next = match operator {
        IntOperator::Set => operand,
        IntOperator::Add => current.saturating_add(operand),
        IntOperator::Subtract => current.saturating_sub(operand),
        IntOperator::Multiply => current.saturating_mul(operand),
        IntOperator::Divide => {
            if operand == 0 {
                return Err(MutationError::DivideByZero(variable.to_string()));
            }
            current.saturating_div(operand)
        }
        IntOperator::Increment => current.saturating_add(1),
        IntOperator::Decrement => current.saturating_sub(1),
    };
    store.set_int(scope, variable, next);
    Ok(())
}
