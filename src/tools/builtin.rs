//! Demo tools wired into the CLI

use crate::protocol::Literal;
use crate::{Error, Result};

use super::Tool;

/// Tools available to `parley chat`
#[must_use]
pub fn demo_tools() -> Vec<Tool> {
    vec![
        Tool::from_fn(
            "calculate_factorial",
            "Calculate the factorial of an number.",
            calculate_factorial,
        )
        .with_parameter(
            "parameter_integer_value",
            "The number to find the factorial of.",
            "number",
        ),
        Tool::from_fn(
            "get_employee_name_from_employee_id",
            "Get the employee name from the employee id.",
            employee_name,
        )
        .with_parameter("employee_id", "The employee id.", "number"),
    ]
}

fn single_integer(name: &str, args: &[Literal]) -> Result<i64> {
    match args {
        [value] => value
            .as_i64()
            .ok_or_else(|| Error::Tool(format!("{name}: expected an integer, got {value}"))),
        _ => Err(Error::Tool(format!(
            "{name}: expected 1 argument, got {}",
            args.len()
        ))),
    }
}

fn calculate_factorial(args: &[Literal]) -> Result<Literal> {
    let n = single_integer("calculate_factorial", args)?;
    if n < 0 {
        return Err(Error::Tool(format!("calculate_factorial: {n} is negative")));
    }
    tracing::debug!(number = n, "calculate_factorial called");

    (1..=n)
        .try_fold(1i64, i64::checked_mul)
        .map(Literal::Int)
        .ok_or_else(|| Error::Tool(format!("calculate_factorial: {n}! overflows")))
}

fn employee_name(args: &[Literal]) -> Result<Literal> {
    let id = single_integer("get_employee_name_from_employee_id", args)?;
    tracing::debug!(employee_id = id, "get_employee_name_from_employee_id called");

    let name = if id % 2 == 0 {
        "mary stevenson"
    } else {
        "franklin smith"
    };
    Ok(Literal::from(name))
}
