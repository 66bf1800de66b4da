// operations.rs

use std::collections::HashMap;
use std::fmt;

use crate::calculation::{format_number, CalculationRecord};
use crate::error::CalcError;

pub type ApplyFn = fn(f64, f64) -> f64;
pub type ValidateFn = fn(f64, f64) -> Result<(), Rejection>;

/// Why a validator refused a pair of operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    DivisionByZero,
    Invalid(&'static str),
}

/// How an expression is written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Notation {
    /// `a <symbol> b`
    #[default]
    Infix,
    /// `b<symbol>a`, e.g. `3√27`
    Radical,
    /// `|a - b|`
    AbsoluteDifference,
}

/// A named binary operation. Built once and never mutated after it is
/// handed to the registry.
#[derive(Clone)]
pub struct Operation {
    name: String,
    symbol: String,
    notation: Notation,
    description: String,
    apply: ApplyFn,
    validate: Option<ValidateFn>,
}

impl Operation {
    pub fn new(name: &str, description: &str, apply: ApplyFn) -> Self {
        let name = normalize(name);
        Self {
            symbol: name.clone(),
            notation: Notation::Infix,
            name,
            description: description.to_string(),
            apply,
            validate: None,
        }
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = symbol.to_string();
        self
    }

    pub fn with_notation(mut self, notation: Notation) -> Self {
        self.notation = notation;
        self
    }

    pub fn with_validator(mut self, validate: ValidateFn) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Left-hand side of the expression, e.g. `5 + 3` or `3√27`.
    pub fn expression(&self, a: f64, b: f64) -> String {
        let (a, b) = (format_number(a), format_number(b));
        match self.notation {
            Notation::Infix => format!("{a} {} {b}", self.symbol),
            Notation::Radical => format!("{b}{}{a}", self.symbol),
            Notation::AbsoluteDifference => format!("|{a} - {b}|"),
        }
    }

    /// Validates the operands, applies the function and rejects
    /// non-finite results.
    pub fn evaluate(&self, a: f64, b: f64) -> Result<f64, CalcError> {
        if let Some(validate) = self.validate {
            validate(a, b).map_err(|rejection| match rejection {
                Rejection::DivisionByZero => CalcError::DivisionByZero {
                    operation: self.name.clone(),
                    a,
                    b,
                },
                Rejection::Invalid(reason) => CalcError::invalid(&self.name, reason),
            })?;
        }
        let result = (self.apply)(a, b);
        if result.is_finite() {
            Ok(result)
        } else if result.is_nan() {
            Err(CalcError::invalid(&self.name, "result is not a real number"))
        } else {
            Err(CalcError::Overflow {
                operation: self.name.clone(),
            })
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("symbol", &self.symbol)
            .field("validated", &self.validate.is_some())
            .finish()
    }
}

/// Name -> operation lookup that remembers registration order.
#[derive(Debug, Default, Clone)]
pub struct OperationRegistry {
    operations: Vec<Operation>,
    index: HashMap<String, usize>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for operation in builtins() {
            // names in the builtin table are distinct
            let _ = registry.register(operation);
        }
        registry
    }

    pub fn register(&mut self, operation: Operation) -> Result<(), CalcError> {
        if self.index.contains_key(operation.name()) {
            return Err(CalcError::DuplicateOperation(operation.name().to_string()));
        }
        self.index
            .insert(operation.name().to_string(), self.operations.len());
        self.operations.push(operation);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&Operation, CalcError> {
        let key = normalize(name);
        self.index
            .get(&key)
            .map(|&i| &self.operations[i])
            .ok_or(CalcError::UnknownOperation(key))
    }

    /// Renders a record with its operation's notation; records of
    /// operations that are not registered fall back to their own format.
    pub fn describe(&self, record: &CalculationRecord) -> String {
        match self.resolve(&record.operation) {
            Ok(op) => format!(
                "{} = {}",
                op.expression(record.operand_a, record.operand_b),
                format_number(record.result)
            ),
            Err(_) => record.to_string(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&normalize(name))
    }

    pub fn list_names(&self) -> Vec<&str> {
        self.operations.iter().map(Operation::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn nonzero_divisor(_a: f64, b: f64) -> Result<(), Rejection> {
    if b == 0.0 {
        Err(Rejection::DivisionByZero)
    } else {
        Ok(())
    }
}

fn power_operands(a: f64, b: f64) -> Result<(), Rejection> {
    if a == 0.0 && b < 0.0 {
        return Err(Rejection::Invalid("0 cannot be raised to a negative power"));
    }
    if a < 0.0 && b.fract() != 0.0 {
        return Err(Rejection::Invalid(
            "negative base with a fractional exponent is not real",
        ));
    }
    Ok(())
}

fn root_operands(a: f64, b: f64) -> Result<(), Rejection> {
    if b == 0.0 {
        return Err(Rejection::Invalid("root index cannot be zero"));
    }
    if a == 0.0 && b < 0.0 {
        return Err(Rejection::Invalid("negative root of zero is undefined"));
    }
    if a < 0.0 {
        if b.fract() != 0.0 {
            return Err(Rejection::Invalid(
                "fractional root of a negative number is not real",
            ));
        }
        if b % 2.0 == 0.0 {
            return Err(Rejection::Invalid("even root of a negative number is not real"));
        }
    }
    Ok(())
}

fn root(a: f64, b: f64) -> f64 {
    if a < 0.0 {
        -(a.abs().powf(1.0 / b))
    } else {
        a.powf(1.0 / b)
    }
}

// floored remainder: the sign follows the divisor
fn modulus(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

fn builtins() -> Vec<Operation> {
    vec![
        Operation::new("add", "Add two numbers", |a, b| a + b).with_symbol("+"),
        Operation::new("subtract", "Subtract the second number from the first", |a, b| a - b)
            .with_symbol("-"),
        Operation::new("multiply", "Multiply two numbers", |a, b| a * b).with_symbol("*"),
        Operation::new("divide", "Divide the first number by the second", |a, b| a / b)
            .with_symbol("/")
            .with_validator(nonzero_divisor),
        Operation::new("power", "Raise the first number to the power of the second", f64::powf)
            .with_symbol("^")
            .with_validator(power_operands),
        Operation::new("root", "Take the b-th root of a", root)
            .with_symbol("√")
            .with_notation(Notation::Radical)
            .with_validator(root_operands),
        Operation::new("modulus", "Remainder of the first number divided by the second", modulus)
            .with_symbol("%")
            .with_validator(nonzero_divisor),
        Operation::new("int_divide", "Floor division of the first number by the second", |a, b| {
            (a / b).floor()
        })
        .with_symbol("//")
        .with_validator(nonzero_divisor),
        Operation::new("percent", "Express the first number as a percentage of the second", |a, b| {
            a / b * 100.0
        })
        .with_symbol("% of")
        .with_validator(nonzero_divisor),
        Operation::new("abs_diff", "Absolute difference between two numbers", |a, b| (a - b).abs())
            .with_symbol("|-|")
            .with_notation(Notation::AbsoluteDifference),
    ]
}
