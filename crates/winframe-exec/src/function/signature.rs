//! Window function signatures for argument and return type matching.

use std::fmt;

use winframe_core::DataType;

/// The accepted type of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentType {
    /// Exactly this type.
    Exact(DataType),
    /// Any type.
    Any,
}

impl ArgumentType {
    /// Returns true if an argument of `data_type` is accepted.
    #[must_use]
    pub fn accepts(self, data_type: DataType) -> bool {
        match self {
            Self::Exact(expected) => expected == data_type,
            Self::Any => true,
        }
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(data_type) => write!(f, "{data_type}"),
            Self::Any => f.write_str("ANY"),
        }
    }
}

/// How a signature's return type is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    /// Always this type.
    Fixed(DataType),
    /// The type of the argument at this position.
    SameAsArgument(usize),
}

/// The signature of a window function: name, argument types and return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    /// The function name, lower case.
    pub name: String,
    /// Accepted argument types, in order.
    pub argument_types: Vec<ArgumentType>,
    /// The return type.
    pub return_type: ReturnType,
}

impl FunctionSignature {
    /// Creates a signature without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, return_type: ReturnType) -> Self {
        Self { name: name.into().to_lowercase(), argument_types: Vec::new(), return_type }
    }

    /// Adds an argument.
    #[must_use]
    pub fn with_argument(mut self, argument: ArgumentType) -> Self {
        self.argument_types.push(argument);
        self
    }

    /// Returns true if the signature accepts arguments of `types`.
    #[must_use]
    pub fn matches(&self, types: &[DataType]) -> bool {
        self.argument_types.len() == types.len()
            && self.argument_types.iter().zip(types).all(|(a, t)| a.accepts(*t))
    }

    /// Resolves the return type for arguments of `types`.
    ///
    /// Returns `None` if the signature does not match.
    #[must_use]
    pub fn resolve_return_type(&self, types: &[DataType]) -> Option<DataType> {
        if !self.matches(types) {
            return None;
        }
        match self.return_type {
            ReturnType::Fixed(data_type) => Some(data_type),
            ReturnType::SameAsArgument(index) => types.get(index).copied(),
        }
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, argument) in self.argument_types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{argument}")?;
        }
        f.write_str(")")
    }
}

/// Formats a call as `name(TYPE, ...)` for error messages.
#[must_use]
pub fn format_call(name: &str, types: &[DataType]) -> String {
    let types: Vec<&str> = types.iter().map(|t| t.name()).collect();
    format!("{name}({})", types.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_matching() {
        let sig = FunctionSignature::new("SUM", ReturnType::SameAsArgument(0))
            .with_argument(ArgumentType::Exact(DataType::Double));
        assert_eq!(sig.name, "sum");
        assert!(sig.matches(&[DataType::Double]));
        assert!(!sig.matches(&[DataType::BigInt]));
        assert!(!sig.matches(&[]));
        assert_eq!(sig.resolve_return_type(&[DataType::Double]), Some(DataType::Double));
        assert_eq!(sig.resolve_return_type(&[DataType::Varchar]), None);
    }

    #[test]
    fn any_accepts_every_type() {
        let sig = FunctionSignature::new("count", ReturnType::Fixed(DataType::BigInt))
            .with_argument(ArgumentType::Any);
        assert!(sig.matches(&[DataType::Varchar]));
        assert_eq!(sig.resolve_return_type(&[DataType::Boolean]), Some(DataType::BigInt));
    }

    #[test]
    fn display_formats() {
        let sig = FunctionSignature::new("nth_value", ReturnType::SameAsArgument(0))
            .with_argument(ArgumentType::Any)
            .with_argument(ArgumentType::Exact(DataType::BigInt));
        assert_eq!(sig.to_string(), "nth_value(ANY, BIGINT)");
        assert_eq!(format_call("sum", &[DataType::Varchar]), "sum(VARCHAR)");
        assert_eq!(format_call("rank", &[]), "rank()");
    }
}
