//! Window function registry.

use std::collections::HashMap;

use tracing::debug;
use winframe_core::DataType;

use super::builtins;
use super::signature::{format_call, FunctionSignature};
use super::traits::{
    WindowFunction, WindowFunctionArg, WindowFunctionContext, WindowFunctionFactory,
};
use crate::config::WindowConfig;
use crate::error::{WindowError, WindowResult};

/// A registry of window functions.
///
/// Functions are stored under their lower-cased names; one name may carry
/// several signatures, each with its own factory. Lookups are
/// case-insensitive.
///
/// # Example
///
/// ```
/// use winframe_core::DataType;
/// use winframe_exec::{WindowConfig, WindowFunctionRegistry};
///
/// let registry = WindowFunctionRegistry::with_builtins();
/// let config = WindowConfig::default();
/// let function = registry.create("ROW_NUMBER", &[], DataType::BigInt, false, &config);
/// assert!(function.is_ok());
/// ```
#[derive(Default)]
pub struct WindowFunctionRegistry {
    functions: HashMap<String, Vec<(FunctionSignature, WindowFunctionFactory)>>,
}

impl WindowFunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { functions: HashMap::new() }
    }

    /// Creates a registry holding the built-in functions.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_builtins(&mut registry);
        registry
    }

    /// Registers a signature.
    ///
    /// A signature equal to an existing one replaces its factory.
    pub fn register(&mut self, signature: FunctionSignature, factory: WindowFunctionFactory) {
        let entries = self.functions.entry(signature.name.clone()).or_default();
        if let Some(entry) = entries.iter_mut().find(|(existing, _)| *existing == signature) {
            entry.1 = factory;
        } else {
            entries.push((signature, factory));
        }
    }

    /// Returns true if any signature is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_lowercase())
    }

    /// Returns the signatures registered under `name`.
    #[must_use]
    pub fn signatures(&self, name: &str) -> Vec<&FunctionSignature> {
        self.functions
            .get(&name.to_lowercase())
            .map(|entries| entries.iter().map(|(sig, _)| sig).collect())
            .unwrap_or_default()
    }

    /// Returns the number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Lists the registered names.
    #[must_use]
    pub fn list_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves the return type of `name` called with arguments of `types`.
    pub fn resolve_type(&self, name: &str, types: &[DataType]) -> WindowResult<DataType> {
        let (signature, _) = self.lookup(name, types)?;
        signature.resolve_return_type(types).ok_or_else(|| {
            WindowError::InvalidState(format!("unresolved return type of {signature}"))
        })
    }

    /// Creates an instance of `name` for one call.
    ///
    /// `result_type` must equal the return type the matching signature
    /// resolves to.
    pub fn create(
        &self,
        name: &str,
        args: &[WindowFunctionArg],
        result_type: DataType,
        ignore_nulls: bool,
        config: &WindowConfig,
    ) -> WindowResult<Box<dyn WindowFunction>> {
        let types: Vec<DataType> = args.iter().map(WindowFunctionArg::data_type).collect();
        let (signature, factory) = self.lookup(name, &types)?;
        if let Some(resolved) = signature.resolve_return_type(&types) {
            if resolved != result_type {
                return Err(WindowError::InvalidArgument {
                    function: signature.name.clone(),
                    reason: format!("result type {result_type} does not match {resolved}"),
                });
            }
        }
        debug!(function = %signature, ignore_nulls, "creating window function");
        factory(&WindowFunctionContext { name, args, result_type, ignore_nulls, config })
    }

    fn lookup(
        &self,
        name: &str,
        types: &[DataType],
    ) -> WindowResult<&(FunctionSignature, WindowFunctionFactory)> {
        let key = name.to_lowercase();
        let entries =
            self.functions.get(&key).ok_or_else(|| WindowError::UnknownFunction(name.to_string()))?;
        entries.iter().find(|(sig, _)| sig.matches(types)).ok_or_else(|| {
            let candidates: Vec<String> = entries.iter().map(|(sig, _)| sig.to_string()).collect();
            WindowError::NoMatchingSignature {
                name: key.clone(),
                attempted: format_call(&key, types),
                candidates: candidates.join(", "),
            }
        })
    }
}

impl std::fmt::Debug for WindowFunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowFunctionRegistry").field("functions", &self.list_names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::signature::{ArgumentType, ReturnType};

    #[test]
    fn builtins_are_registered() {
        let registry = WindowFunctionRegistry::with_builtins();
        for name in ["row_number", "rank", "dense_rank", "count", "sum", "min", "max"] {
            assert!(registry.contains(name), "{name}");
        }
        assert!(registry.contains("First_Value"));
        assert!(!registry.is_empty());
    }

    #[test]
    fn unknown_function() {
        let registry = WindowFunctionRegistry::with_builtins();
        let err = registry
            .create("lag", &[], DataType::BigInt, false, &WindowConfig::default())
            .expect_err("not registered");
        assert!(matches!(err, WindowError::UnknownFunction(ref name) if name == "lag"));
    }

    #[test]
    fn no_matching_signature_lists_candidates() {
        let registry = WindowFunctionRegistry::with_builtins();
        let args = [WindowFunctionArg::column(DataType::Varchar, 0)];
        let err = registry
            .create("SUM", &args, DataType::Varchar, false, &WindowConfig::default())
            .expect_err("no varchar sum");
        match err {
            WindowError::NoMatchingSignature { attempted, candidates, .. } => {
                assert_eq!(attempted, "sum(VARCHAR)");
                assert!(candidates.contains("sum(BIGINT)"));
                assert!(candidates.contains("sum(DOUBLE)"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn result_type_must_match_signature() {
        let registry = WindowFunctionRegistry::with_builtins();
        let err = registry
            .create("row_number", &[], DataType::Double, false, &WindowConfig::default())
            .expect_err("wrong result type");
        assert!(matches!(err, WindowError::InvalidArgument { .. }));
        assert_eq!(registry.resolve_type("row_number", &[]).ok(), Some(DataType::BigInt));
    }

    #[test]
    fn register_replaces_equal_signature() {
        fn factory(ctx: &WindowFunctionContext<'_>) -> WindowResult<Box<dyn WindowFunction>> {
            Err(WindowError::Unsupported(ctx.name.to_string()))
        }

        let mut registry = WindowFunctionRegistry::new();
        let sig = FunctionSignature::new("custom", ReturnType::Fixed(DataType::BigInt))
            .with_argument(ArgumentType::Any);
        registry.register(sig.clone(), factory);
        registry.register(sig, factory);
        assert_eq!(registry.signatures("CUSTOM").len(), 1);
        assert_eq!(registry.list_names(), vec!["custom"]);

        let args = [WindowFunctionArg::column(DataType::Boolean, 0)];
        let err = registry
            .create("custom", &args, DataType::BigInt, false, &WindowConfig::default())
            .expect_err("factory fails");
        assert!(matches!(err, WindowError::Unsupported(_)));
    }
}
