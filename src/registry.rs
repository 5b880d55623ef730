//! Operation registry: maps inbound (method, path) to a named upstream operation.
//!
//! Path templates are `/`-separated; a `{name}` segment matches exactly one
//! non-empty segment. Nothing outside the registry is ever forwarded.

use axum::http::Method;

/// One addressable upstream capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSpec {
    pub name: String,
    pub method: Method,
    pub path: String,
}

impl OperationSpec {
    pub fn new(name: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into().trim_matches('/').to_string(),
        }
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        if &self.method != method {
            return false;
        }

        let mut template = self.path.split('/');
        let mut actual = path.split('/');
        loop {
            match (template.next(), actual.next()) {
                (None, None) => return true,
                (Some(t), Some(a)) => {
                    if a.is_empty() || a == "." || a == ".." {
                        return false;
                    }
                    let is_param = t.starts_with('{') && t.ends_with('}');
                    if !is_param && t != a {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

/// An inbound request resolved against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOperation {
    /// Registry name, used for the policy lookup
    pub name: String,
    /// Concrete path forwarded upstream (no leading slash)
    pub path: String,
}

/// Immutable operation table.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    operations: Vec<OperationSpec>,
}

impl OperationRegistry {
    pub fn new(operations: Vec<OperationSpec>) -> Self {
        Self { operations }
    }

    /// Operations exposed by the trading service.
    pub fn trading_defaults() -> Self {
        Self::new(vec![
            OperationSpec::new("generate-signals", Method::POST, "generate-signals"),
            OperationSpec::new("market-analysis", Method::POST, "market-analysis"),
            OperationSpec::new(
                "portfolio-optimization",
                Method::POST,
                "portfolio-optimization",
            ),
            OperationSpec::new("execute-trade", Method::POST, "execute-trade"),
            OperationSpec::new("get-portfolio", Method::GET, "portfolio/{userId}"),
        ])
    }

    /// Resolve `path` (relative to the gateway prefix). `None` means unmapped.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ResolvedOperation> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return None;
        }
        self.operations
            .iter()
            .find(|op| op.matches(method, path))
            .map(|op| ResolvedOperation {
                name: op.name.clone(),
                path: path.to_string(),
            })
    }

    pub fn operations(&self) -> &[OperationSpec] {
        &self.operations
    }
}
