use crate::runtime::{error::RuntimeError, value::Value};

/// Lexically scoped variable bindings for one call frame.
///
/// Scopes keep insertion order so the entry-point frame can be snapshotted
/// deterministically after execution. Re-declaring a name in the same scope
/// replaces the binding in place.
#[derive(Clone, Default)]
pub struct Environment {
    scopes: Vec<Vec<(String, Value)>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![Vec::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
        if self.scopes.is_empty() {
            self.scopes.push(Vec::new());
        }
    }

    pub fn declare(&mut self, name: &str, value: Value) {
        let scope = self.scopes.last_mut().expect("environment has a scope");
        match scope.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = value,
            None => scope.push((name.to_string(), value)),
        }
    }

    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(entry) = scope.iter_mut().find(|(existing, _)| existing == name) {
                entry.1 = value;
                return Ok(());
            }
        }
        Err(RuntimeError::UnknownSymbol {
            name: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        for scope in self.scopes.iter().rev() {
            if let Some((_, value)) = scope.iter().find(|(existing, _)| existing == name) {
                return Ok(value.clone());
            }
        }
        Err(RuntimeError::UnknownSymbol {
            name: name.to_string(),
        })
    }

    /// Snapshot of the outermost scope, in declaration order.
    pub fn root_bindings(&self) -> Vec<(String, Value)> {
        self.scopes.first().cloned().unwrap_or_default()
    }
}
