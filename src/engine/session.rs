use crate::language::types::Type;

#[derive(Clone, Debug, PartialEq)]
pub struct ImportEntry {
    pub path: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeclEntry {
    pub name: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableEntry {
    pub name: String,
    pub ty: Type,
    /// Source literal for the variable's current value, ready to embed in a
    /// re-declaration.
    pub value: String,
}

/// Accumulated declarations of one REPL session.
///
/// All four collections keep insertion order; re-inserting an existing key
/// overwrites the entry in place so synthesized programs stay stable between
/// turns. Only the reconciler mutates this, and only after a turn has fully
/// succeeded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    imports: Vec<ImportEntry>,
    module_decls: Vec<DeclEntry>,
    variables: Vec<VariableEntry>,
    statements: Vec<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn imports(&self) -> &[ImportEntry] {
        &self.imports
    }

    pub fn module_decls(&self) -> &[DeclEntry] {
        &self.module_decls
    }

    pub fn variables(&self) -> &[VariableEntry] {
        &self.variables
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn has_import(&self, path: &str) -> bool {
        self.imports.iter().any(|entry| entry.path == path)
    }

    /// Records an import; re-inserting the same path is a no-op.
    pub fn insert_import(&mut self, path: impl Into<String>, text: impl Into<String>) {
        let path = path.into();
        if !self.has_import(&path) {
            self.imports.push(ImportEntry {
                path,
                text: text.into(),
            });
        }
    }

    /// Records a module-level declaration; redeclaring a name replaces the
    /// previous definition without moving it.
    pub fn insert_module_decl(&mut self, name: impl Into<String>, text: impl Into<String>) {
        let name = name.into();
        let text = text.into();
        match self
            .module_decls
            .iter_mut()
            .find(|entry| entry.name == name)
        {
            Some(entry) => entry.text = text,
            None => self.module_decls.push(DeclEntry { name, text }),
        }
    }

    /// Records a variable binding; redeclaring keeps the original position and
    /// updates the type and value.
    pub fn insert_variable(&mut self, name: impl Into<String>, ty: Type, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.variables.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.ty = ty;
                entry.value = value;
            }
            None => self.variables.push(VariableEntry { name, ty, value }),
        }
    }

    pub fn push_statement(&mut self, text: impl Into<String>) {
        self.statements.push(text.into());
    }
}
