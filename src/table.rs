//! Logical to physical table names.
//!
//! Queries are written against logical names (`"actions"`, `"actionTimes"`);
//! a [`TableProvider`] decides which physical table backs each one, so tests
//! can point the same query text at scratch tables.

use crate::error::Error;
use std::fmt;

pub const ACTIONS: &str = "actions";
pub const ACTION_TIMES: &str = "actionTimes";

/// A validated, fully-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: String,
    name: String,
}

impl TableName {
    pub fn new<S: Into<String>, N: Into<String>>(schema: S, name: N) -> Result<Self, Error> {
        let schema = schema.into();
        let name = name.into();
        validate_identifier(&schema)?;
        validate_identifier(&name)?;
        Ok(Self { schema, name })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quoted name without the schema, for foreign key targets and index
    /// `ON` clauses where SQLite rejects qualification.
    pub fn bare(&self) -> String {
        quote(&self.name)
    }

    /// Quoted `schema.prefix_table` name for an object that lives next to this table.
    pub fn sibling(&self, prefix: &str) -> Result<String, Error> {
        let name = format!("{}_{}", prefix, self.name);
        validate_identifier(&name)?;
        Ok(format!("{}.{}", quote(&self.schema), quote(&name)))
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", quote(&self.schema), quote(&self.name))
    }
}

/// Resolves a logical table name to the physical table to query.
pub trait TableProvider: Send + Sync {
    fn table(&self, logical: &str) -> Result<TableName, Error>;
}

/// Every logical table lives under one schema with its own name.
#[derive(Debug, Clone)]
pub struct SchemaTableProvider {
    schema: String,
}

impl SchemaTableProvider {
    pub fn new<S: Into<String>>(schema: S) -> Self {
        Self {
            schema: schema.into(),
        }
    }
}

impl TableProvider for SchemaTableProvider {
    fn table(&self, logical: &str) -> Result<TableName, Error> {
        TableName::new(self.schema.as_str(), logical)
    }
}

/// Gives every logical table a disposable, uniquely named physical table.
#[derive(Debug, Clone)]
pub struct ScratchTableProvider {
    schema: String,
    suffix: String,
}

impl ScratchTableProvider {
    pub fn new<S: Into<String>>(schema: S) -> Self {
        Self {
            schema: schema.into(),
            suffix: uuid::Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl TableProvider for ScratchTableProvider {
    fn table(&self, logical: &str) -> Result<TableName, Error> {
        TableName::new(self.schema.as_str(), format!("{}_{}", logical, self.suffix))
    }
}

pub(crate) fn validate_identifier(ident: &str) -> Result<(), Error> {
    let mut chars = ident.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(ident.to_string()))
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
