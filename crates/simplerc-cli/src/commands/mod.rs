//! CLI subcommands.

pub mod demo;
pub mod inspect;
pub mod load;
pub mod seed;

use serde::Serialize;

use simplerc::{Resource, Value};

/// A resource as shown in command output.
#[derive(Debug, Serialize)]
pub struct ResourceDisplay {
    pub name: String,
    pub value: Value,
    pub mutable: bool,
}

impl ResourceDisplay {
    pub fn new(name: &str, resource: Resource<Value>) -> Self {
        Self {
            name: name.to_string(),
            value: resource.value,
            mutable: resource.mutable,
        }
    }

    /// One-line human-readable rendering.
    pub fn line(&self) -> String {
        let flag = if self.mutable { "mutable" } else { "immutable" };
        format!("{} = {} ({})", self.name, self.value, flag)
    }
}
