//! Checks for the attributes that steer the pipeline.
//!
//! Each check runs where the attribute is used, and a failure names the
//! attribute, the expected type and the item's relative path.

use crate::error::BuildError;
use crate::item::Item;
use serde_json::Value;

/// Optional boolean attribute.
pub(super) fn bool_attribute(item: &Item, name: &'static str) -> Result<Option<bool>, BuildError> {
    match item.attributes().get(name) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(BuildError::attribute(name, "a boolean", item.relative_path())),
    }
}

/// `layout`: absent, or a non-empty string.
pub(super) fn layout(item: &Item) -> Result<Option<String>, BuildError> {
    match item.attributes().get("layout") {
        None => Ok(None),
        Some(Value::String(layout)) if !layout.is_empty() => Ok(Some(layout.clone())),
        Some(_) => Err(BuildError::attribute(
            "layout",
            "a non-empty string",
            item.relative_path(),
        )),
    }
}

/// `generator`: the generator name, which must be a string.
pub(super) fn generator(item: &Item) -> Result<String, BuildError> {
    match item.attributes().get("generator") {
        Some(Value::String(name)) => Ok(name.clone()),
        _ => Err(BuildError::attribute(
            "generator",
            "a string",
            item.relative_path(),
        )),
    }
}
