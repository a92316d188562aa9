//! Content conversion.
//!
//! The pipeline talks to a single [`ItemConverter`]. The default one,
//! [`ConverterManager`], picks the first registered [`Converter`] that
//! accepts the item's extension and falls back to [`MirrorConverter`],
//! which passes content through untouched.
//!
//! Extensions always carry their leading dot (`.md`, `.html`). An item
//! without an extension reports the empty string.

use crate::item::{Item, PathSnapshot, Snapshot};
use crate::vvlog;
use anyhow::Result;
use std::path::Path;

/// Outcome of converting one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// Converted content.
    pub body: String,
    /// Extension of the produced content, e.g. `.html`.
    pub extension: String,
    /// Extension consumed from the item path, e.g. `.md`.
    pub input_extension: String,
}

/// Converter driver contract consumed by the pipeline.
pub trait ItemConverter {
    fn convert_item(&mut self, item: &Item) -> Result<ConversionResult>;
}

/// A single content transformation (markdown to html, ...).
pub trait Converter {
    fn name(&self) -> &str;

    /// Whether this converter handles files with `extension`.
    fn matches(&self, extension: &str) -> bool;

    fn convert(&mut self, input: &str) -> Result<String>;

    /// Extension of the converted output for an input `extension`.
    fn output_extension(&self, extension: &str) -> String;
}

/// Identity conversion, keeping the extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct MirrorConverter;

impl Converter for MirrorConverter {
    fn name(&self) -> &str {
        "mirror"
    }

    fn matches(&self, _extension: &str) -> bool {
        true
    }

    fn convert(&mut self, input: &str) -> Result<String> {
        Ok(input.to_owned())
    }

    fn output_extension(&self, extension: &str) -> String {
        extension.to_owned()
    }
}

/// Extension of `path` with a leading dot, or `""`.
pub fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Registry of converters, consulted in registration order.
#[derive(Default)]
pub struct ConverterManager {
    converters: Vec<Box<dyn Converter>>,
    mirror: MirrorConverter,
}

impl ConverterManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, converter: Box<dyn Converter>) {
        self.converters.push(converter);
    }

    pub fn with(mut self, converter: impl Converter + 'static) -> Self {
        self.add(Box::new(converter));
        self
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Convert raw `content` of a file with `extension`.
    pub fn convert_content(&mut self, content: &str, extension: &str) -> Result<ConversionResult> {
        let converter: &mut dyn Converter = match self
            .converters
            .iter_mut()
            .find(|c| c.matches(extension))
        {
            Some(converter) => converter.as_mut(),
            None => &mut self.mirror,
        };

        vvlog!("convert"; "{} ({})", converter.name(), if extension.is_empty() { "-" } else { extension });

        Ok(ConversionResult {
            body: converter.convert(content)?,
            extension: converter.output_extension(extension),
            input_extension: extension.to_owned(),
        })
    }
}

impl ItemConverter for ConverterManager {
    fn convert_item(&mut self, item: &Item) -> Result<ConversionResult> {
        let path = item.path(PathSnapshot::Relative).unwrap_or_default();
        let content = item.content_at(Snapshot::Raw).unwrap_or_default();
        self.convert_content(content, &extension_of(path))
    }
}
