// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Renderers turn an archived data product into a row of its entry's table.
//!
//! Renderers may write sub-products (thumbnails, previews) under
//! [`DataProduct::subproduct_dir`]; they must regenerate anything older than
//! the `refresh` timestamp they are given.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::html::{escape, quote_url};
use crate::product::DataProduct;

pub const LINK_RENDERER: &str = "link";

pub trait Renderer: Send + Sync {
    /// Name stored in the entry index as the product's render hint
    fn name(&self) -> &str;

    /// Epoch seconds of the renderer's last change. Index caches older than
    /// the newest renderer are regenerated.
    fn stamp(&self) -> f64 {
        0.0
    }

    /// HTML for one table row. `relpath` is prepended to links when the row
    /// is included in the top-level index.
    fn render_row(&self, dp: &DataProduct, relpath: &str, refresh: f64) -> String;
}

/// Links to the archived file and shows the product's comment
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkRenderer;

impl Renderer for LinkRenderer {
    fn name(&self) -> &str {
        LINK_RENDERER
    }

    fn render_row(&self, dp: &DataProduct, relpath: &str, _refresh: f64) -> String {
        let href = quote_url(&format!("{relpath}{}", dp.filename));
        format!(
            "          <TR><TD><A HREF=\"{href}\">{}</A></TD><TD>{}</TD></TR>\n",
            escape(&dp.filename),
            escape(&dp.comment)
        )
    }
}

/// Renderers by name, with a fallback for unknown or missing hints
#[derive(Clone)]
pub struct RendererRegistry {
    renderers: BTreeMap<String, Arc<dyn Renderer>>,
    fallback: Arc<dyn Renderer>,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        let fallback: Arc<dyn Renderer> = Arc::new(LinkRenderer);
        let mut renderers = BTreeMap::new();
        renderers.insert(LINK_RENDERER.to_string(), Arc::clone(&fallback));
        Self { renderers, fallback }
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("renderers", &self.renderers.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl RendererRegistry {
    /// Registry holding only the built-in link renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a renderer under its own name
    pub fn register(&mut self, renderer: Arc<dyn Renderer>) {
        tracing::debug!(name = renderer.name(), "registered renderer");
        self.renderers.insert(renderer.name().to_string(), renderer);
    }

    /// Renderer for a product's render hint, falling back to the link renderer
    pub fn get(&self, hint: Option<&str>) -> &dyn Renderer {
        hint.and_then(|name| self.renderers.get(name))
            .map(|r| r.as_ref())
            .unwrap_or_else(|| self.fallback.as_ref())
    }

    /// Stamp of the most recently changed renderer
    pub fn youngest(&self) -> f64 {
        self.renderers.values().map(|r| r.stamp()).fold(0.0, f64::max)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.renderers.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
