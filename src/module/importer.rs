//! The `Importer` interface (spec §6): the only way the core reaches
//! outside itself for source text. Filesystem/`SASS_PATH` lookup, the
//! partial/`_index` search order, and everything else I/O-shaped lives
//! with the embedder; the core only ever calls these two methods.

/// A stylesheet as handed back by [`Importer::load`].
#[derive(Debug, Clone)]
pub struct LoadedStylesheet {
    pub contents: String,
    pub syntax: crate::parser::Syntax,
    pub source_map_url: Option<String>,
}

/// Resolves `@use`/`@forward`/`@import` URLs to canonical form and loads
/// their contents. One compile may chain several importers; the module
/// resolver tries each in order and uses the first non-`None` result.
pub trait Importer {
    /// Normalizes `url` (resolved relative to `from_import`, the
    /// enclosing stylesheet's own URL when known) to this importer's
    /// canonical form, or `None` if it doesn't recognize the URL.
    fn canonicalize(&self, url: &str, from_import: Option<&str>) -> Option<String>;

    /// Loads the contents behind an already-canonicalized URL.
    fn load(&self, canonical_url: &str) -> Option<LoadedStylesheet>;
}

/// An importer with no entries, the default when a compile supplies none
/// of its own — every `@use`/`@import` then fails to resolve, which is
/// correct for `compileString` calls that don't register one.
pub struct NullImporter;

impl Importer for NullImporter {
    fn canonicalize(&self, _url: &str, _from_import: Option<&str>) -> Option<String> {
        None
    }

    fn load(&self, _canonical_url: &str) -> Option<LoadedStylesheet> {
        None
    }
}

/// An in-memory importer useful for embedding and for tests: URLs map
/// directly to pre-supplied source strings, with no filesystem lookup
/// order applied.
pub struct MapImporter {
    entries: std::collections::HashMap<String, (String, crate::parser::Syntax)>,
}

impl MapImporter {
    pub fn new() -> Self {
        Self { entries: std::collections::HashMap::new() }
    }

    pub fn insert(&mut self, url: impl Into<String>, contents: impl Into<String>, syntax: crate::parser::Syntax) {
        self.entries.insert(url.into(), (contents.into(), syntax));
    }
}

impl Default for MapImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Importer for MapImporter {
    fn canonicalize(&self, url: &str, _from_import: Option<&str>) -> Option<String> {
        if self.entries.contains_key(url) {
            Some(url.to_string())
        } else {
            None
        }
    }

    fn load(&self, canonical_url: &str) -> Option<LoadedStylesheet> {
        self.entries.get(canonical_url).map(|(contents, syntax)| LoadedStylesheet {
            contents: contents.clone(),
            syntax: *syntax,
            source_map_url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_null_importer_resolves_nothing() {
        let importer = NullImporter;
        assert!(importer.canonicalize("foo", None).is_none());
        assert!(importer.load("foo").is_none());
    }

    #[test]
    fn a_map_importer_only_canonicalizes_urls_it_was_given() {
        let mut importer = MapImporter::new();
        importer.insert("pkg:a", "a { b: c; }", crate::parser::Syntax::Scss);
        assert_eq!(importer.canonicalize("pkg:a", None), Some("pkg:a".to_string()));
        assert!(importer.canonicalize("pkg:missing", None).is_none());
    }

    #[test]
    fn a_map_importer_loads_the_contents_and_syntax_it_was_given() {
        let mut importer = MapImporter::new();
        importer.insert("pkg:a", "a\n  b: c", crate::parser::Syntax::Indented);
        let loaded = importer.load("pkg:a").expect("should load");
        assert_eq!(loaded.contents, "a\n  b: c");
        assert_eq!(loaded.syntax, crate::parser::Syntax::Indented);
        assert!(loaded.source_map_url.is_none());
    }
}
