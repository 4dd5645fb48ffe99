use callscope_common::CallSite;
use dashmap::DashMap;
use rustc_hash::FxHasher;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::Arc;

type SiteHasher = BuildHasherDefault<FxHasher>;

/// Registry of call-site descriptions
///
/// Maps each [`CallSite`] to one immutable [`Description`]. Safe to share
/// between profilers running on different threads: insertion is
/// insert-if-absent, so two threads racing on the same site observe the same
/// `Arc`.
#[derive(Default)]
pub struct DescriptionRegistry {
    entries: DashMap<CallSite, Arc<Description>, SiteHasher>,
}

impl DescriptionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Description for `site`, rendering and caching it on first use
    pub fn lookup_or_create(&self, site: CallSite) -> Arc<Description> {
        // Check cache first
        if let Some(cached) = self.entries.get(&site) {
            return Arc::clone(cached.value());
        }

        // Cache miss - the entry lock makes the render happen exactly once
        Arc::clone(self.entries.entry(site).or_insert_with(|| Arc::new(Description::of(site))).value())
    }

    /// Cached description for `site`, without creating one
    #[must_use]
    pub fn get(&self, site: &CallSite) -> Option<Arc<Description>> {
        self.entries.get(site).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of distinct call sites seen so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for DescriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptionRegistry").field("sites", &self.entries.len()).finish()
    }
}

/// Human-readable description of a call site
///
/// Immutable once created. Displays as the rendered text used in flamegraph
/// logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Description {
    source_location: Option<Box<str>>,
    symbol_name: Box<str>,
    text: Box<str>,
}

impl Description {
    /// Render the description of `site`
    #[must_use]
    pub fn of(site: CallSite) -> Self {
        let (source_location, symbol_name, text) = match site {
            CallSite::Source { file, line, symbol } => {
                let location = format!("{file}:{line}");
                let text = format!("{location}({symbol})");
                (Some(location), symbol, text)
            }
            CallSite::Unnamed { file, line } => {
                let location = format!("{file}:{line}");
                (Some(location.clone()), "", location)
            }
            CallSite::Unlocated { symbol } => (None, symbol, symbol.to_string()),
            CallSite::Native { module: Some(module), symbol } => {
                (None, symbol, format!("<{module}.{symbol}>"))
            }
            CallSite::Native { module: None, symbol } => (None, symbol, format!("<{symbol}>")),
            CallSite::Method { module: Some(module), symbol } => {
                (None, symbol, format!("<built-in method {module}.{symbol}>"))
            }
            CallSite::Method { module: None, symbol } => {
                (None, symbol, format!("<built-in method {symbol}>"))
            }
        };

        Self {
            source_location: source_location.map(String::into_boxed_str),
            symbol_name: symbol_name.into(),
            text: text.into_boxed_str(),
        }
    }

    /// `file:line` of the site, if it has one
    #[must_use]
    pub fn source_location(&self) -> Option<&str> {
        self.source_location.as_deref()
    }

    /// Function name; empty for a site without one
    #[must_use]
    pub fn symbol_name(&self) -> &str {
        &self.symbol_name
    }

    /// Rendered text, as written to flamegraph logs
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for Description {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
