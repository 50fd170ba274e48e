//! The link descriptor: everything the compiler and linker need for one
//! extension target.
//!
//! Every field behaves as an ordered set. Order is first occurrence, since
//! some linkers resolve symbols in command-line order.

use std::collections::HashSet;
use std::hash::Hash;
use std::path::PathBuf;

use serde::Serialize;

/// A preprocessor macro: name plus optional value.
pub type Macro = (String, Option<String>);

/// Libraries, include paths, library paths and macros for one extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkDescriptor {
    pub libraries: Vec<String>,
    pub include_dirs: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
    pub macros: Vec<Macro>,
}

impl LinkDescriptor {
    /// Create an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append libraries, skipping any already present.
    pub fn append_libraries<I, S>(&mut self, libs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.libraries, libs.into_iter().map(Into::into));
    }

    /// Append include directories, skipping any already present.
    pub fn append_include_dirs<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        extend_unique(&mut self.include_dirs, dirs.into_iter().map(Into::into));
    }

    /// Insert library directories ahead of the existing ones.
    ///
    /// The new directories keep their relative order. Entries already
    /// present anywhere in the list are skipped, so an existing directory is
    /// never moved.
    pub fn prepend_library_dirs<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut seen: HashSet<PathBuf> = self.library_dirs.iter().cloned().collect();
        let mut front: Vec<PathBuf> = dirs
            .into_iter()
            .map(Into::into)
            .filter(|dir| seen.insert(dir.clone()))
            .collect();
        front.append(&mut self.library_dirs);
        self.library_dirs = front;
    }

    /// Append library directories, skipping any already present.
    pub fn append_library_dirs<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        extend_unique(&mut self.library_dirs, dirs.into_iter().map(Into::into));
    }

    /// Append macros, skipping exact duplicates.
    pub fn append_macros<I>(&mut self, macros: I)
    where
        I: IntoIterator<Item = Macro>,
    {
        extend_unique(&mut self.macros, macros);
    }

    /// Re-deduplicate libraries and include directories in place.
    pub fn dedup(&mut self) {
        dedup_preserving_order(&mut self.libraries);
        dedup_preserving_order(&mut self.include_dirs);
    }
}

/// Push each item not already in `list`.
pub fn extend_unique<T>(list: &mut Vec<T>, items: impl IntoIterator<Item = T>)
where
    T: Eq + Hash + Clone,
{
    let mut seen: HashSet<T> = list.iter().cloned().collect();
    for item in items {
        if seen.insert(item.clone()) {
            list.push(item);
        }
    }
}

/// Remove later duplicates, keeping the first occurrence of each item.
pub fn dedup_preserving_order<T>(list: &mut Vec<T>)
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::with_capacity(list.len());
    list.retain(|item| seen.insert(item.clone()));
}

/// Parse a `NAME` or `NAME=VALUE` definition.
pub fn parse_definition(def: &str) -> Macro {
    match def.split_once('=') {
        Some((name, value)) => (name.to_string(), Some(value.to_string())),
        None => (def.to_string(), None),
    }
}
