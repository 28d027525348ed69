// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Text resource access for the material corpus scan.
//!
//! The renderer never touches the file system itself. It asks a
//! [`TextResources`] implementation to enumerate and load the material
//! definition files. [`MemoryTextResources`] is the in-memory store used by
//! tools and tests; it keeps an index from normalised path to contents for
//! O(1) lookups.

use crate::error::ResourceError;
use std::collections::HashMap;

/// Read access to named text resources.
pub trait TextResources {
    /// Loads the full contents of a resource.
    /// ## Errors
    /// [`ResourceError::NotFound`] if no resource has that name.
    fn load_text_resource(&self, name: &str) -> Result<Vec<u8>, ResourceError>;

    /// Lists the resources directly inside `dir` whose name ends with `suffix`.
    ///
    /// The returned names are relative to `dir`, in a stable order.
    fn enumerate_resources(&self, dir: &str, suffix: &str) -> Vec<String>;
}

/// An in-memory set of text resources keyed by path.
#[derive(Debug, Default, Clone)]
pub struct MemoryTextResources {
    /// Normalised path (forward slashes, no leading slash) to contents.
    files: HashMap<String, Vec<u8>>,
}

impl MemoryTextResources {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a resource.
    pub fn insert(&mut self, path: &str, contents: impl Into<Vec<u8>>) {
        self.files.insert(normalize(path), contents.into());
    }

    /// Builder-style variant of [`MemoryTextResources::insert`].
    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Number of stored resources.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl TextResources for MemoryTextResources {
    fn load_text_resource(&self, name: &str) -> Result<Vec<u8>, ResourceError> {
        self.files
            .get(&normalize(name))
            .cloned()
            .ok_or_else(|| ResourceError::NotFound {
                name: name.to_string(),
            })
    }

    fn enumerate_resources(&self, dir: &str, suffix: &str) -> Vec<String> {
        let prefix = format!("{}/", normalize(dir));
        let suffix = suffix.to_ascii_lowercase();
        let mut names: Vec<String> = self
            .files
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .filter(|rest| rest.to_ascii_lowercase().ends_with(&suffix))
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_filters_directory_and_suffix() {
        let store = MemoryTextResources::new()
            .with_file("scripts/b.shader", "b")
            .with_file("scripts/a.SHADER", "a")
            .with_file("scripts/readme.txt", "x")
            .with_file("scripts/nested/c.shader", "c")
            .with_file("other/d.shader", "d");

        let names = store.enumerate_resources("scripts", ".shader");

        assert_eq!(names, vec!["a.SHADER".to_string(), "b.shader".to_string()]);
    }

    #[test]
    fn test_load_normalizes_separators() {
        let store = MemoryTextResources::new().with_file("scripts\\base.shader", "text");
        assert_eq!(store.load_text_resource("/scripts/base.shader").unwrap(), b"text");
        assert!(matches!(
            store.load_text_resource("scripts/missing.shader"),
            Err(ResourceError::NotFound { .. })
        ));
    }
}
