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

//! The pre-scanned material definition text.

use super::names::{name_hash, MAX_SHADERTEXT_HASH};
use anyhow::{Context, Result};
use tessera_core::vfs::TextResources;
use tessera_lanes::shader_lane::Tokenizer;

/// Directory scanned for definition files.
pub const SCRIPTS_DIR: &str = "scripts";

/// Extension of definition files.
pub const SCRIPTS_SUFFIX: &str = ".shader";

/// Maximum number of definition files loaded.
pub const MAX_SHADER_FILES: usize = 4096;

/// Every definition file concatenated, with a hash index of where each
/// definition starts.
#[derive(Debug)]
pub struct ShaderCorpus {
    text: String,
    buckets: Vec<Vec<usize>>,
    files: usize,
}

impl Default for ShaderCorpus {
    fn default() -> Self {
        Self::from_text(String::new())
    }
}

fn load_script(resources: &dyn TextResources, path: &str) -> Result<String> {
    let bytes = resources
        .load_text_resource(path)
        .with_context(|| format!("Couldn't load {path}"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl ShaderCorpus {
    /// Loads every definition file under [`SCRIPTS_DIR`].
    ///
    /// Files are concatenated in reverse enumeration order, each preceded by
    /// a newline. Unreadable files are logged and skipped.
    pub fn scan(resources: &dyn TextResources) -> Self {
        let mut names = resources.enumerate_resources(SCRIPTS_DIR, SCRIPTS_SUFFIX);
        if names.is_empty() {
            log::warn!("no shader files found");
        }
        if names.len() > MAX_SHADER_FILES {
            log::warn!(
                "{} shader files found, only the first {} are loaded",
                names.len(),
                MAX_SHADER_FILES
            );
            names.truncate(MAX_SHADER_FILES);
        }

        let mut loaded = Vec::with_capacity(names.len());
        for name in &names {
            let path = format!("{SCRIPTS_DIR}/{name}");
            log::debug!("...loading '{}'", path);
            match load_script(resources, &path) {
                Ok(text) => loaded.push(text),
                Err(e) => log::warn!("{e:#}"),
            }
        }

        let mut text = String::with_capacity(loaded.iter().map(|t| t.len() + 1).sum());
        for script in loaded.iter().rev() {
            text.push('\n');
            text.push_str(script);
        }

        let mut corpus = Self::from_text(text);
        corpus.files = loaded.len();
        log::info!("{} shader files loaded", corpus.files);
        corpus
    }

    /// Indexes already concatenated definition text.
    pub fn from_text(text: String) -> Self {
        let mut buckets = vec![Vec::new(); MAX_SHADERTEXT_HASH];
        let mut tokens = Tokenizer::new(&text);
        loop {
            let start = tokens.position();
            let name = tokens.next_token(true);
            if name.is_empty() {
                break;
            }
            buckets[name_hash(name, MAX_SHADERTEXT_HASH)].push(start);
            tokens.skip_braced_section();
        }
        Self {
            text,
            buckets,
            files: 0,
        }
    }

    /// The concatenated text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of files that went into the corpus.
    pub fn file_count(&self) -> usize {
        self.files
    }

    /// Finds the definition of `name`, ignoring case.
    ///
    /// Returns the offset just past the name token, ready for the compiler.
    pub fn find(&self, name: &str) -> Option<usize> {
        let bucket = &self.buckets[name_hash(name, MAX_SHADERTEXT_HASH)];
        for &start in bucket {
            let mut tokens = Tokenizer::at(&self.text, start);
            if tokens.next_token(true).eq_ignore_ascii_case(name) {
                return Some(tokens.position());
            }
        }

        // Definitions the index could not delimit are still found by a walk.
        let mut tokens = Tokenizer::new(&self.text);
        loop {
            let token = tokens.next_token(true);
            if token.is_empty() {
                return None;
            }
            if token.eq_ignore_ascii_case(name) {
                return Some(tokens.position());
            }
            tokens.skip_braced_section();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::vfs::MemoryTextResources;

    #[test]
    fn test_find_positions_after_the_name() {
        let corpus = ShaderCorpus::from_text("a/one\n{\n}\nB/Two { { map x } }\n".to_string());

        let pos = corpus.find("b/two").unwrap();

        let mut tokens = Tokenizer::at(corpus.text(), pos);
        assert_eq!(tokens.next_token(true), "{");
        assert!(corpus.find("a/one").is_some());
        assert!(corpus.find("missing").is_none());
    }

    #[test]
    fn test_scan_concatenates_in_reverse_order() {
        let resources = MemoryTextResources::new()
            .with_file("scripts/a.shader", "first { }")
            .with_file("scripts/b.shader", "second { }")
            .with_file("scripts/notes.txt", "ignored { }");

        let corpus = ShaderCorpus::scan(&resources);

        assert_eq!(corpus.file_count(), 2);
        let first = corpus.text().find("first").unwrap();
        let second = corpus.text().find("second").unwrap();
        assert!(second < first);
        assert!(!corpus.text().contains("ignored"));
    }
}
