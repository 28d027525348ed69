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

//! Error types shared across the renderer crates.

use std::fmt;

/// An error raised while accessing a text resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// No resource exists under the requested name.
    NotFound {
        /// The requested name.
        name: String,
    },
    /// The resource exists but could not be read.
    Io {
        /// The requested name.
        name: String,
        /// Description of the underlying failure.
        details: String,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound { name } => write!(f, "Resource not found: '{name}'"),
            ResourceError::Io { name, details } => {
                write!(f, "Failed to read resource '{name}': {details}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// An error raised while loading [`crate::RenderSettings`].
#[derive(Debug)]
pub enum SettingsError {
    /// The settings text is not valid JSON for the settings schema.
    Parse(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Parse(err) => write!(f, "Invalid render settings: {err}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Parse(err)
    }
}
