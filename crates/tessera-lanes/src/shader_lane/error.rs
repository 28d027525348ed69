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

use thiserror::Error;

/// Reasons a material definition is rejected.
///
/// Every variant makes the caller substitute default content for the
/// material. The fatal ones additionally indicate a corrupt asset rather
/// than a typo, see [`ShaderError::is_fatal`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    /// The definition does not start with `{`.
    #[error("expecting '{{', found '{found}' instead in shader '{material}'")]
    MissingOpenBrace {
        /// Material name.
        material: String,
        /// The token found instead.
        found: String,
    },
    /// The text ended inside the material block.
    #[error("no concluding '}}' in shader '{material}'")]
    UnterminatedMaterial {
        /// Material name.
        material: String,
    },
    /// The text ended inside a stage block.
    #[error("no matching '}}' found in a stage of shader '{material}'")]
    UnterminatedStage {
        /// Material name.
        material: String,
    },
    /// A stage keyword was not recognised.
    #[error("unknown parameter '{keyword}' in shader '{material}'")]
    UnknownStageKeyword {
        /// Material name.
        material: String,
        /// The offending keyword.
        keyword: String,
    },
    /// A material keyword was not recognised.
    #[error("unknown general shader parameter '{keyword}' in '{material}'")]
    UnknownMaterialKeyword {
        /// Material name.
        material: String,
        /// The offending keyword.
        keyword: String,
    },
    /// A required image keyword had no argument or named a missing image.
    #[error("could not find image '{image}' in shader '{material}'")]
    ImageNotFound {
        /// Material name.
        material: String,
        /// The image that could not be resolved, empty when missing.
        image: String,
    },
    /// The block has no stage and is neither a sky nor a fog volume.
    #[error("shader '{material}' has no stages")]
    NoStages {
        /// Material name.
        material: String,
    },
    /// `fogParms` had a malformed colour vector.
    #[error("malformed fogParms in shader '{material}'")]
    MalformedFogParms {
        /// Material name.
        material: String,
    },
    /// A stage requested more texture coordinate modifiers than it can hold.
    #[error("too many tcMod stages in shader '{material}'")]
    TooManyTexMods {
        /// Material name.
        material: String,
    },
    /// The block has more stages than a material can hold.
    #[error("too many stages in shader '{material}'")]
    TooManyStages {
        /// Material name.
        material: String,
    },
}

impl ShaderError {
    /// Whether the error stems from exceeding a fixed per-material capacity.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShaderError::TooManyTexMods { .. } | ShaderError::TooManyStages { .. }
        )
    }

    /// Name of the material the error belongs to.
    pub fn material(&self) -> &str {
        match self {
            ShaderError::MissingOpenBrace { material, .. }
            | ShaderError::UnterminatedMaterial { material }
            | ShaderError::UnterminatedStage { material }
            | ShaderError::UnknownStageKeyword { material, .. }
            | ShaderError::UnknownMaterialKeyword { material, .. }
            | ShaderError::ImageNotFound { material, .. }
            | ShaderError::NoStages { material }
            | ShaderError::MalformedFogParms { material }
            | ShaderError::TooManyTexMods { material }
            | ShaderError::TooManyStages { material } => material,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_class() {
        let fatal = ShaderError::TooManyStages {
            material: "a".to_string(),
        };
        let soft = ShaderError::NoStages {
            material: "a".to_string(),
        };
        assert!(fatal.is_fatal());
        assert!(!soft.is_fatal());
        assert_eq!(soft.material(), "a");
    }

    #[test]
    fn test_messages_escape_braces() {
        let err = ShaderError::MissingOpenBrace {
            material: "m".to_string(),
            found: "x".to_string(),
        };
        assert_eq!(err.to_string(), "expecting '{', found 'x' instead in shader 'm'");
    }
}
