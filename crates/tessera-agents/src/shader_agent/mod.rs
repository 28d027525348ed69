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

//! Acts as the **[A]gent** for materials.
//!
//! The shader agent owns everything with a lifetime longer than one
//! compilation: the pre-scanned definition corpus, the interned materials,
//! their name index and the sort-ordered table the back end draws from. The
//! actual text-to-material work is delegated to the shader lane.

mod agent;
mod corpus;
mod names;

pub use agent::{BuiltinShaders, ShaderAgent};
pub use corpus::{ShaderCorpus, MAX_SHADER_FILES, SCRIPTS_DIR, SCRIPTS_SUFFIX};
pub use names::{canonical_name, name_hash, strip_extension, FILE_HASH_SIZE, MAX_SHADERTEXT_HASH};
