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

//! # Tessera Agents
//!
//! Orchestrators driving the lanes.
//!
//! - [`shader_agent`]: material registry over the definition corpus.
//! - [`render_agent`]: the front end building command lists and handing them
//!   to the back end, inline or on a render thread.

#![warn(missing_docs)]

pub mod render_agent;
pub mod shader_agent;

#[cfg(test)]
pub(crate) mod testing;

pub use render_agent::RenderAgent;
pub use shader_agent::ShaderAgent;
