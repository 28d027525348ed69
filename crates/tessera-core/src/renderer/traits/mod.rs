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

//! Defines the collaborator interfaces the renderer consumes.
//!
//! These traits decouple the material pipeline and the back end from any
//! concrete image loader or graphics API.
//!
//! - [`ImageProvider`]: finds or loads images and exposes their pixels.
//! - [`AtlasRegistry`]: stores combined images in a shared texture atlas.
//! - [`GraphicsBackend`]: executes state changes and indexed draws.

mod atlas_registry;
mod graphics_backend;
mod image_provider;

pub use self::atlas_registry::AtlasRegistry;
pub use self::graphics_backend::{GraphicsBackend, IndexedDraw};
pub use self::image_provider::ImageProvider;
