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

//! The render lane: hot path from a finished command list to backend calls.
//!
//! The lane never talks to a graphics API directly. Everything goes through
//! [`GraphicsBackend`], filtered by a [`StateCache`] so that only real state
//! changes reach it.
//!
//! [`GraphicsBackend`]: tessera_core::renderer::GraphicsBackend

mod batch;
mod dispatcher;
mod generators;
mod state_cache;
mod tessellator;

#[cfg(test)]
pub(crate) mod testing;

pub use self::batch::{BatchStats, SurfaceBatcher, SKY_BOX_STAGE};
pub use self::dispatcher::{CommandDispatcher, FrameStats, METRICS_NAMESPACE};
pub use self::generators::{eval_waveform, stage_color};
pub use self::state_cache::{StateCache, MAX_TEXTURE_UNITS};
pub use self::tessellator::Tessellator;
