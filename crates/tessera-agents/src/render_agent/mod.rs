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

//! Acts as the **[A]gent** for the rendering subsystem.
//!
//! The render agent is the front end: it records scene snapshots, 2D draws
//! and frame boundaries into a command list, keeps recorded sort keys valid
//! while materials are registered mid-frame, and hands finished lists to the
//! back end. The back end is the render lane's dispatcher, run inline or on a
//! dedicated render thread with two command lists in flight.

mod agent;
mod worker;

pub use agent::RenderAgent;
pub use worker::{FrameDone, RenderWorker};
