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

//! The per-frame render command list.
//!
//! The front end appends typed records; the back end walks them in order
//! until [`RenderCommand::EndOfList`]. Records never move once written, so
//! the sort-index fixup can patch already queued draw surfaces in place.

use super::sort_key::DrawSurfaceKey;
use super::DrawVertex;
use crate::material::ShaderHandle;
use crate::scene::RefDef;
use std::sync::Arc;

/// Opcode of a render command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RenderCommandKind {
    /// Terminates the list.
    EndOfList = 0,
    /// Sets the 2D drawing colour.
    SetColor,
    /// Draws a screen-space quad.
    StretchPic,
    /// Renders one view's sorted surfaces.
    DrawSurfaces,
    /// Selects the draw buffer.
    DrawBuffer,
    /// Presents the frame.
    SwapBuffers,
    /// Captures the frame buffer.
    Screenshot,
}

/// A screen-space textured quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchPicCommand {
    /// Material to draw with.
    pub shader: ShaderHandle,
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
    /// Left texture coordinate.
    pub s1: f32,
    /// Top texture coordinate.
    pub t1: f32,
    /// Right texture coordinate.
    pub s2: f32,
    /// Bottom texture coordinate.
    pub t2: f32,
}

/// Pre-built indexed geometry, typically a world or model surface.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangleSurface {
    /// Vertexes.
    pub vertices: Vec<DrawVertex>,
    /// Triangle list indexes into `vertices`.
    pub indexes: Vec<u32>,
}

/// The geometry behind a draw surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceRef {
    /// A scene polygon, by index into the view's [`RefDef::polys`].
    Poly(usize),
    /// Shared indexed geometry.
    Triangles(Arc<TriangleSurface>),
    /// Contributes nothing to the batch.
    Skip,
}

/// A surface decorated with its sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawSurface {
    /// Packed sort key.
    pub key: DrawSurfaceKey,
    /// Geometry.
    pub surface: SurfaceRef,
}

/// One view's scene snapshot together with its sorted surfaces.
#[derive(Debug, Clone)]
pub struct DrawSurfacesCommand {
    /// The view and scene contents the surfaces refer to.
    pub refdef: Arc<RefDef>,
    /// Surfaces sorted ascending by key.
    pub surfaces: Vec<DrawSurface>,
}

/// Which colour buffer subsequent drawing targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawBufferTarget {
    /// The back buffer.
    #[default]
    Back,
    /// The front buffer.
    Front,
}

/// A single typed render command.
#[derive(Debug, Clone)]
pub enum RenderCommand {
    /// Sets the 2D colour used by following `StretchPic` commands.
    SetColor([f32; 4]),
    /// Draws a screen-space quad.
    StretchPic(StretchPicCommand),
    /// Renders one view.
    DrawSurfaces(DrawSurfacesCommand),
    /// Selects the draw buffer.
    DrawBuffer(DrawBufferTarget),
    /// Presents the frame.
    SwapBuffers,
    /// Captures a region of the frame buffer.
    Screenshot {
        /// Left edge.
        x: i32,
        /// Top edge.
        y: i32,
        /// Width.
        width: i32,
        /// Height.
        height: i32,
        /// Destination file name.
        file_name: String,
    },
    /// Terminates the list.
    EndOfList,
}

impl RenderCommand {
    /// The opcode of this command.
    pub fn kind(&self) -> RenderCommandKind {
        match self {
            RenderCommand::SetColor(_) => RenderCommandKind::SetColor,
            RenderCommand::StretchPic(_) => RenderCommandKind::StretchPic,
            RenderCommand::DrawSurfaces(_) => RenderCommandKind::DrawSurfaces,
            RenderCommand::DrawBuffer(_) => RenderCommandKind::DrawBuffer,
            RenderCommand::SwapBuffers => RenderCommandKind::SwapBuffers,
            RenderCommand::Screenshot { .. } => RenderCommandKind::Screenshot,
            RenderCommand::EndOfList => RenderCommandKind::EndOfList,
        }
    }
}

/// An append-only list of render commands with a per-frame capacity.
#[derive(Debug, Clone)]
pub struct RenderCommandList {
    commands: Vec<RenderCommand>,
    capacity: usize,
}

impl RenderCommandList {
    /// Creates an empty list that accepts at most `capacity` commands plus
    /// the end marker.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity.min(4096) + 1),
            capacity,
        }
    }

    /// Appends a command.
    ///
    /// Returns `false` and drops the command when the list is full or
    /// already terminated.
    pub fn push(&mut self, command: RenderCommand) -> bool {
        if matches!(command, RenderCommand::EndOfList) {
            self.finish();
            return true;
        }
        if self.is_finished() {
            log::warn!("Render command {:?} added after the end of the list", command.kind());
            return false;
        }
        if self.commands.len() >= self.capacity {
            log::warn!(
                "Render command list is full ({} commands), dropping {:?}",
                self.capacity,
                command.kind()
            );
            return false;
        }
        self.commands.push(command);
        true
    }

    /// Terminates the list. The end marker always fits and is only added once.
    pub fn finish(&mut self) {
        if !self.is_finished() {
            self.commands.push(RenderCommand::EndOfList);
        }
    }

    /// Whether the end marker has been written.
    pub fn is_finished(&self) -> bool {
        matches!(self.commands.last(), Some(RenderCommand::EndOfList))
    }

    /// Empties the list for a new frame.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of records, end marker included.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no record has been written.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Maximum number of commands before further ones are dropped.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates the records up to, but excluding, the end marker.
    pub fn iter(&self) -> impl Iterator<Item = &RenderCommand> {
        self.commands
            .iter()
            .take_while(|command| !matches!(command, RenderCommand::EndOfList))
    }

    /// Shifts sort indexes after a material was inserted into the sorted table.
    ///
    /// Every queued draw surface whose sorted index is at or above
    /// `insertion_point` is moved up by one; entity, fog and dynamic light
    /// fields are preserved. Returns the number of patched surfaces.
    pub fn patch_sort_indices(&mut self, insertion_point: usize) -> usize {
        let mut patched = 0;
        for command in self.commands.iter_mut() {
            match command {
                RenderCommand::EndOfList => break,
                RenderCommand::DrawSurfaces(draw) => {
                    for surface in draw.surfaces.iter_mut() {
                        let sorted_index = surface.key.sorted_index();
                        if sorted_index >= insertion_point {
                            surface.key = surface.key.with_sorted_index(sorted_index + 1);
                            patched += 1;
                        }
                    }
                }
                _ => {}
            }
        }
        patched
    }
}

impl Default for RenderCommandList {
    fn default() -> Self {
        Self::with_capacity(1024)
    }
}
