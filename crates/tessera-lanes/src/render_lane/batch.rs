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

//! The draw-surface sort-and-batch loop.
//!
//! Surfaces arrive sorted by key. Consecutive surfaces that share a key are
//! appended to the open batch without touching graphics state. A new key
//! flushes the batch when the material, the fog volume or the dynamic light
//! bits change, or when the entity changes and the material does not allow
//! entities to share a batch. Flushing runs the material's stage pipeline,
//! chosen by its [`StageIterator`].

use super::generators::stage_color;
use super::state_cache::StateCache;
use super::tessellator::Tessellator;
use std::sync::Arc;
use tessera_core::{
    material::{Material, MaterialTable, Stage, StageIterator, StateBits},
    math::Vec3,
    renderer::{
        sort_key::ENTITYNUM_WORLD, DrawSurfacesCommand, GraphicsBackend, IndexedDraw,
        StretchPicCommand, SurfaceRef,
    },
    scene::{RefDef, RenderFx},
};

/// Stage index reported for the sky box face draws of a sky material.
pub const SKY_BOX_STAGE: usize = usize::MAX;

/// Orientation of world geometry.
const WORLD_AXIS: [Vec3; 3] = [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
];

/// Far depth used while a depth-hacked entity is drawn.
const DEPTH_HACK_FAR: f32 = 0.3;

/// Counters of one pass over a view's surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchStats {
    /// Surfaces visited.
    pub surfaces: usize,
    /// Batches opened.
    pub batches: usize,
}

#[derive(Debug)]
struct ActiveBatch {
    material: Arc<Material>,
    sorted_index: usize,
    fog: u32,
    dlight: u32,
}

/// Back-end batching state: the open batch, its geometry and the state cache.
#[derive(Debug)]
pub struct SurfaceBatcher {
    cache: StateCache,
    tess: Tessellator,
    active: Option<ActiveBatch>,
    shader_time: f32,
    entity_rgba: [u8; 4],
}

impl Default for SurfaceBatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Looks a material up by sorted index, following a remap.
fn resolve(materials: &MaterialTable, material: Option<&Arc<Material>>) -> Option<Arc<Material>> {
    let material = material?;
    match material.remapped {
        Some(target) => materials.get(target).cloned().or_else(|| Some(material.clone())),
        None => Some(material.clone()),
    }
}

impl SurfaceBatcher {
    /// Creates an idle batcher.
    pub fn new() -> Self {
        Self {
            cache: StateCache::new(),
            tess: Tessellator::new(),
            active: None,
            shader_time: 0.0,
            entity_rgba: [255; 4],
        }
    }

    /// The graphics-state cache.
    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    /// Whether a batch is open.
    pub fn is_batching(&self) -> bool {
        self.active.is_some()
    }

    /// Renders one view's sorted surfaces, then the trailing shadow and
    /// flare passes.
    pub fn render_draw_surfaces(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        materials: &MaterialTable,
        command: &DrawSurfacesCommand,
    ) -> BatchStats {
        self.flush(backend);

        let refdef = command.refdef.as_ref();
        let mut stats = BatchStats::default();
        let mut old_key = None;
        let mut old_entity = None;
        let mut depth_hack = false;
        self.shader_time = refdef.float_time;
        self.entity_rgba = [255; 4];

        for surface in &command.surfaces {
            stats.surfaces += 1;
            let key = surface.key;

            if old_key == Some(key) {
                self.append(refdef, &surface.surface);
                continue;
            }
            old_key = Some(key);

            let sorted_index = key.sorted_index();
            let Some(material) = resolve(materials, materials.by_sorted_index(sorted_index)) else {
                log::error!("draw surface references unknown sorted index {}", sorted_index);
                continue;
            };
            let (entity, fog, dlight) = (key.entity(), key.fog(), key.dlight());

            let entity_changed = old_entity != Some(entity);
            let needs_new_batch = match &self.active {
                None => true,
                Some(batch) => {
                    batch.sorted_index != sorted_index
                        || batch.fog != fog
                        || batch.dlight != dlight
                        || (entity_changed && !material.entity_mergable)
                }
            };
            if needs_new_batch {
                self.flush(backend);
                self.active = Some(ActiveBatch {
                    material,
                    sorted_index,
                    fog,
                    dlight,
                });
                stats.batches += 1;
            }

            if entity_changed {
                let hack = self.switch_entity(backend, refdef, entity);
                if hack != depth_hack {
                    let far = if hack { DEPTH_HACK_FAR } else { 1.0 };
                    self.cache.set_depth_range(backend, 0.0, far);
                    depth_hack = hack;
                }
                old_entity = Some(entity);
            }

            self.append(refdef, &surface.surface);
        }

        self.flush(backend);
        if depth_hack {
            self.cache.set_depth_range(backend, 0.0, 1.0);
        }

        backend.resolve_shadows();
        backend.render_flares();

        log::trace!(
            "view rendered: {} surfaces in {} batches",
            stats.surfaces,
            stats.batches
        );
        stats
    }

    /// Loads the transform of `entity` and rebases the shader clock on it;
    /// returns whether it wants the depth hack.
    fn switch_entity(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        refdef: &RefDef,
        entity: u32,
    ) -> bool {
        self.shader_time = refdef.float_time;
        self.entity_rgba = [255; 4];
        let ent = match refdef.entities.get(entity as usize) {
            Some(ent) if entity != ENTITYNUM_WORLD => ent,
            _ => {
                if entity != ENTITYNUM_WORLD {
                    log::warn!("draw surface references missing entity {}", entity);
                }
                backend.set_model_transform(Vec3::ZERO, &WORLD_AXIS);
                return false;
            }
        };
        backend.set_model_transform(ent.origin, &ent.axis);
        self.shader_time = refdef.float_time - ent.shader_time;
        self.entity_rgba = ent.shader_rgba;
        ent.renderfx.contains(RenderFx::DEPTHHACK)
    }

    fn append(&mut self, refdef: &RefDef, surface: &SurfaceRef) {
        match surface {
            SurfaceRef::Poly(index) => match refdef.polys.get(*index) {
                Some(poly) => self.tess.add_poly(&poly.verts),
                None => log::warn!("draw surface references missing poly {}", index),
            },
            SurfaceRef::Triangles(triangles) => self.tess.add_triangles(triangles),
            SurfaceRef::Skip => {}
        }
    }

    /// Queues a 2D quad, switching batches when the material changes.
    pub fn add_stretch_pic(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        materials: &MaterialTable,
        pic: &StretchPicCommand,
        color: [u8; 4],
    ) {
        let Some(material) = resolve(
            materials,
            materials.get(pic.shader.index()).or_else(|| materials.get(0)),
        ) else {
            log::error!("no material to draw a picture with");
            return;
        };

        let same = self
            .active
            .as_ref()
            .is_some_and(|batch| batch.material.index == material.index);
        if !same {
            self.flush(backend);
            self.entity_rgba = [255; 4];
            self.active = Some(ActiveBatch {
                sorted_index: material.sorted_index,
                material,
                fog: 0,
                dlight: 0,
            });
        }
        self.tess.add_stretch_pic(pic, color);
    }

    /// Draws and closes the open batch.
    pub fn flush(&mut self, backend: &mut dyn GraphicsBackend) {
        let Some(batch) = self.active.take() else {
            return;
        };
        if !self.tess.is_empty() {
            self.run_stages(backend, &batch.material);
        }
        self.tess.clear();
    }

    fn run_stages(&mut self, backend: &mut dyn GraphicsBackend, material: &Material) {
        let mut time = self.shader_time - material.time_offset;
        if material.clamp_time > 0.0 && time >= material.clamp_time {
            time = material.clamp_time;
        }

        self.cache.set_cull(backend, material.cull);

        match material.iterator {
            StageIterator::Sky => {
                for image in material.sky.outer_box.iter().flatten() {
                    self.cache.bind(backend, 0, *image);
                    self.cache.set_state(backend, StateBits::DEFAULT);
                    self.submit(backend, material.index, SKY_BOX_STAGE, [255; 4]);
                }
                self.run_generic(backend, material, time);
            }
            StageIterator::VertexLitTexture => {
                if let Some(stage) = material.stages.first().filter(|stage| stage.active) {
                    self.draw_stage(backend, material.index, 0, stage, time);
                }
            }
            StageIterator::LightmappedMultitexture => {
                let stage = &material.stages[0];
                if let Some(image) = stage.bundles[0].frame_at(time) {
                    self.cache.bind(backend, 0, image);
                }
                if let Some(lightmap) = stage.bundles[1].image() {
                    self.cache.bind(backend, 1, lightmap);
                }
                self.cache.set_state(backend, stage.state_bits);
                let color = stage_color(stage, self.entity_rgba, time);
                self.submit(backend, material.index, 0, color);
            }
            StageIterator::Generic => self.run_generic(backend, material, time),
        }
    }

    fn run_generic(&mut self, backend: &mut dyn GraphicsBackend, material: &Material, time: f32) {
        for (index, stage) in material.stages.iter().enumerate() {
            if !stage.active {
                break;
            }
            self.draw_stage(backend, material.index, index, stage, time);
        }
    }

    fn draw_stage(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        material: usize,
        index: usize,
        stage: &Stage,
        time: f32,
    ) {
        if let Some(image) = stage.bundles[0].frame_at(time) {
            self.cache.bind(backend, 0, image);
        }
        self.cache.set_state(backend, stage.state_bits);
        let color = stage_color(stage, self.entity_rgba, time);
        self.submit(backend, material, index, color);
    }

    fn submit(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        material: usize,
        stage: usize,
        color: [u8; 4],
    ) {
        backend.draw_indexed(&IndexedDraw {
            vertices: &self.tess.vertices,
            indexes: &self.tess.indexes,
            material,
            stage,
            color,
        });
    }
}
