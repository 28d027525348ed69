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

use std::sync::Arc;
use tessera_core::material::ShaderHandle;
use tessera_core::math::{Aabb, Vec3};
use tessera_core::renderer::sort_key::ENTITYNUM_WORLD;
use tessera_core::scene::{
    DynamicLight, LightAttenuation, PolyVert, RdFlags, RefDef, RefEntity, RefEntityType,
    ScenePoly, ViewParams, MAX_DLIGHTS, MAX_MAP_AREA_BYTES,
};
use tessera_core::RenderSettings;

/// One kind of scene item for a frame parity.
///
/// Items of the open sub-scene are owned here until it is published; a
/// published sub-scene moves into a shared slice handed to the snapshot.
#[derive(Debug)]
struct SceneRun<T> {
    open: Vec<T>,
    closed: usize,
}

impl<T> Default for SceneRun<T> {
    fn default() -> Self {
        Self {
            open: Vec::new(),
            closed: 0,
        }
    }
}

impl<T> SceneRun<T> {
    /// Items added since the last frame toggle, published or not.
    fn len(&self) -> usize {
        self.closed + self.open.len()
    }

    fn push(&mut self, item: T) {
        self.open.push(item);
    }

    /// Moves the open items into a shared slice.
    fn publish(&mut self) -> Arc<[T]> {
        let published: Arc<[T]> = self.open.drain(..).collect();
        self.closed += published.len();
        published
    }

    /// Drops the open items while keeping them counted.
    fn discard(&mut self) {
        self.closed += self.open.len();
        self.open.clear();
    }

    fn clear(&mut self) {
        self.open.clear();
        self.closed = 0;
    }
}

/// Backing store for one frame parity.
#[derive(Debug, Default)]
struct FrameStore {
    entities: SceneRun<RefEntity>,
    dlights: SceneRun<DynamicLight>,
    polys: SceneRun<ScenePoly>,
    num_poly_verts: usize,
}

impl FrameStore {
    fn clear(&mut self) {
        self.entities.clear();
        self.dlights.clear();
        self.polys.clear();
        self.num_poly_verts = 0;
    }

    fn discard_open(&mut self) {
        self.entities.discard();
        self.dlights.discard();
        self.polys.discard();
    }
}

/// Running totals and sub-scene start offsets of the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneCounters {
    /// Entities added since the last frame toggle.
    pub num_entities: usize,
    /// Dynamic lights added since the last frame toggle.
    pub num_dlights: usize,
    /// Polygons added since the last frame toggle.
    pub num_polys: usize,
    /// Polygon vertexes added since the last frame toggle.
    pub num_poly_verts: usize,
    /// First entity of the next sub-scene.
    pub first_entity: usize,
    /// First dynamic light of the next sub-scene.
    pub first_dlight: usize,
    /// First polygon of the next sub-scene.
    pub first_poly: usize,
}

/// Accumulates the scene contents of a frame.
///
/// Counters grow monotonically across every sub-scene drawn in a frame.
/// [`SceneAggregator::clear_scene`] starts a new sub-scene at the current
/// counters, [`SceneAggregator::render_scene`] publishes the range since the
/// last start and then advances the starts, and
/// [`SceneAggregator::toggle_frame`] is the only operation that recycles a
/// backing store.
#[derive(Debug)]
pub struct SceneAggregator {
    stores: [FrameStore; 2],
    frame: usize,
    first_entity: usize,
    first_dlight: usize,
    first_poly: usize,
    max_polys: usize,
    max_poly_verts: usize,
    dynamic_light: bool,
    vertex_light: bool,
    world_fogs: Option<Vec<Aabb>>,
    area_mask: [u8; MAX_MAP_AREA_BYTES],
    frame_scene_num: u32,
    scene_count: u64,
}

impl SceneAggregator {
    /// Creates an empty aggregator sized from the settings.
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            stores: [FrameStore::default(), FrameStore::default()],
            frame: 0,
            first_entity: 0,
            first_dlight: 0,
            first_poly: 0,
            max_polys: settings.max_polys,
            max_poly_verts: settings.max_poly_verts,
            dynamic_light: settings.dynamic_light,
            vertex_light: settings.vertex_light,
            world_fogs: None,
            area_mask: [0; MAX_MAP_AREA_BYTES],
            frame_scene_num: 0,
            scene_count: 0,
        }
    }

    /// Installs the fog volume bounds of the loaded world, or `None` when no
    /// world is loaded. Index 0 is the "no fog" slot and is never matched.
    pub fn set_world_fogs(&mut self, fogs: Option<Vec<Aabb>>) {
        self.world_fogs = fogs;
    }

    /// Index of the backing store currently written.
    pub fn frame_parity(&self) -> usize {
        self.frame
    }

    /// Number of sub-scenes rendered since the last frame toggle.
    pub fn frame_scene_num(&self) -> u32 {
        self.frame_scene_num
    }

    /// Number of sub-scenes rendered since creation.
    pub fn scene_count(&self) -> u64 {
        self.scene_count
    }

    /// Snapshot of the running counters.
    pub fn counters(&self) -> SceneCounters {
        let store = &self.stores[self.frame];
        SceneCounters {
            num_entities: store.entities.len(),
            num_dlights: store.dlights.len(),
            num_polys: store.polys.len(),
            num_poly_verts: store.num_poly_verts,
            first_entity: self.first_entity,
            first_dlight: self.first_dlight,
            first_poly: self.first_poly,
        }
    }

    /// Switches to the next frame's backing store and resets every counter.
    ///
    /// With `smp` the parity alternates so the back end may still read the
    /// other store; otherwise store 0 is always used.
    pub fn toggle_frame(&mut self, smp: bool) -> usize {
        self.frame = if smp { self.frame ^ 1 } else { 0 };
        self.stores[self.frame].clear();
        self.first_entity = 0;
        self.first_dlight = 0;
        self.first_poly = 0;
        self.frame_scene_num = 0;
        self.frame
    }

    /// Starts a new sub-scene at the current counters.
    ///
    /// Items added since the last publish stay counted but are never
    /// rendered.
    pub fn clear_scene(&mut self) {
        let store = &mut self.stores[self.frame];
        store.discard_open();
        self.first_dlight = store.dlights.len();
        self.first_entity = store.entities.len();
        self.first_poly = store.polys.len();
    }

    /// Adds an entity. Entities beyond the world entity number are dropped.
    pub fn add_entity(&mut self, entity: RefEntity) -> bool {
        let store = &mut self.stores[self.frame];
        if store.entities.len() >= ENTITYNUM_WORLD as usize {
            return false;
        }
        store.entities.push(entity);
        true
    }

    /// Adds an entity whose type arrives as a raw tag.
    ///
    /// Unknown tags are rejected with an error log.
    pub fn add_entity_raw(&mut self, raw_type: i32, mut entity: RefEntity) -> bool {
        match RefEntityType::from_raw(raw_type) {
            Some(entity_type) => {
                entity.entity_type = entity_type;
                self.add_entity(entity)
            }
            None => {
                log::error!("add_entity_raw: bad entity type {raw_type}");
                false
            }
        }
    }

    /// Adds a dynamic light. Lights beyond [`MAX_DLIGHTS`] and lights of zero
    /// intensity are dropped.
    pub fn add_dynamic_light(
        &mut self,
        origin: Vec3,
        intensity: f32,
        color: Vec3,
        additive: bool,
        normal: Vec3,
        attenuation: LightAttenuation,
    ) -> bool {
        let store = &mut self.stores[self.frame];
        if store.dlights.len() >= MAX_DLIGHTS || intensity == 0.0 {
            return false;
        }
        store.dlights.push(DynamicLight {
            origin,
            radius: intensity,
            color,
            additive,
            normal,
            attenuation,
        });
        true
    }

    /// Adds a modulating omnidirectional light.
    pub fn add_light(
        &mut self,
        origin: Vec3,
        intensity: f32,
        color: Vec3,
        attenuation: LightAttenuation,
    ) -> bool {
        self.add_dynamic_light(origin, intensity, color, false, Vec3::ZERO, attenuation)
    }

    /// Adds an additive omnidirectional light with quadratic falloff.
    pub fn add_additive_light(&mut self, origin: Vec3, intensity: f32, color: Vec3) -> bool {
        self.add_dynamic_light(
            origin,
            intensity,
            color,
            true,
            Vec3::ZERO,
            LightAttenuation::Quadratic,
        )
    }

    /// Adds an additive spot light with quadratic falloff.
    pub fn add_spot_light(&mut self, origin: Vec3, intensity: f32, color: Vec3, normal: Vec3) -> bool {
        self.add_dynamic_light(
            origin,
            intensity,
            color,
            true,
            normal,
            LightAttenuation::Quadratic,
        )
    }

    /// Adds `num_polys` polygons of `num_verts` vertexes each, read
    /// consecutively from `verts`.
    ///
    /// Stops silently at the poly or vertex capacity; returns how many
    /// polygons were stored.
    pub fn add_polys(
        &mut self,
        shader: ShaderHandle,
        num_verts: usize,
        verts: &[PolyVert],
        num_polys: usize,
    ) -> usize {
        if shader == ShaderHandle::DEFAULT {
            log::warn!("add_polys: NULL poly shader");
            return 0;
        }

        let mut added = 0;
        for j in 0..num_polys {
            let store = &self.stores[self.frame];
            if store.num_poly_verts + num_verts > self.max_poly_verts
                || store.polys.len() >= self.max_polys
            {
                log::debug!("add_polys: max_polys or max_poly_verts reached");
                break;
            }
            let Some(source) = verts.get(j * num_verts..(j + 1) * num_verts) else {
                log::warn!("add_polys: vertex slice shorter than {num_polys} polys");
                break;
            };

            let mut poly = ScenePoly {
                shader,
                verts: source.to_vec(),
                fog_index: 0,
            };
            poly.fog_index = self.fog_index_for(&poly);

            let store = &mut self.stores[self.frame];
            store.num_poly_verts += num_verts;
            store.polys.push(poly);
            added += 1;
        }
        added
    }

    fn fog_index_for(&self, poly: &ScenePoly) -> u32 {
        let Some(fogs) = self.world_fogs.as_ref() else {
            return 0;
        };
        if fogs.len() <= 1 {
            return 0;
        }
        let Some(bounds) = poly.bounds() else {
            return 0;
        };
        fogs.iter()
            .enumerate()
            .skip(1)
            .find(|(_, fog)| bounds.intersects(fog))
            .map(|(index, _)| index as u32)
            .unwrap_or(0)
    }

    /// Publishes the current sub-scene as an immutable snapshot and starts
    /// the next sub-scene after it.
    ///
    /// The sub-scene's items move into the snapshot; nothing is copied.
    pub fn render_scene(&mut self, view: &ViewParams) -> RefDef {
        if self.world_fogs.is_none() && !view.rdflags.contains(RdFlags::NOWORLDMODEL) {
            log::warn!("render_scene: no world loaded for a world view");
        }

        let mut area_mask_modified = false;
        if !view.rdflags.contains(RdFlags::NOWORLDMODEL) {
            area_mask_modified = self.area_mask != view.area_mask;
            self.area_mask = view.area_mask;
        }

        self.frame_scene_num += 1;
        self.scene_count += 1;

        let store = &mut self.stores[self.frame];
        let entities = store.entities.publish();
        let polys = store.polys.publish();
        let mut dlights = store.dlights.publish();
        if !self.dynamic_light || self.vertex_light {
            dlights = Arc::from(Vec::new());
        }

        let refdef = RefDef {
            view: view.clone(),
            float_time: view.time as f32 * 0.001,
            area_mask_modified,
            entities,
            dlights,
            polys,
            first_entity: self.first_entity,
            first_dlight: self.first_dlight,
            first_poly: self.first_poly,
            frame_scene_num: self.frame_scene_num,
        };

        self.first_entity = store.entities.len();
        self.first_dlight = store.dlights.len();
        self.first_poly = store.polys.len();

        refdef
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(z: f32) -> Vec<PolyVert> {
        [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
            .iter()
            .map(|&[x, y]| PolyVert {
                xyz: [x, y, z],
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_zero_intensity_light_is_dropped() {
        let mut scene = SceneAggregator::new(&RenderSettings::default());
        assert!(!scene.add_additive_light(Vec3::ZERO, 0.0, Vec3::ONE));
        assert!(scene.add_additive_light(Vec3::ZERO, 100.0, Vec3::ONE));
        assert_eq!(scene.counters().num_dlights, 1);
    }

    #[test]
    fn test_light_capacity() {
        let mut scene = SceneAggregator::new(&RenderSettings::default());
        for _ in 0..MAX_DLIGHTS {
            assert!(scene.add_light(Vec3::ZERO, 10.0, Vec3::ONE, LightAttenuation::Linear));
        }
        assert!(!scene.add_light(Vec3::ZERO, 10.0, Vec3::ONE, LightAttenuation::Linear));
    }

    #[test]
    fn test_entity_capacity() {
        let mut scene = SceneAggregator::new(&RenderSettings::default());
        for _ in 0..ENTITYNUM_WORLD {
            assert!(scene.add_entity(RefEntity::default()));
        }
        assert!(!scene.add_entity(RefEntity::default()));
        assert_eq!(scene.counters().num_entities, ENTITYNUM_WORLD as usize);
    }

    #[test]
    fn test_raw_entity_type_is_validated() {
        let mut scene = SceneAggregator::new(&RenderSettings::default());
        assert!(!scene.add_entity_raw(42, RefEntity::default()));
        assert!(scene.add_entity_raw(2, RefEntity::default()));
        let refdef = scene.render_scene(&ViewParams::default());
        assert_eq!(refdef.entities[0].entity_type, RefEntityType::Sprite);
    }

    #[test]
    fn test_poly_capacity_truncates() {
        let settings = RenderSettings {
            max_polys: 2,
            ..Default::default()
        };
        let mut scene = SceneAggregator::new(&settings);
        let verts: Vec<PolyVert> = (0..3).flat_map(|i| quad(i as f32)).collect();

        let added = scene.add_polys(ShaderHandle(3), 4, &verts, 3);

        assert_eq!(added, 2);
        assert_eq!(scene.counters().num_polys, 2);
        assert_eq!(scene.counters().num_poly_verts, 8);
    }

    #[test]
    fn test_null_poly_shader_is_rejected() {
        let mut scene = SceneAggregator::new(&RenderSettings::default());
        assert_eq!(scene.add_polys(ShaderHandle::DEFAULT, 4, &quad(0.0), 1), 0);
    }

    #[test]
    fn test_poly_fog_volume_lookup() {
        let mut scene = SceneAggregator::new(&RenderSettings::default());
        scene.set_world_fogs(Some(vec![
            Aabb::from_min_max(Vec3::ZERO, Vec3::ZERO),
            Aabb::from_min_max(Vec3::new(10.0, 10.0, 10.0), Vec3::new(20.0, 20.0, 20.0)),
            Aabb::from_min_max(Vec3::new(-5.0, -5.0, -5.0), Vec3::new(5.0, 5.0, 5.0)),
        ]));

        scene.add_polys(ShaderHandle(1), 4, &quad(0.0), 1);
        scene.add_polys(ShaderHandle(1), 4, &quad(100.0), 1);

        let refdef = scene.render_scene(&ViewParams::default());
        assert_eq!(refdef.polys[0].fog_index, 2);
        assert_eq!(refdef.polys[1].fog_index, 0);
    }

    #[test]
    fn test_dlights_hidden_when_disabled() {
        let settings = RenderSettings {
            dynamic_light: false,
            ..Default::default()
        };
        let mut scene = SceneAggregator::new(&settings);
        scene.add_additive_light(Vec3::ZERO, 50.0, Vec3::ONE);
        let refdef = scene.render_scene(&ViewParams::default());
        assert!(refdef.dlights.is_empty());
        assert_eq!(scene.counters().num_dlights, 1);
    }

    #[test]
    fn test_snapshot_owns_published_items() {
        let mut scene = SceneAggregator::new(&RenderSettings::default());
        scene.add_entity(RefEntity::default());
        scene.add_polys(ShaderHandle(1), 4, &quad(0.0), 1);

        let refdef = scene.render_scene(&ViewParams::default());
        let shared = refdef.clone();

        assert!(Arc::ptr_eq(&refdef.polys, &shared.polys));
        assert_eq!(Arc::strong_count(&refdef.entities), 2);
        assert_eq!(scene.counters().num_polys, 1);
        assert!(scene.render_scene(&ViewParams::default()).polys.is_empty());
    }

    #[test]
    fn test_toggle_frame_parity() {
        let mut scene = SceneAggregator::new(&RenderSettings::default());
        assert_eq!(scene.toggle_frame(true), 1);
        assert_eq!(scene.toggle_frame(true), 0);
        assert_eq!(scene.toggle_frame(false), 0);
    }

    #[test]
    fn test_area_mask_change_detection() {
        let mut scene = SceneAggregator::new(&RenderSettings::default());
        let mut view = ViewParams::default();
        assert!(!scene.render_scene(&view).area_mask_modified);
        view.area_mask[3] = 0xff;
        assert!(scene.render_scene(&view).area_mask_modified);
        assert!(!scene.render_scene(&view).area_mask_modified);
    }
}
