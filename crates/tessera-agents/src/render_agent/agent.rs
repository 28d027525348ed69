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

//! The RenderAgent records frames on the front end and hands them to the
//! back end.

use super::worker::RenderWorker;
use crate::shader_agent::ShaderAgent;
use anyhow::Result;
use std::sync::Arc;
use tessera_core::{
    material::{LightmapMode, ShaderHandle},
    math::Vec3,
    renderer::{
        sort_key::ENTITYNUM_WORLD, DrawBufferTarget, DrawSurface, DrawSurfaceKey,
        DrawSurfacesCommand, GraphicsBackend, ImageHandle, RenderCommand, RenderCommandList,
        StretchPicCommand, SurfaceRef, TriangleSurface,
    },
    scene::{LightAttenuation, PolyVert, RefEntity, ViewParams},
    RenderSettings,
};
use tessera_data::SceneAggregator;
use tessera_lanes::render_lane::{CommandDispatcher, FrameStats};
use tessera_telemetry::MetricsRegistry;

/// Where finished command lists are executed.
#[derive(Debug)]
enum BackEnd {
    Inline(CommandDispatcher),
    Threaded(RenderWorker),
}

/// A caller-supplied surface waiting for the next `render_scene`.
#[derive(Debug)]
struct QueuedSurface {
    shader: ShaderHandle,
    entity: u32,
    fog: u32,
    dlight: u32,
    surface: Arc<TriangleSurface>,
}

/// The renderer front end.
///
/// Owns the material registry, the scene aggregator and two command lists.
/// One list is recorded while, with `smp`, the render thread executes the
/// other. Materials registered mid-frame immediately re-point the sort keys
/// already recorded in the current list.
#[derive(Debug)]
pub struct RenderAgent {
    settings: RenderSettings,
    shaders: ShaderAgent,
    scene: SceneAggregator,
    commands: [RenderCommandList; 2],
    parity: usize,
    queued: Vec<QueuedSurface>,
    back_end: BackEnd,
    frame_count: u64,
    last_stats: FrameStats,
}

impl RenderAgent {
    /// Creates the front end and its back end.
    ///
    /// With `settings.smp` the back end runs on its own thread.
    pub fn new(
        settings: RenderSettings,
        shaders: ShaderAgent,
        backend: Box<dyn GraphicsBackend>,
        metrics: Option<&MetricsRegistry>,
    ) -> Result<Self> {
        let mut dispatcher = CommandDispatcher::new(backend);
        if let Some(registry) = metrics {
            dispatcher = dispatcher.with_metrics(registry);
        }
        let back_end = if settings.smp {
            BackEnd::Threaded(RenderWorker::spawn(dispatcher)?)
        } else {
            BackEnd::Inline(dispatcher)
        };
        log::info!(
            "Render agent ready ({} back end)",
            if settings.smp { "threaded" } else { "inline" }
        );

        let capacity = settings.max_render_commands;
        Ok(Self {
            scene: SceneAggregator::new(&settings),
            commands: [
                RenderCommandList::with_capacity(capacity),
                RenderCommandList::with_capacity(capacity),
            ],
            settings,
            shaders,
            parity: 0,
            queued: Vec::new(),
            back_end,
            frame_count: 0,
            last_stats: FrameStats::default(),
        })
    }

    // --- Materials ---

    /// The material registry.
    pub fn shaders(&self) -> &ShaderAgent {
        &self.shaders
    }

    /// Runs `f` against the registry, then re-points the sort keys recorded
    /// so far in this frame.
    pub fn with_shaders<R>(&mut self, f: impl FnOnce(&mut ShaderAgent) -> R) -> R {
        let result = f(&mut self.shaders);
        self.apply_sort_fixups();
        result
    }

    /// See [`ShaderAgent::register_shader`].
    pub fn register_shader(&mut self, name: &str) -> ShaderHandle {
        self.with_shaders(|shaders| shaders.register_shader(name))
    }

    /// See [`ShaderAgent::register_shader_nomip`].
    pub fn register_shader_nomip(&mut self, name: &str) -> ShaderHandle {
        self.with_shaders(|shaders| shaders.register_shader_nomip(name))
    }

    /// See [`ShaderAgent::register_shader_lightmap`].
    pub fn register_shader_lightmap(&mut self, name: &str, lightmap: LightmapMode) -> ShaderHandle {
        self.with_shaders(|shaders| shaders.register_shader_lightmap(name, lightmap))
    }

    /// See [`ShaderAgent::register_shader_from_image`].
    pub fn register_shader_from_image(
        &mut self,
        name: &str,
        lightmap: LightmapMode,
        image: ImageHandle,
    ) -> ShaderHandle {
        self.with_shaders(|shaders| shaders.register_shader_from_image(name, lightmap, image))
    }

    /// See [`ShaderAgent::remap_shader`].
    pub fn remap_shader(&mut self, name: &str, new_name: &str, time_offset: Option<f32>) {
        self.with_shaders(|shaders| shaders.remap_shader(name, new_name, time_offset));
    }

    fn apply_sort_fixups(&mut self) {
        for point in self.shaders.take_sort_fixups() {
            let patched = self.commands[self.parity].patch_sort_indices(point);
            if patched > 0 {
                log::trace!("Sort fixup at {point}: {patched} surfaces re-pointed");
            }
        }
    }

    // --- Scene ---

    /// The scene aggregator, for the less common submissions.
    pub fn scene_mut(&mut self) -> &mut SceneAggregator {
        &mut self.scene
    }

    /// Starts a new sub-scene.
    pub fn clear_scene(&mut self) {
        self.scene.clear_scene();
        self.queued.clear();
    }

    /// Adds an entity to the current sub-scene.
    pub fn add_entity(&mut self, entity: RefEntity) -> bool {
        self.scene.add_entity(entity)
    }

    /// Adds a modulating dynamic light.
    pub fn add_light(
        &mut self,
        origin: Vec3,
        intensity: f32,
        color: Vec3,
        attenuation: LightAttenuation,
    ) -> bool {
        self.scene.add_light(origin, intensity, color, attenuation)
    }

    /// Adds an additive dynamic light.
    pub fn add_additive_light(&mut self, origin: Vec3, intensity: f32, color: Vec3) -> bool {
        self.scene.add_additive_light(origin, intensity, color)
    }

    /// Adds polygons; see [`SceneAggregator::add_polys`].
    pub fn add_polys(
        &mut self,
        shader: ShaderHandle,
        num_verts: usize,
        verts: &[PolyVert],
        num_polys: usize,
    ) -> usize {
        self.scene.add_polys(shader, num_verts, verts, num_polys)
    }

    /// Queues an indexed surface for the next [`RenderAgent::render_scene`].
    ///
    /// `entity` indexes the entities of the same sub-scene, or is
    /// [`ENTITYNUM_WORLD`].
    pub fn add_surface(
        &mut self,
        shader: ShaderHandle,
        entity: u32,
        fog: u32,
        dlight: u32,
        surface: Arc<TriangleSurface>,
    ) {
        self.queued.push(QueuedSurface {
            shader,
            entity,
            fog,
            dlight,
            surface,
        });
    }

    /// Publishes the current sub-scene and records its draw surfaces,
    /// sorted by key.
    pub fn render_scene(&mut self, view: &ViewParams) {
        let refdef = self.scene.render_scene(view);

        let mut surfaces = Vec::with_capacity(refdef.polys.len() + self.queued.len());
        for (index, poly) in refdef.polys.iter().enumerate() {
            let material = self.shaders.shader_by_handle(poly.shader);
            surfaces.push(DrawSurface {
                key: DrawSurfaceKey::pack(material.sorted_index, ENTITYNUM_WORLD, poly.fog_index, 0),
                surface: SurfaceRef::Poly(index),
            });
        }
        for queued in self.queued.drain(..) {
            let material = self.shaders.shader_by_handle(queued.shader);
            surfaces.push(DrawSurface {
                key: DrawSurfaceKey::pack(
                    material.sorted_index,
                    queued.entity,
                    queued.fog,
                    queued.dlight,
                ),
                surface: SurfaceRef::Triangles(queued.surface),
            });
        }
        surfaces.sort_by_key(|surface| surface.key);
        log::trace!(
            "render_scene {}: {} draw surfaces",
            refdef.frame_scene_num,
            surfaces.len()
        );

        self.push(RenderCommand::DrawSurfaces(DrawSurfacesCommand {
            refdef: Arc::new(refdef),
            surfaces,
        }));
    }

    // --- 2D and frame commands ---

    /// Sets the colour of following 2D draws; `None` resets to white.
    pub fn set_color(&mut self, rgba: Option<[f32; 4]>) {
        self.push(RenderCommand::SetColor(rgba.unwrap_or([1.0; 4])));
    }

    /// Draws a textured screen rectangle.
    pub fn draw_stretch_pic(&mut self, pic: StretchPicCommand) {
        self.push(RenderCommand::StretchPic(pic));
    }

    /// Selects the buffer the frame draws into.
    pub fn begin_frame(&mut self, target: DrawBufferTarget) {
        self.push(RenderCommand::DrawBuffer(target));
    }

    /// Captures a screen region once the frame is drawn.
    pub fn take_screenshot(&mut self, x: i32, y: i32, width: i32, height: i32, file_name: &str) {
        self.push(RenderCommand::Screenshot {
            x,
            y,
            width,
            height,
            file_name: file_name.to_string(),
        });
    }

    fn push(&mut self, command: RenderCommand) {
        if !self.commands[self.parity].push(command) {
            log::warn!("Render command list full, command dropped");
        }
    }

    /// Closes the frame and hands it to the back end.
    ///
    /// Inline, the frame is executed before returning and its stats are
    /// returned. Threaded, this waits for the previous frame, starts this
    /// one and returns the previous frame's stats.
    pub fn end_frame(&mut self) -> Result<FrameStats> {
        self.apply_sort_fixups();
        let slot = self.parity;
        self.push(RenderCommand::SwapBuffers);
        self.commands[slot].finish();
        let materials = self.shaders.material_table();

        let stats = match &mut self.back_end {
            BackEnd::Inline(dispatcher) => dispatcher.execute(&self.commands[slot], &materials),
            BackEnd::Threaded(worker) => {
                let previous = match worker.wait()? {
                    Some(done) => {
                        let stats = done.stats;
                        self.commands[done.slot] = done.commands;
                        stats
                    }
                    None => FrameStats::default(),
                };
                let capacity = self.settings.max_render_commands;
                let commands = std::mem::replace(
                    &mut self.commands[slot],
                    RenderCommandList::with_capacity(capacity),
                );
                worker.submit(slot, commands, materials)?;
                previous
            }
        };

        self.frame_count += 1;
        self.last_stats = stats;
        self.parity = self.scene.toggle_frame(self.settings.smp);
        self.commands[self.parity].clear();
        Ok(stats)
    }

    /// Blocks until the render thread is idle; returns the stats of the
    /// frame it finished, if any.
    pub fn sync_render_thread(&mut self) -> Result<Option<FrameStats>> {
        let BackEnd::Threaded(worker) = &mut self.back_end else {
            return Ok(None);
        };
        Ok(worker.wait()?.map(|done| {
            self.commands[done.slot] = done.commands;
            done.stats
        }))
    }

    /// Waits for outstanding work and stops the render thread.
    pub fn shutdown(mut self) -> Result<()> {
        self.sync_render_thread()?;
        match self.back_end {
            BackEnd::Threaded(worker) => worker.shutdown(),
            BackEnd::Inline(_) => Ok(()),
        }
    }

    /// The command list being recorded.
    pub fn current_commands(&self) -> &RenderCommandList {
        &self.commands[self.parity]
    }

    /// Which of the two command lists is being recorded.
    pub fn parity(&self) -> usize {
        self.parity
    }

    /// Frames ended so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Stats returned by the last `end_frame`.
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// The settings the agent was created with.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, CountingBackend, FakeImages, NullAtlas};
    use tessera_core::{renderer::DrawVertex, scene::RdFlags, vfs::MemoryTextResources};

    const SCRIPT: &str = "
textures/base/wall
{
    {
        map textures/base/wall.tga
    }
}

textures/sfx/glow
{
    sort additive
    {
        map textures/sfx/glow.tga
        blendFunc GL_ONE GL_ONE
    }
}
";

    fn agent(smp: bool) -> (RenderAgent, CountingBackend) {
        let settings = RenderSettings {
            smp,
            ..RenderSettings::default()
        };
        let resources = MemoryTextResources::new().with_file("scripts/base.shader", SCRIPT);
        let shaders = ShaderAgent::new(
            settings.clone(),
            &resources,
            Box::new(FakeImages::with_images(&[
                "textures/base/wall.tga",
                "textures/sfx/glow.tga",
                "gfx/2d/crosshair.tga",
            ])),
            Box::new(NullAtlas),
        );
        let backend = CountingBackend::default();
        let agent = RenderAgent::new(settings, shaders, Box::new(backend.clone()), None).unwrap();
        (agent, backend)
    }

    fn ui_view() -> ViewParams {
        ViewParams {
            rdflags: RdFlags::NOWORLDMODEL,
            ..ViewParams::default()
        }
    }

    fn triangle() -> Vec<PolyVert> {
        vec![
            PolyVert {
                xyz: [0.0, 0.0, 0.0],
                ..PolyVert::default()
            },
            PolyVert {
                xyz: [1.0, 0.0, 0.0],
                ..PolyVert::default()
            },
            PolyVert {
                xyz: [0.0, 1.0, 0.0],
                ..PolyVert::default()
            },
        ]
    }

    fn draws(calls: &[Call]) -> Vec<usize> {
        calls
            .iter()
            .filter_map(|call| match call {
                Call::Draw { material, .. } => Some(*material),
                Call::Present => None,
            })
            .collect()
    }

    #[test]
    fn test_inline_frame_draws_polys() {
        let (mut agent, backend) = agent(false);
        let glow = agent.register_shader_lightmap("textures/sfx/glow", LightmapMode::None);

        assert_eq!(agent.add_polys(glow, 3, &triangle(), 1), 1);
        agent.render_scene(&ui_view());
        let stats = agent.end_frame().unwrap();

        assert_eq!(stats.views, 1);
        assert_eq!(stats.surfaces, 1);
        assert_eq!(draws(&backend.calls()), vec![glow.index()]);
        assert_eq!(backend.calls().last(), Some(&Call::Present));
        assert_eq!(agent.parity(), 0);
        assert!(agent.current_commands().is_empty());
    }

    #[test]
    fn test_mid_frame_registration_keeps_recorded_keys() {
        let (mut agent, backend) = agent(false);
        let glow = agent.register_shader_lightmap("textures/sfx/glow", LightmapMode::None);
        agent.add_polys(glow, 3, &triangle(), 1);
        agent.render_scene(&ui_view());

        // Opaque sorts before additive, shifting the glow material.
        let before = agent.shaders().shader_by_handle(glow).sorted_index;
        agent.register_shader_lightmap("textures/base/wall", LightmapMode::None);
        assert_eq!(agent.shaders().shader_by_handle(glow).sorted_index, before + 1);

        agent.end_frame().unwrap();

        assert_eq!(draws(&backend.calls()), vec![glow.index()]);
    }

    #[test]
    fn test_queued_surfaces_are_sorted_by_key() {
        let (mut agent, backend) = agent(false);
        let glow = agent.register_shader_lightmap("textures/sfx/glow", LightmapMode::None);
        let wall = agent.register_shader_lightmap("textures/base/wall", LightmapMode::None);
        let surface = Arc::new(TriangleSurface {
            vertices: vec![DrawVertex::default(); 3],
            indexes: vec![0, 1, 2],
        });

        agent.add_surface(glow, ENTITYNUM_WORLD, 0, 0, surface.clone());
        agent.add_surface(wall, ENTITYNUM_WORLD, 0, 0, surface);
        agent.render_scene(&ui_view());
        agent.end_frame().unwrap();

        assert_eq!(draws(&backend.calls()), vec![wall.index(), glow.index()]);
    }

    #[test]
    fn test_2d_draws_and_color_reset() {
        let (mut agent, backend) = agent(false);
        let crosshair = agent.register_shader("gfx/2d/crosshair");

        agent.begin_frame(DrawBufferTarget::Back);
        agent.set_color(Some([1.0, 0.0, 0.0, 1.0]));
        agent.draw_stretch_pic(StretchPicCommand {
            shader: crosshair,
            x: 10.0,
            y: 10.0,
            w: 32.0,
            h: 32.0,
            s1: 0.0,
            t1: 0.0,
            s2: 1.0,
            t2: 1.0,
        });
        agent.set_color(None);
        let recorded = agent.current_commands().len();
        let stats = agent.end_frame().unwrap();

        assert_eq!(recorded, 4);
        assert_eq!(stats.commands, 5);
        assert_eq!(draws(&backend.calls()), vec![crosshair.index()]);
    }

    #[test]
    fn test_threaded_frames_alternate_and_report_previous() {
        let (mut agent, backend) = agent(true);
        let glow = agent.register_shader_lightmap("textures/sfx/glow", LightmapMode::None);

        agent.add_polys(glow, 3, &triangle(), 1);
        agent.render_scene(&ui_view());
        let first = agent.end_frame().unwrap();
        assert_eq!(first, FrameStats::default());
        assert_eq!(agent.parity(), 1);

        let second = agent.end_frame().unwrap();
        assert_eq!(second.views, 1);
        assert_eq!(agent.parity(), 0);

        let last = agent.sync_render_thread().unwrap().unwrap();
        assert_eq!(last.views, 0);
        agent.shutdown().unwrap();

        let calls = backend.calls();
        assert_eq!(draws(&calls), vec![glow.index()]);
        assert_eq!(calls.iter().filter(|call| **call == Call::Present).count(), 2);
    }
}
