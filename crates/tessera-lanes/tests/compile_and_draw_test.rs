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

//! Integration tests running material text through the shader lane and the
//! result through the render lane.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tessera_core::{
    material::{CullType, LightmapMode, MaterialTable, StageIterator, StateBits},
    renderer::{
        sort_key::ENTITYNUM_WORLD, AtlasRegion, AtlasRegistry, CpuImage, DrawSurface,
        DrawSurfaceKey, DrawSurfacesCommand, DrawVertex, GraphicsBackend, ImageHandle,
        ImageProvider, IndexedDraw, RenderCommand, RenderCommandList, SurfaceRef,
        TriangleSurface,
    },
    RenderSettings,
};
use tessera_lanes::{
    render_lane::CommandDispatcher,
    shader_lane::{compile_material, CompilationContext, ShaderError, Tokenizer},
};

#[derive(Default)]
struct NamedImages {
    handles: HashMap<String, ImageHandle>,
}

impl NamedImages {
    fn with(names: &[&str]) -> Self {
        let handles = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), ImageHandle(100 + i as u32)))
            .collect();
        Self { handles }
    }
}

impl ImageProvider for NamedImages {
    fn find_or_load_image(&mut self, name: &str, _mipmaps: bool, _allow_picmip: bool) -> Option<ImageHandle> {
        self.handles.get(name).copied()
    }

    fn image_pixels(&self, _image: ImageHandle) -> Option<CpuImage> {
        None
    }

    fn default_image(&self) -> ImageHandle {
        ImageHandle(1)
    }

    fn white_image(&self) -> ImageHandle {
        ImageHandle(2)
    }

    fn lightmap(&self, index: u32) -> Option<ImageHandle> {
        (index == 0).then_some(ImageHandle(50))
    }

    fn num_lightmaps(&self) -> u32 {
        1
    }
}

#[derive(Default)]
struct NoAtlas;

impl AtlasRegistry for NoAtlas {
    fn register_atlas_region(&mut self, _name: &str, _width: u32, _height: u32, _pixels: &[u8]) {}

    fn find_atlas_region(&self, _name: &str) -> Option<AtlasRegion> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Bind(usize, ImageHandle),
    State(StateBits),
    Draw(usize),
    Present,
}

#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    fn push(&self, event: Event) {
        if let Ok(mut events) = self.0.lock() {
            events.push(event);
        }
    }

    fn events(&self) -> Vec<Event> {
        self.0.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl GraphicsBackend for EventLog {
    fn bind_image(&mut self, unit: usize, image: ImageHandle) {
        self.push(Event::Bind(unit, image));
    }

    fn set_state(&mut self, state: StateBits) {
        self.push(Event::State(state));
    }

    fn set_cull(&mut self, _cull: CullType) {}

    fn set_depth_range(&mut self, _near: f32, _far: f32) {}

    fn draw_indexed(&mut self, draw: &IndexedDraw<'_>) {
        self.push(Event::Draw(draw.stage));
    }

    fn present(&mut self) {
        self.push(Event::Present);
    }
}

const WALL: &str = "
{
    {
        map textures/base/wall.tga
        blendFunc GL_ONE GL_ZERO
    }
    {
        map $lightmap
        blendFunc GL_DST_COLOR GL_ZERO
    }
}";

#[test]
fn test_compiled_material_draws_every_stage() {
    // --- 1. ARRANGE ---
    let settings = RenderSettings::default();
    let mut images = NamedImages::with(&["textures/base/wall.tga"]);
    let mut atlas = NoAtlas;
    let mut ctx = CompilationContext::new(
        "textures/base/wall",
        LightmapMode::Index(0),
        &settings,
        &mut images,
        &mut atlas,
    );
    let mut tokens = Tokenizer::new(WALL);

    // --- 2. ACT (compile) ---
    compile_material(&mut ctx, &mut tokens).unwrap();
    let material = ctx.into_material();

    // --- 3. ASSERT (compile) ---
    let base = &material.stages[0];
    assert!(base.state_bits.contains(StateBits::DEPTHMASK_TRUE));
    assert!(!base.state_bits.intersects(StateBits::SRCBLEND_BITS));
    assert!(!base.state_bits.intersects(StateBits::DSTBLEND_BITS));
    assert_eq!(material.active_stage_count(), 2);
    assert_eq!(material.iterator, StageIterator::Generic);

    // --- 4. ARRANGE (draw) ---
    let table = MaterialTable {
        by_index: vec![Arc::new(material)],
        sorted: vec![0],
    };
    let log = EventLog::default();
    let mut dispatcher = CommandDispatcher::new(Box::new(log.clone()));
    let triangle = Arc::new(TriangleSurface {
        vertices: vec![DrawVertex::default(); 3],
        indexes: vec![0, 1, 2],
    });
    let mut commands = RenderCommandList::with_capacity(8);
    commands.push(RenderCommand::DrawSurfaces(DrawSurfacesCommand {
        refdef: Arc::default(),
        surfaces: vec![
            DrawSurface {
                key: DrawSurfaceKey::pack(0, ENTITYNUM_WORLD, 0, 0),
                surface: SurfaceRef::Triangles(triangle.clone()),
            },
            DrawSurface {
                key: DrawSurfaceKey::pack(0, ENTITYNUM_WORLD, 0, 0),
                surface: SurfaceRef::Triangles(triangle),
            },
        ],
    }));
    commands.push(RenderCommand::SwapBuffers);
    commands.finish();

    // --- 5. ACT (draw) ---
    let stats = dispatcher.execute(&commands, &table);

    // --- 6. ASSERT (draw) ---
    assert_eq!(stats.batches, 1);
    let events = log.events();
    let draws: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::Draw(stage) => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(draws, vec![0, 1]);
    assert!(events.contains(&Event::Bind(0, ImageHandle(100))));
    assert!(events.contains(&Event::Bind(0, ImageHandle(50))));
    assert_eq!(events.last(), Some(&Event::Present));
}

#[test]
fn test_stage_overflow_is_fatal_and_defaulted() {
    // --- 1. ARRANGE ---
    let settings = RenderSettings::default();
    let mut images = NamedImages::with(&["a.tga"]);
    let mut atlas = NoAtlas;
    let mut ctx = CompilationContext::new("overflow", LightmapMode::None, &settings, &mut images, &mut atlas);
    let text = format!("{{\n{}}}", "{\nmap a.tga\n}\n".repeat(9));
    let mut tokens = Tokenizer::new(&text);

    // --- 2. ACT ---
    let result = compile_material(&mut ctx, &mut tokens);

    // --- 3. ASSERT ---
    let err = result.unwrap_err();
    assert!(matches!(err, ShaderError::TooManyStages { .. }));
    assert!(err.is_fatal());
    let material = ctx.into_material();
    assert!(material.default_shader);
    assert_eq!(material.active_stage_count(), 1);
}
