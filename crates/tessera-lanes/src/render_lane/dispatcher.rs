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

//! Execution of a finished render command list against a graphics backend.

use super::batch::SurfaceBatcher;
use tessera_core::{
    material::MaterialTable,
    renderer::{GraphicsBackend, RenderCommand, RenderCommandList},
};
use tessera_telemetry::{CounterHandle, GaugeHandle, MetricsRegistry, ScopedGaugeTimer};

/// Namespace of the metrics published by the dispatcher.
pub const METRICS_NAMESPACE: &str = "renderer";

/// What one command list execution did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Commands executed, end marker excluded.
    pub commands: usize,
    /// Views rendered.
    pub views: usize,
    /// Draw surfaces visited across all views.
    pub surfaces: usize,
    /// Batches opened across all views.
    pub batches: usize,
}

#[derive(Debug)]
struct DispatcherMetrics {
    surfaces: CounterHandle,
    batches: CounterHandle,
    frame_msec: GaugeHandle,
}

/// The back end: walks command lists in submission order and drives the
/// batcher and the graphics backend.
pub struct CommandDispatcher {
    backend: Box<dyn GraphicsBackend>,
    batcher: SurfaceBatcher,
    color_2d: [u8; 4],
    metrics: Option<DispatcherMetrics>,
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("batcher", &self.batcher)
            .field("color_2d", &self.color_2d)
            .finish_non_exhaustive()
    }
}

fn color_to_bytes(rgba: [f32; 4]) -> [u8; 4] {
    rgba.map(|channel| (channel.clamp(0.0, 1.0) * 255.0) as u8)
}

impl CommandDispatcher {
    /// Creates a dispatcher that owns `backend`.
    pub fn new(backend: Box<dyn GraphicsBackend>) -> Self {
        Self {
            backend,
            batcher: SurfaceBatcher::new(),
            color_2d: [255; 4],
            metrics: None,
        }
    }

    /// Publishes per-frame counters and timing to `registry`.
    ///
    /// Registration failures are logged and leave the dispatcher without
    /// metrics.
    pub fn with_metrics(mut self, registry: &MetricsRegistry) -> Self {
        let registered = registry
            .register_counter(METRICS_NAMESPACE, "surfaces", "Draw surfaces visited")
            .and_then(|surfaces| {
                let batches =
                    registry.register_counter(METRICS_NAMESPACE, "batches", "Batches flushed")?;
                let frame_msec = registry.register_gauge(
                    METRICS_NAMESPACE,
                    "backend_msec",
                    "Command list execution time",
                    "ms",
                )?;
                Ok(DispatcherMetrics {
                    surfaces,
                    batches,
                    frame_msec,
                })
            });
        match registered {
            Ok(metrics) => self.metrics = Some(metrics),
            Err(e) => log::error!("Failed to register back end metrics: {e}"),
        }
        self
    }

    /// The graphics backend.
    pub fn backend(&mut self) -> &mut dyn GraphicsBackend {
        self.backend.as_mut()
    }

    /// Executes every command of `commands` in order, stopping at the end
    /// marker.
    pub fn execute(&mut self, commands: &RenderCommandList, materials: &MaterialTable) -> FrameStats {
        let _timer = self
            .metrics
            .as_ref()
            .map(|metrics| ScopedGaugeTimer::new(&metrics.frame_msec));

        let mut stats = FrameStats::default();
        for command in commands.iter() {
            stats.commands += 1;
            let backend = self.backend.as_mut();
            match command {
                RenderCommand::SetColor(rgba) => self.color_2d = color_to_bytes(*rgba),
                RenderCommand::StretchPic(pic) => {
                    self.batcher
                        .add_stretch_pic(backend, materials, pic, self.color_2d);
                }
                RenderCommand::DrawSurfaces(draw) => {
                    self.batcher.flush(backend);
                    backend.begin_view(&draw.refdef);
                    let view = self.batcher.render_draw_surfaces(backend, materials, draw);
                    stats.views += 1;
                    stats.surfaces += view.surfaces;
                    stats.batches += view.batches;
                }
                RenderCommand::DrawBuffer(target) => {
                    self.batcher.flush(backend);
                    backend.set_draw_buffer(*target);
                }
                RenderCommand::SwapBuffers => {
                    self.batcher.flush(backend);
                    backend.present();
                }
                RenderCommand::Screenshot {
                    x,
                    y,
                    width,
                    height,
                    file_name,
                } => {
                    self.batcher.flush(backend);
                    backend.take_screenshot(*x, *y, *width, *height, file_name);
                }
                RenderCommand::EndOfList => break,
            }
        }
        // A list that ends on 2D pictures still draws them.
        self.batcher.flush(self.backend.as_mut());

        if let Some(metrics) = &self.metrics {
            let published = metrics
                .surfaces
                .increment_by(stats.surfaces as u64)
                .and_then(|_| metrics.batches.increment_by(stats.batches as u64));
            if let Err(e) = published {
                log::warn!("Failed to publish back end counters: {e}");
            }
        }

        log::trace!(
            "executed {} commands: {} views, {} surfaces, {} batches",
            stats.commands,
            stats.views,
            stats.surfaces,
            stats.batches
        );
        stats
    }
}
