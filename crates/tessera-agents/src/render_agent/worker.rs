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

//! The dedicated render thread.

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tessera_core::{material::MaterialTable, renderer::RenderCommandList};
use tessera_lanes::render_lane::{CommandDispatcher, FrameStats};

/// A command list handed to the render thread.
struct FrameJob {
    slot: usize,
    commands: RenderCommandList,
    materials: MaterialTable,
}

/// A command list the render thread is done with.
#[derive(Debug)]
pub struct FrameDone {
    /// Buffer slot the list came from.
    pub slot: usize,
    /// The executed list, handed back for reuse.
    pub commands: RenderCommandList,
    /// What the execution did.
    pub stats: FrameStats,
}

/// Owner side of the render thread.
///
/// At most one frame is in flight. [`RenderWorker::wait`] is the only point
/// where the front end blocks on the back end.
#[derive(Debug)]
pub struct RenderWorker {
    jobs: Sender<Option<FrameJob>>,
    done: Receiver<FrameDone>,
    handle: Option<JoinHandle<()>>,
    in_flight: bool,
}

fn render_loop(
    mut dispatcher: CommandDispatcher,
    jobs: Receiver<Option<FrameJob>>,
    done: Sender<FrameDone>,
) {
    log::info!("Render thread started");
    while let Ok(Some(job)) = jobs.recv() {
        let stats = dispatcher.execute(&job.commands, &job.materials);
        let finished = FrameDone {
            slot: job.slot,
            commands: job.commands,
            stats,
        };
        if done.send(finished).is_err() {
            break;
        }
    }
    log::info!("Render thread stopped");
}

impl RenderWorker {
    /// Moves `dispatcher` onto a new render thread.
    pub fn spawn(dispatcher: CommandDispatcher) -> Result<Self> {
        let (jobs_tx, jobs_rx) = bounded(1);
        let (done_tx, done_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("tessera-render".to_string())
            .spawn(move || render_loop(dispatcher, jobs_rx, done_tx))
            .context("Failed to spawn the render thread")?;

        Ok(Self {
            jobs: jobs_tx,
            done: done_rx,
            handle: Some(handle),
            in_flight: false,
        })
    }

    /// Whether a frame has been handed off and not waited for.
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Hands a finished command list to the render thread.
    pub fn submit(
        &mut self,
        slot: usize,
        commands: RenderCommandList,
        materials: MaterialTable,
    ) -> Result<()> {
        if self.in_flight {
            bail!("A frame is already in flight on the render thread");
        }
        self.jobs
            .send(Some(FrameJob {
                slot,
                commands,
                materials,
            }))
            .map_err(|_| anyhow!("The render thread has exited"))?;
        self.in_flight = true;
        Ok(())
    }

    /// Blocks until the frame in flight, if any, has been executed.
    pub fn wait(&mut self) -> Result<Option<FrameDone>> {
        if !self.in_flight {
            return Ok(None);
        }
        let finished = self
            .done
            .recv()
            .map_err(|_| anyhow!("The render thread exited before finishing its frame"))?;
        self.in_flight = false;
        Ok(Some(finished))
    }

    /// Stops the render thread and joins it.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        // Fails only when the thread is already gone; the join reports why.
        let _ = self.jobs.send(None);
        handle
            .join()
            .map_err(|_| anyhow!("The render thread panicked"))
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("{e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, CountingBackend};
    use tessera_core::renderer::RenderCommand;

    fn swap_list() -> RenderCommandList {
        let mut list = RenderCommandList::with_capacity(4);
        list.push(RenderCommand::SwapBuffers);
        list.finish();
        list
    }

    #[test]
    fn test_one_frame_in_flight() {
        let backend = CountingBackend::default();
        let mut worker = RenderWorker::spawn(CommandDispatcher::new(Box::new(backend.clone()))).unwrap();

        worker.submit(1, swap_list(), MaterialTable::default()).unwrap();
        assert!(worker.is_busy());
        assert!(worker.submit(0, swap_list(), MaterialTable::default()).is_err());

        let done = worker.wait().unwrap().unwrap();
        assert_eq!(done.slot, 1);
        assert_eq!(done.stats.commands, 1);
        assert!(worker.wait().unwrap().is_none());

        worker.shutdown().unwrap();
        assert_eq!(backend.calls(), vec![Call::Present]);
    }
}
