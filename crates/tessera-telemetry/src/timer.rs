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

//! Scope timers that publish their duration to a gauge.

use crate::metrics::registry::GaugeHandle;
use std::time::Instant;

/// Measures the lifetime of a scope and stores it, in milliseconds, in a
/// gauge when dropped.
pub struct ScopedGaugeTimer<'a> {
    start: Instant,
    gauge: &'a GaugeHandle,
}

impl<'a> ScopedGaugeTimer<'a> {
    /// Starts timing immediately.
    pub fn new(gauge: &'a GaugeHandle) -> Self {
        Self {
            start: Instant::now(),
            gauge,
        }
    }
}

impl Drop for ScopedGaugeTimer<'_> {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        if let Err(e) = self.gauge.set(elapsed_ms) {
            log::warn!("[ScopedGaugeTimer] Failed to record metric: {e}");
        }
    }
}
