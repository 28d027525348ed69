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

//! # Tessera Telemetry
//!
//! Logging bootstrap and the metrics registry the back end publishes its
//! per-frame counters to.

#![warn(missing_docs)]

pub mod metrics;
pub mod storage;
pub mod timer;

pub use metrics::registry::{CounterHandle, GaugeHandle, MetricsRegistry};
pub use storage::{backend::MetricsBackend, memory_backend::InMemoryBackend};
pub use timer::ScopedGaugeTimer;

use env_logger::{Builder, Env};

/// Installs the process-wide logger.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this
/// more than once, or after another logger was installed, does nothing.
pub fn init_logging() {
    let result = Builder::from_env(Env::default().default_filter_or("info")).try_init();
    if result.is_err() {
        log::debug!("Logger already initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        log::info!("logging initialised twice without panicking");
    }
}
