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

//! Engine-wide switches consulted by the renderer.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};

/// Renderer configuration.
///
/// Missing fields take their default value when deserialised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Collapse materials to a single vertex-lit pass and disable dynamic lights.
    pub vertex_light: bool,
    /// A fullscreen user interface is up; suppresses the vertex-light collapse.
    pub ui_fullscreen: bool,
    /// Keep `detail` stages.
    pub detail_textures: bool,
    /// Hardware multitexture is available.
    pub multitexture_env: bool,
    /// Publish dynamic lights to the views.
    pub dynamic_light: bool,
    /// Run the back end on its own thread with double-buffered frames.
    pub smp: bool,
    /// Log every explicitly defined material as it loads.
    pub print_shaders: bool,
    /// Scene polygons accepted per frame.
    pub max_polys: usize,
    /// Scene polygon vertexes accepted per frame.
    pub max_poly_verts: usize,
    /// Render commands accepted per frame.
    pub max_render_commands: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            vertex_light: false,
            ui_fullscreen: false,
            detail_textures: true,
            multitexture_env: true,
            dynamic_light: true,
            smp: false,
            print_shaders: false,
            max_polys: 600,
            max_poly_verts: 3000,
            max_render_commands: 1024,
        }
    }
}

impl RenderSettings {
    /// Parses settings from JSON text.
    /// ## Errors
    /// [`SettingsError::Parse`] when the text is not a valid settings object.
    pub fn from_json_str(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Whether the vertex-lighting collapse applies to newly compiled materials.
    pub fn collapse_to_vertex_light(&self) -> bool {
        self.vertex_light && !self.ui_fullscreen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = RenderSettings::from_json_str(r#"{ "smp": true, "max_polys": 10 }"#).unwrap();
        assert!(settings.smp);
        assert_eq!(settings.max_polys, 10);
        assert_eq!(settings.max_poly_verts, 3000);
        assert!(settings.detail_textures);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(RenderSettings::from_json_str("{ smp: ").is_err());
    }

    #[test]
    fn test_vertex_light_suppressed_by_fullscreen_ui() {
        let mut settings = RenderSettings {
            vertex_light: true,
            ..Default::default()
        };
        assert!(settings.collapse_to_vertex_light());
        settings.ui_fullscreen = true;
        assert!(!settings.collapse_to_vertex_light());
    }
}
