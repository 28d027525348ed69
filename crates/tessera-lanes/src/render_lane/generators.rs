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

//! Evaluation of stage colour and alpha generators at draw time.
//!
//! Per-vertex generators leave the constant colour white; the vertex colours
//! already carry them.

use std::f32::consts::TAU;
use tessera_core::material::{AlphaGen, ColorGen, Stage, WaveFunc, Waveform};

/// Pseudo-random lattice value in `[-1, 1]` for integer coordinate `i`.
fn noise_lattice(i: i32) -> f32 {
    let mut h = (i as u32).wrapping_mul(0x9E37_79B9);
    h ^= h >> 15;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    (h & 0xFFFF) as f32 / 32767.5 - 1.0
}

/// Value noise: lattice values linearly interpolated between integers.
fn noise(x: f32) -> f32 {
    let cell = x.floor();
    let t = x - cell;
    let i = cell as i32;
    let a = noise_lattice(i);
    a + (noise_lattice(i.wrapping_add(1)) - a) * t
}

/// Evaluates a waveform at `time` seconds.
pub fn eval_waveform(wave: &Waveform, time: f32) -> f32 {
    let x = (time + wave.phase) * wave.frequency;
    let p = x - x.floor();
    let shape = match wave.func {
        WaveFunc::Sin => (x * TAU).sin(),
        WaveFunc::Square => {
            if p < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        WaveFunc::Triangle => {
            if p < 0.25 {
                4.0 * p
            } else if p < 0.75 {
                2.0 - 4.0 * p
            } else {
                4.0 * p - 4.0
            }
        }
        WaveFunc::Sawtooth => p,
        WaveFunc::InverseSawtooth => 1.0 - p,
        WaveFunc::Noise => noise(x),
    };
    wave.base + wave.amplitude * shape
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// The constant RGBA a stage is modulated with.
pub fn stage_color(stage: &Stage, entity_rgba: [u8; 4], time: f32) -> [u8; 4] {
    let [er, eg, eb, ea] = entity_rgba;

    let [r, g, b] = match stage.rgb_gen {
        ColorGen::Entity => [er, eg, eb],
        ColorGen::OneMinusEntity => [255 - er, 255 - eg, 255 - eb],
        ColorGen::Waveform(wave) => [to_byte(eval_waveform(&wave, time)); 3],
        ColorGen::Const(rgb) => rgb,
        _ => [255; 3],
    };

    let a = match stage.alpha_gen {
        AlphaGen::Entity => ea,
        AlphaGen::OneMinusEntity => 255 - ea,
        AlphaGen::Waveform(wave) => to_byte(eval_waveform(&wave, time)),
        AlphaGen::Const(alpha) => alpha,
        _ => 255,
    };

    [r, g, b, a]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wave(func: WaveFunc) -> Waveform {
        Waveform {
            func,
            base: 0.0,
            amplitude: 1.0,
            phase: 0.0,
            frequency: 1.0,
        }
    }

    #[test]
    fn test_wave_shapes() {
        assert_relative_eq!(eval_waveform(&wave(WaveFunc::Sin), 0.25), 1.0);
        assert_relative_eq!(eval_waveform(&wave(WaveFunc::Triangle), 0.25), 1.0);
        assert_relative_eq!(eval_waveform(&wave(WaveFunc::Triangle), 0.75), -1.0);
        assert_relative_eq!(eval_waveform(&wave(WaveFunc::Square), 0.6), -1.0);
        assert_relative_eq!(eval_waveform(&wave(WaveFunc::Sawtooth), 1.25), 0.25);
        assert_relative_eq!(eval_waveform(&wave(WaveFunc::InverseSawtooth), 0.25), 0.75);
    }

    #[test]
    fn test_noise_is_bounded_and_varies() {
        let w = Waveform {
            base: 0.5,
            amplitude: 0.25,
            ..wave(WaveFunc::Noise)
        };
        let samples: Vec<f32> = (0..64).map(|i| eval_waveform(&w, i as f32 * 0.37)).collect();

        assert!(samples.iter().all(|v| (0.25..=0.75).contains(v)));
        assert!(samples.iter().any(|v| (v - samples[0]).abs() > 1e-3));
        assert_relative_eq!(eval_waveform(&w, 3.7), eval_waveform(&w, 3.7));
        assert_relative_eq!(eval_waveform(&w, 2.0), 0.5 + 0.25 * noise_lattice(2));
    }

    #[test]
    fn test_base_and_phase() {
        let w = Waveform {
            base: 0.5,
            amplitude: 0.25,
            phase: 0.5,
            ..wave(WaveFunc::Sawtooth)
        };
        assert_relative_eq!(eval_waveform(&w, 0.25), 0.5 + 0.25 * 0.75);
    }

    #[test]
    fn test_stage_color_generators() {
        let mut stage = Stage {
            rgb_gen: ColorGen::OneMinusEntity,
            alpha_gen: AlphaGen::Const(64),
            ..Default::default()
        };
        assert_eq!(stage_color(&stage, [255, 0, 10, 99], 0.0), [0, 255, 245, 64]);

        stage.rgb_gen = ColorGen::Vertex;
        stage.alpha_gen = AlphaGen::Entity;
        assert_eq!(stage_color(&stage, [1, 2, 3, 4], 0.0), [255, 255, 255, 4]);

        stage.rgb_gen = ColorGen::Waveform(Waveform {
            base: 2.0,
            ..wave(WaveFunc::Sin)
        });
        assert_eq!(stage_color(&stage, [0; 4], 0.0)[0], 255);
    }
}
