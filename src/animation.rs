// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `asteroids`.
//
// `asteroids` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `asteroids` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `asteroids`. If not, see <https://www.gnu.org/licenses/>.

//! The animated red channel.

/// The step applied to the red channel every frame.
pub const DEFAULT_STEP: f32 = 0.05;

/// The constant green, blue and alpha channels pushed alongside the red channel.
const GREEN: f32 = 1.0;
const BLUE: f32 = 0.8;
const ALPHA: f32 = 1.0;

/// A value bouncing between 0.0 and 1.0 by a fixed step.
///
/// The value overshoots a bound by at most one step before turning around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    r: f32,
    increment: f32,
    step: f32,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new(DEFAULT_STEP)
    }
}

impl AnimationState {
    /// Start at zero, rising by `step` per frame.
    pub fn new(step: f32) -> Self {
        let step = step.abs();
        Self {
            r: 0.0,
            increment: step,
            step,
        }
    }

    /// The current value.
    pub fn r(&self) -> f32 {
        self.r
    }

    /// The signed change applied on the next frame.
    pub fn increment(&self) -> f32 {
        self.increment
    }

    /// The magnitude of the change.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Apply one frame of change and return the new value.
    pub fn advance(&mut self) -> f32 {
        self.r += self.increment;

        if self.r > 1.0 {
            self.increment = -self.step;
        } else if self.r < 0.0 {
            self.increment = self.step;
        }

        self.r
    }

    /// The color pushed to the shader for the current value.
    pub fn color(&self) -> [f32; 4] {
        [self.r, GREEN, BLUE, ALPHA]
    }
}
