//! Inheritable render state.
//!
//! Every flag, the colorize multiplier and the opacity multiplier cascade from
//! a node to its whole subtree whenever they are set. All of them go through
//! one operation, [`Scene::set_state`](crate::Scene::set_state), parameterised
//! by a [`StateChange`].

use bitflags::bitflags;
use glam::{Vec3, Vec4};

bitflags! {
    /// Boolean render-state flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u16 {
        const VISIBLE        = 1 << 0;
        const CULLED         = 1 << 1;
        const PICKABLE       = 1 << 2;
        const CLIPPABLE      = 1 << 3;
        /// Included in the parent's (and the scene's) boundary.
        const COLLIDABLE     = 1 << 4;
        const CAST_SHADOW    = 1 << 5;
        const RECEIVE_SHADOW = 1 << 6;
        const OUTLINED       = 1 << 7;
        const HIGHLIGHTED    = 1 << 8;
        const GHOSTED        = 1 << 9;
        const SELECTED       = 1 << 10;
    }
}

impl RenderFlags {
    /// Flags mirrored into the scene's per-state entity maps.
    pub const ENTITY_TRACKED: Self = Self::VISIBLE
        .union(Self::GHOSTED)
        .union(Self::SELECTED)
        .union(Self::HIGHLIGHTED);
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self::VISIBLE
            | Self::PICKABLE
            | Self::CLIPPABLE
            | Self::COLLIDABLE
            | Self::CAST_SHADOW
            | Self::RECEIVE_SHADOW
    }
}

/// The complete inheritable state of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub flags: RenderFlags,
    /// RGB colorize multiplier in `xyz`, opacity multiplier in `w`.
    pub color: Vec4,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            flags: RenderFlags::default(),
            color: Vec4::ONE,
        }
    }
}

impl RenderState {
    #[inline]
    #[must_use]
    pub fn contains(&self, flag: RenderFlags) -> bool {
        self.flags.contains(flag)
    }

    #[inline]
    #[must_use]
    pub fn visible(&self) -> bool {
        self.contains(RenderFlags::VISIBLE)
    }

    #[inline]
    #[must_use]
    pub fn culled(&self) -> bool {
        self.contains(RenderFlags::CULLED)
    }

    #[inline]
    #[must_use]
    pub fn pickable(&self) -> bool {
        self.contains(RenderFlags::PICKABLE)
    }

    #[inline]
    #[must_use]
    pub fn clippable(&self) -> bool {
        self.contains(RenderFlags::CLIPPABLE)
    }

    #[inline]
    #[must_use]
    pub fn collidable(&self) -> bool {
        self.contains(RenderFlags::COLLIDABLE)
    }

    #[inline]
    #[must_use]
    pub fn cast_shadow(&self) -> bool {
        self.contains(RenderFlags::CAST_SHADOW)
    }

    #[inline]
    #[must_use]
    pub fn receive_shadow(&self) -> bool {
        self.contains(RenderFlags::RECEIVE_SHADOW)
    }

    #[inline]
    #[must_use]
    pub fn outlined(&self) -> bool {
        self.contains(RenderFlags::OUTLINED)
    }

    #[inline]
    #[must_use]
    pub fn highlighted(&self) -> bool {
        self.contains(RenderFlags::HIGHLIGHTED)
    }

    #[inline]
    #[must_use]
    pub fn ghosted(&self) -> bool {
        self.contains(RenderFlags::GHOSTED)
    }

    #[inline]
    #[must_use]
    pub fn selected(&self) -> bool {
        self.contains(RenderFlags::SELECTED)
    }

    #[inline]
    #[must_use]
    pub fn colorize(&self) -> Vec3 {
        self.color.truncate()
    }

    #[inline]
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.color.w
    }

    /// Builder-style flag toggle.
    #[must_use]
    pub fn with(mut self, flag: RenderFlags, on: bool) -> Self {
        self.flags.set(flag, on);
        self
    }

    #[must_use]
    pub fn with_visible(self, visible: bool) -> Self {
        self.with(RenderFlags::VISIBLE, visible)
    }

    /// Applies `change`, returning the flags whose value actually flipped.
    pub(crate) fn apply(&mut self, change: &StateChange) -> RenderFlags {
        let before = self.flags;
        match *change {
            StateChange::Flags(flags, on) => self.flags.set(flags, on),
            StateChange::Colorize(rgb) => {
                let rgb = rgb.unwrap_or(Vec3::ONE).clamp(Vec3::ZERO, Vec3::ONE);
                self.color = rgb.extend(self.color.w);
            }
            StateChange::Opacity(alpha) => {
                self.color.w = alpha.unwrap_or(1.0).clamp(0.0, 1.0);
            }
            StateChange::All(state) => *self = state,
        }
        before ^ self.flags
    }
}

/// One cascading state assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateChange {
    /// Sets (`true`) or clears (`false`) every flag in the set.
    Flags(RenderFlags, bool),
    /// RGB multiplier, clamped to `[0, 1]`. `None` resets to white.
    Colorize(Option<Vec3>),
    /// Alpha multiplier, clamped to `[0, 1]`. `None` resets to opaque.
    Opacity(Option<f32>),
    /// Replaces the whole state (used for attach-time inheritance).
    All(RenderState),
}

impl StateChange {
    #[must_use]
    pub fn visible(on: bool) -> Self {
        Self::Flags(RenderFlags::VISIBLE, on)
    }

    #[must_use]
    pub fn highlighted(on: bool) -> Self {
        Self::Flags(RenderFlags::HIGHLIGHTED, on)
    }

    #[must_use]
    pub fn ghosted(on: bool) -> Self {
        Self::Flags(RenderFlags::GHOSTED, on)
    }

    #[must_use]
    pub fn selected(on: bool) -> Self {
        Self::Flags(RenderFlags::SELECTED, on)
    }
}
