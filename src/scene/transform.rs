use std::cell::Cell;

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Transform component
///
/// Holds a node's local TRS state together with lazily rebuilt matrix
/// caches. Rotation is stored twice, as XYZ Euler angles in degrees and as a
/// quaternion; every setter re-derives one from the other.
///
/// Matrix caches live in [`Cell`]s so that reads can rebuild them through a
/// shared borrow. The world matrices depend on the parent chain and are
/// rebuilt by [`transform_system`](crate::scene::transform_system).
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3,
    quaternion: Quat,
    scale: Vec3,

    local_matrix: Cell<Mat4>,
    pub(crate) world_matrix: Cell<Mat4>,
    pub(crate) world_normal_matrix: Cell<Mat4>,

    local_matrix_dirty: Cell<bool>,
    pub(crate) world_matrix_dirty: Cell<bool>,
    pub(crate) world_normal_matrix_dirty: Cell<bool>,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            quaternion: Quat::IDENTITY,
            scale: Vec3::ONE,

            local_matrix: Cell::new(Mat4::IDENTITY),
            world_matrix: Cell::new(Mat4::IDENTITY),
            world_normal_matrix: Cell::new(Mat4::IDENTITY),

            local_matrix_dirty: Cell::new(true),
            world_matrix_dirty: Cell::new(true),
            world_normal_matrix_dirty: Cell::new(true),
        }
    }

    // ========================================================================
    // Setters
    // ========================================================================

    /// Sets the local position. `None` resets to the origin.
    pub fn set_position(&mut self, position: impl Into<Option<Vec3>>) {
        self.position = position.into().unwrap_or(Vec3::ZERO);
        self.mark_dirty();
    }

    /// Sets the local rotation as XYZ Euler angles in degrees. `None` resets
    /// to no rotation.
    pub fn set_rotation(&mut self, degrees: impl Into<Option<Vec3>>) {
        self.rotation = degrees.into().unwrap_or(Vec3::ZERO);
        self.quaternion = euler_to_quat(self.rotation);
        self.mark_dirty();
    }

    /// Sets the local rotation quaternion. `None` resets to identity; a
    /// degenerate quaternion is treated as identity.
    pub fn set_quaternion(&mut self, quaternion: impl Into<Option<Quat>>) {
        self.quaternion = normalize_or_identity(quaternion.into().unwrap_or(Quat::IDENTITY));
        self.rotation = quat_to_euler(self.quaternion);
        self.mark_dirty();
    }

    /// Sets the local scale. `None` resets to `(1, 1, 1)`.
    pub fn set_scale(&mut self, scale: impl Into<Option<Vec3>>) {
        self.scale = scale.into().unwrap_or(Vec3::ONE);
        self.mark_dirty();
    }

    /// Sets the local matrix directly.
    ///
    /// The matrix becomes the authoritative local matrix (the local cache is
    /// clean afterwards) and is decomposed into position, quaternion and
    /// scale for reads. Shear cannot be represented by the decomposition and
    /// is lost at the next TRS setter.
    pub fn set_matrix(&mut self, matrix: impl Into<Option<Mat4>>) {
        let matrix = matrix.into().unwrap_or(Mat4::IDENTITY);
        let (scale, quaternion, position) = matrix.to_scale_rotation_translation();

        self.position = position;
        self.quaternion = normalize_or_identity(quaternion);
        self.rotation = quat_to_euler(self.quaternion);
        self.scale = scale;

        self.local_matrix.set(matrix);
        self.local_matrix_dirty.set(false);
        self.world_matrix_dirty.set(true);
        self.world_normal_matrix_dirty.set(true);
    }

    /// Rotates by `degrees` about `axis`, expressed in the node's own frame.
    ///
    /// The axis is used as given; pass a unit vector for a pure rotation.
    pub fn rotate(&mut self, axis: Vec3, degrees: f32) {
        let delta = angle_axis_to_quat(axis, degrees.to_radians());
        self.quaternion *= delta;
        self.rotation = quat_to_euler(self.quaternion);
        self.mark_dirty();
    }

    /// Moves `distance` along `axis`, where `axis` is in the node's rotated
    /// frame.
    pub fn translate(&mut self, axis: Vec3, distance: f32) {
        self.position += self.quaternion * axis * distance;
        self.mark_dirty();
    }

    /// Flags the local matrix for rebuild. The world matrix depends on it and
    /// is flagged as well.
    pub fn mark_dirty(&mut self) {
        self.local_matrix_dirty.set(true);
        self.world_matrix_dirty.set(true);
        self.world_normal_matrix_dirty.set(true);
    }

    // ========================================================================
    // Getters
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// XYZ Euler angles in degrees.
    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    #[inline]
    #[must_use]
    pub fn quaternion(&self) -> Quat {
        self.quaternion
    }

    #[inline]
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Local matrix (T · R · S), rebuilt if stale.
    pub fn local_matrix(&self) -> Mat4 {
        if self.local_matrix_dirty.get() {
            self.local_matrix.set(Mat4::from_scale_rotation_translation(
                self.scale,
                self.quaternion,
                self.position,
            ));
            self.local_matrix_dirty.set(false);
        }
        self.local_matrix.get()
    }

    #[inline]
    #[must_use]
    pub fn is_local_matrix_dirty(&self) -> bool {
        self.local_matrix_dirty.get()
    }

    #[inline]
    #[must_use]
    pub fn is_world_matrix_dirty(&self) -> bool {
        self.world_matrix_dirty.get()
    }

    #[inline]
    #[must_use]
    pub fn is_world_normal_matrix_dirty(&self) -> bool {
        self.world_normal_matrix_dirty.get()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

fn euler_to_quat(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}

fn quat_to_euler(q: Quat) -> Vec3 {
    let (x, y, z) = q.to_euler(EulerRot::XYZ);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

// Unnormalized axes scale the vector part, matching the raw angle-axis form.
fn angle_axis_to_quat(axis: Vec3, radians: f32) -> Quat {
    let (s, c) = (radians * 0.5).sin_cos();
    Quat::from_xyzw(axis.x * s, axis.y * s, axis.z * s, c)
}

fn normalize_or_identity(q: Quat) -> Quat {
    let len = q.length();
    if len > f32::EPSILON && len.is_finite() {
        q / len
    } else {
        Quat::IDENTITY
    }
}
