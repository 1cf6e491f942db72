/// The virtual camera whose model, view and projection are being taught
use std::cell::Cell;

use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3};
use tracing::{debug, trace, warn};

use crate::config::{CameraInput, CameraLimits, Viewport, MIN_DEPTH_GAP};
use crate::error::{Result, VisualizerError};
use crate::renderer::{ClipPlaneState, ClipPlanes};

/// Vectors shorter than this count as zero when validating the basis
const BASIS_EPSILON: f32 = 1e-5;

/// The camera's local frame, read off the view matrix rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasisAxes {
    /// Right
    pub u: Vector3<f32>,
    /// Up
    pub v: Vector3<f32>,
    /// Backward (the camera looks along -n)
    pub n: Vector3<f32>,
}

/// Authoritative model/view/projection parameters of the taught camera.
///
/// View and projection are memoized and dropped whenever a parameter they
/// depend on changes; reading them never marks anything stale.
#[derive(Debug, Clone)]
pub struct VirtualCamera {
    eye: Point3<f32>,
    at: Point3<f32>,
    up: Vector3<f32>,
    fov_y_degrees: f32,
    near: f32,
    far: f32,
    viewport: Viewport,
    limits: CameraLimits,
    view_cache: Cell<Option<Matrix4<f32>>>,
    projection_cache: Cell<Option<Matrix4<f32>>>,
}

impl VirtualCamera {
    pub fn new(
        input: &CameraInput,
        limits: CameraLimits,
        viewport: Viewport,
        backend: &mut dyn ClipPlaneState,
    ) -> Result<Self> {
        limits.validate()?;
        validate_basis(&input.eye, &input.at, &input.up)?;

        let mut camera = Self {
            eye: input.eye,
            at: input.at,
            up: input.up,
            fov_y_degrees: limits.fov_min,
            near: limits.near_min,
            far: limits.far_max,
            viewport,
            limits,
            view_cache: Cell::new(None),
            projection_cache: Cell::new(None),
        };
        camera.set_fov(input.fov_y_degrees);
        camera.set_clip_planes(input.near, input.far, backend);

        Ok(camera)
    }

    /// Recompute everything from raw input values.
    ///
    /// A degenerate eye/at/up is rejected before anything is changed. Both
    /// matrices are rebuilt on their next read.
    pub fn apply_input(&mut self, input: &CameraInput, backend: &mut dyn ClipPlaneState) -> Result<()> {
        self.set_eye_at_up(input.eye, input.at, input.up)?;
        self.set_fov(input.fov_y_degrees);
        self.set_clip_planes(input.near, input.far, backend);
        self.invalidate();
        Ok(())
    }

    /// Current raw parameters, in the shape `apply_input` takes
    pub fn input(&self) -> CameraInput {
        CameraInput {
            eye: self.eye,
            at: self.at,
            up: self.up,
            fov_y_degrees: self.fov_y_degrees,
            near: self.near,
            far: self.far,
        }
    }

    pub fn set_eye_at_up(&mut self, eye: Point3<f32>, at: Point3<f32>, up: Vector3<f32>) -> Result<()> {
        if let Err(err) = validate_basis(&eye, &at, &up) {
            warn!(%err, "rejected virtual camera orientation");
            return Err(err);
        }

        self.eye = eye;
        self.at = at;
        self.up = up;
        self.view_cache.set(None);
        debug!(?eye, ?at, ?up, "virtual camera orientation changed");
        Ok(())
    }

    /// Clamp and store the vertical FOV in degrees; returns the stored value
    pub fn set_fov(&mut self, value: f32) -> f32 {
        let fov = clamp_or_min(value, self.limits.fov_min, self.limits.fov_max);
        if fov != self.fov_y_degrees {
            debug!(requested = value, fov, "virtual camera fov changed");
        }
        self.fov_y_degrees = fov;
        self.projection_cache.set(None);
        fov
    }

    /// Clamp near/far, keep `near < far`, and push them to the backend.
    ///
    /// The limits were validated in [`VirtualCamera::new`], so lowering
    /// `near` to make room never takes it under `near_min`.
    pub fn set_clip_planes(&mut self, near: f32, far: f32, backend: &mut dyn ClipPlaneState) -> ClipPlanes {
        let limits = self.limits;
        let mut near = clamp_or_min(near, limits.near_min, limits.near_max);
        let mut far = clamp_or_min(far, limits.far_min, limits.far_max);

        if far - near < MIN_DEPTH_GAP {
            far = (near + MIN_DEPTH_GAP).min(limits.far_max);
            if far - near < MIN_DEPTH_GAP {
                near = far - MIN_DEPTH_GAP;
            }
        }

        self.near = near;
        self.far = far;
        self.projection_cache.set(None);

        let planes = ClipPlanes { near, far };
        backend.set_clip_planes(planes);
        debug!(near, far, "virtual camera clip planes applied");
        planes
    }

    /// Resize to the visualization area; the window size is irrelevant here
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.aspect() != self.viewport.aspect() {
            self.projection_cache.set(None);
        }
        self.viewport = viewport;
    }

    /// Drop memoized matrices so the next read recomputes them
    pub fn invalidate(&mut self) {
        self.view_cache.set(None);
        self.projection_cache.set(None);
    }

    pub fn eye(&self) -> Point3<f32> {
        self.eye
    }

    pub fn at(&self) -> Point3<f32> {
        self.at
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn fov_y_degrees(&self) -> f32 {
        self.fov_y_degrees
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn clip_planes(&self) -> ClipPlanes {
        ClipPlanes {
            near: self.near,
            far: self.far,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.aspect()
    }

    /// Unit vector from eye toward at
    pub fn forward(&self) -> Vector3<f32> {
        (self.at - self.eye).normalize()
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        match self.view_cache.get() {
            Some(view) => view,
            None => {
                let view = self.compute_view();
                self.view_cache.set(Some(view));
                view
            }
        }
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.projection_cache.get() {
            Some(projection) => projection,
            None => {
                let projection = self.compute_projection();
                self.projection_cache.set(Some(projection));
                projection
            }
        }
    }

    pub fn basis_axes(&self) -> BasisAxes {
        let view = self.view_matrix();
        let row = |r: usize| Vector3::new(view[(r, 0)], view[(r, 1)], view[(r, 2)]);
        BasisAxes {
            u: row(0),
            v: row(1),
            n: row(2),
        }
    }

    /// Placement of the little camera icon: at `eye`, local -Y pointing at `at`.
    ///
    /// Only used for drawing the proxy; view and projection never read it.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let axes = self.basis_axes();
        let down = -Vector3::y();
        let forward = self.forward();

        let down_flat = down - axes.u * axes.u.dot(&down);
        let forward_flat = forward - axes.u * axes.u.dot(&forward);
        let angle = axes
            .u
            .dot(&down_flat.cross(&forward_flat))
            .atan2(down_flat.dot(&forward_flat));

        let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(axes.u), angle);
        Matrix4::new_translation(&self.eye.coords) * rotation.to_homogeneous()
    }

    fn compute_view(&self) -> Matrix4<f32> {
        trace!("recomputing virtual camera view matrix");
        Matrix4::look_at_rh(&self.eye, &self.at, &self.up)
    }

    fn compute_projection(&self) -> Matrix4<f32> {
        trace!(aspect = self.aspect(), "recomputing virtual camera projection matrix");
        Matrix4::new_perspective(
            self.aspect(),
            self.fov_y_degrees.to_radians(),
            self.near,
            self.far,
        )
    }
}

/// NaN goes to `min`, everything else is clamped
fn clamp_or_min(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

fn validate_basis(eye: &Point3<f32>, at: &Point3<f32>, up: &Vector3<f32>) -> Result<()> {
    if !eye.coords.iter().all(|c| c.is_finite()) {
        return Err(VisualizerError::NonFinite("eye"));
    }
    if !at.coords.iter().all(|c| c.is_finite()) {
        return Err(VisualizerError::NonFinite("at"));
    }
    if !up.iter().all(|c| c.is_finite()) {
        return Err(VisualizerError::NonFinite("up"));
    }

    let forward = at - eye;
    if forward.norm() < BASIS_EPSILON {
        return Err(VisualizerError::DegenerateBasis("eye and at coincide"));
    }
    if up.norm() < BASIS_EPSILON {
        return Err(VisualizerError::DegenerateBasis("up vector is zero"));
    }
    if forward.normalize().cross(&up.normalize()).norm() < BASIS_EPSILON {
        return Err(VisualizerError::DegenerateBasis("up is parallel to the view direction"));
    }
    Ok(())
}
