//! Scene graph for the rotating cube.
//!
//! A minimal retained scene: one perspective camera looking at a unit cube.
//! Drawing is delegated to a [`Renderer`], so the same scene can be logged
//! headlessly or recorded in tests.

use log::trace;

use crate::binders::Rotation;
use crate::config::RenderConfig;

/// Euler angles in radians, applied X then Y then Z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Euler {
    /// Rotation around X.
    pub x: f64,
    /// Rotation around Y.
    pub y: f64,
    /// Rotation around Z.
    pub z: f64,
}

impl Euler {
    /// Zero rotation.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
}

/// A rectangular cuboid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    /// Size along X.
    pub width: f64,
    /// Size along Y.
    pub height: f64,
    /// Size along Z.
    pub depth: f64,
}

impl BoxGeometry {
    /// A box of the given size.
    pub fn new(width: f64, height: f64, depth: f64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }
}

impl Default for BoxGeometry {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

/// Flat, unlit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicMaterial {
    /// `0xRRGGBB`.
    pub color: u32,
}

/// Geometry plus material plus orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Shape.
    pub geometry: BoxGeometry,
    /// Surface.
    pub material: BasicMaterial,
    /// Orientation.
    pub rotation: Euler,
}

/// A perspective projection camera.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f64,
    /// Width / height.
    pub aspect: f64,
    /// Near clipping plane.
    pub near: f64,
    /// Far clipping plane.
    pub far: f64,
    /// Camera position.
    pub position: [f64; 3],
}

impl PerspectiveCamera {
    /// A camera at the origin.
    pub fn new(fov: f64, aspect: f64, near: f64, far: f64) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            position: [0.0; 3],
        }
    }
}

/// Index of a mesh within its [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshId(usize);

/// Everything that gets drawn.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Scene {
    meshes: Vec<Mesh>,
}

impl Scene {
    /// An empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `mesh` and return its id.
    pub fn add(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    /// Mesh by id.
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    /// Mutable mesh by id.
    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0)
    }

    /// All meshes, in insertion order.
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }
}

/// Draws a scene from a camera.
pub trait Renderer {
    /// Resize the output surface.
    fn set_size(&mut self, width: u32, height: u32);
    /// Draw one frame.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera);
}

/// Renderer that only counts frames and traces the cube's orientation.
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: u64,
    size: (u32, u32),
}

impl LogRenderer {
    /// A renderer with no frames drawn.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Current surface size.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl Renderer for LogRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        self.frames += 1;
        if let Some(mesh) = scene.meshes().first() {
            trace!(
                "frame {}: cube at x={:.3} y={:.3}, camera fov={}",
                self.frames,
                mesh.rotation.x,
                mesh.rotation.y,
                camera.fov
            );
        }
    }
}

/// The scene, its camera, the cube and the renderer, owned together.
pub struct SceneContext {
    scene: Scene,
    camera: PerspectiveCamera,
    cube: MeshId,
    renderer: Box<dyn Renderer>,
    frames: u64,
}

impl SceneContext {
    /// Build the cube scene described by `config`.
    pub fn new(config: &RenderConfig, mut renderer: Box<dyn Renderer>) -> Self {
        let mut camera = PerspectiveCamera::new(config.fov, config.aspect(), config.near, config.far);
        camera.position[2] = config.camera_z;

        let mut scene = Scene::new();
        let cube = scene.add(Mesh {
            geometry: BoxGeometry::default(),
            material: BasicMaterial {
                color: config.cube_color,
            },
            rotation: Euler::ZERO,
        });

        renderer.set_size(config.width, config.height);
        Self {
            scene,
            camera,
            cube,
            renderer,
            frames: 0,
        }
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The camera.
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// The cube mesh.
    pub fn cube(&self) -> &Mesh {
        &self.scene.meshes[self.cube.0]
    }

    /// The cube's x and y rotation.
    pub fn cube_rotation(&self) -> Rotation {
        let rotation = self.cube().rotation;
        Rotation {
            x: rotation.x,
            y: rotation.y,
        }
    }

    /// Set the cube's x and y rotation.
    pub fn set_cube_rotation(&mut self, rotation: Rotation) {
        if let Some(cube) = self.scene.mesh_mut(self.cube) {
            cube.rotation.x = rotation.x;
            cube.rotation.y = rotation.y;
        }
    }

    /// Add `step` to both axes and return the new rotation.
    pub fn advance_cube(&mut self, step: f64) -> Rotation {
        let current = self.cube_rotation();
        let next = Rotation {
            x: current.x + step,
            y: current.y + step,
        };
        self.set_cube_rotation(next);
        next
    }

    /// Draw the scene once.
    pub fn render(&mut self) {
        self.renderer.render(&self.scene, &self.camera);
        self.frames += 1;
    }

    /// Frames drawn through this context.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_matches_render_config() {
        let ctx = SceneContext::new(&RenderConfig::default(), Box::new(LogRenderer::new()));
        let camera = ctx.camera();
        assert_eq!(camera.fov, 75.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
        assert_eq!(camera.position, [0.0, 0.0, 5.0]);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-12);

        let cube = ctx.cube();
        assert_eq!(cube.geometry, BoxGeometry::new(1.0, 1.0, 1.0));
        assert_eq!(cube.material.color, 0x00ff00);
        assert_eq!(cube.rotation, Euler::ZERO);
        assert_eq!(ctx.scene().meshes().len(), 1);
    }

    #[test]
    fn advance_moves_both_axes() {
        let mut ctx = SceneContext::new(&RenderConfig::default(), Box::new(LogRenderer::new()));
        ctx.advance_cube(0.01);
        let rotation = ctx.advance_cube(0.01);
        assert!((rotation.x - 0.02).abs() < 1e-12);
        assert!((rotation.y - 0.02).abs() < 1e-12);
        assert_eq!(ctx.cube().rotation.z, 0.0);
    }

    #[test]
    fn render_counts_frames() {
        let mut ctx = SceneContext::new(&RenderConfig::default(), Box::new(LogRenderer::new()));
        ctx.render();
        ctx.render();
        assert_eq!(ctx.frames(), 2);
    }
}
