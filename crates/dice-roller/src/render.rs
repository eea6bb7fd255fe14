//! The per-frame animation step.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::binders::RotationSink;
use crate::scene::SceneContext;
use crate::session::Role;

/// Advances, publishes and redraws the cube once per frame.
///
/// The loop itself only knows how to run a single frame; the participant's
/// event loop calls [`RenderLoop::frame`] on every tick of
/// [`RenderLoop::interval`].
///
/// The originator owns the animation: each frame it adds `step` to both
/// axes and publishes the result. Joiners never publish; their cube is
/// moved by a [`RotationMirror`](crate::binders::RotationMirror) and the loop
/// only redraws it.
pub struct RenderLoop<S> {
    scene: Rc<RefCell<SceneContext>>,
    sink: S,
    role: Role,
    step: f64,
    interval: Duration,
    frames: u64,
}

impl<S: RotationSink> RenderLoop<S> {
    /// A loop drawing `scene` every `interval`.
    pub fn new(
        scene: Rc<RefCell<SceneContext>>,
        sink: S,
        role: Role,
        step: f64,
        interval: Duration,
    ) -> Self {
        Self {
            scene,
            sink,
            role,
            step,
            interval,
            frames: 0,
        }
    }

    /// Run one frame.
    ///
    /// The scene is not borrowed while publishing, so change listeners may
    /// read it.
    pub fn frame(&mut self) {
        if self.role == Role::Originator {
            let rotation = self.scene.borrow_mut().advance_cube(self.step);
            self.sink.publish(rotation);
        }
        self.scene.borrow_mut().render();
        self.frames += 1;
    }

    /// Frames run so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Time between frames.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Who this loop animates for.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The sink rotation is published to.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::binders::Rotation;
    use crate::config::RenderConfig;
    use crate::scene::LogRenderer;

    #[derive(Default)]
    struct Recording {
        published: RefCell<Vec<Rotation>>,
    }

    impl RotationSink for Rc<Recording> {
        fn publish(&self, rotation: Rotation) {
            self.published.borrow_mut().push(rotation);
        }
    }

    struct CountingRenderer(Rc<Cell<u64>>);

    impl crate::scene::Renderer for CountingRenderer {
        fn set_size(&mut self, _width: u32, _height: u32) {}

        fn render(&mut self, _scene: &crate::scene::Scene, _camera: &crate::scene::PerspectiveCamera) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn scene() -> Rc<RefCell<SceneContext>> {
        Rc::new(RefCell::new(SceneContext::new(
            &RenderConfig::default(),
            Box::new(LogRenderer::new()),
        )))
    }

    #[test]
    fn originator_publishes_every_frame() {
        let sink = Rc::new(Recording::default());
        let mut render = RenderLoop::new(
            scene(),
            Rc::clone(&sink),
            Role::Originator,
            0.01,
            Duration::from_millis(16),
        );
        render.frame();
        render.frame();
        render.frame();

        let published = sink.published.borrow();
        assert_eq!(published.len(), 3);
        assert!((published[2].x - 0.03).abs() < 1e-12);
        assert_eq!(published[2].x, published[2].y);
    }

    #[test]
    fn joiner_redraws_without_publishing() {
        let drawn = Rc::new(Cell::new(0));
        let ctx = Rc::new(RefCell::new(SceneContext::new(
            &RenderConfig::default(),
            Box::new(CountingRenderer(Rc::clone(&drawn))),
        )));
        let sink = Rc::new(Recording::default());
        let mut render = RenderLoop::new(
            Rc::clone(&ctx),
            Rc::clone(&sink),
            Role::Joiner,
            0.01,
            Duration::from_millis(16),
        );
        for _ in 0..5 {
            render.frame();
        }

        assert!(sink.published.borrow().is_empty());
        assert_eq!(drawn.get(), 5);
        assert_eq!(ctx.borrow().cube_rotation(), Rotation::default());
    }

    struct SceneReader {
        scene: Rc<RefCell<SceneContext>>,
        seen: RefCell<Vec<Rotation>>,
    }

    impl RotationSink for Rc<SceneReader> {
        fn publish(&self, _rotation: Rotation) {
            let current = self.scene.borrow().cube_rotation();
            self.seen.borrow_mut().push(current);
        }
    }

    #[test]
    fn publishing_may_read_the_scene() {
        let ctx = scene();
        let reader = Rc::new(SceneReader {
            scene: Rc::clone(&ctx),
            seen: RefCell::default(),
        });
        let mut render = RenderLoop::new(
            Rc::clone(&ctx),
            Rc::clone(&reader),
            Role::Originator,
            0.5,
            Duration::from_millis(16),
        );
        render.frame();
        render.frame();

        let seen = reader.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], Rotation { x: 1.0, y: 1.0 });
        assert_eq!(render.frames(), 2);
    }
}
