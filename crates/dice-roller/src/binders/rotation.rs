use std::cell::RefCell;
use std::rc::Rc;

use collab_client::{SharedMap, SubscriptionId};
use log::{debug, trace};

use crate::scene::SceneContext;
use crate::session::{ROTATION_X_KEY, ROTATION_Y_KEY};

/// Cube rotation about x and y, in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotation {
    /// Rotation about the x axis.
    pub x: f64,
    /// Rotation about the y axis.
    pub y: f64,
}

/// Where the animating participant publishes its rotation.
pub trait RotationSink {
    /// Make `rotation` the shared rotation.
    fn publish(&self, rotation: Rotation);
}

/// Typed view of the rotation map.
#[derive(Debug, Clone)]
pub struct RotationField {
    map: SharedMap,
}

impl RotationField {
    /// Wrap the rotation map.
    pub fn new(map: SharedMap) -> Self {
        Self { map }
    }

    /// Current shared rotation. Missing axes read as zero.
    pub fn read(&self) -> Rotation {
        Rotation {
            x: self.map.get_float(ROTATION_X_KEY).unwrap_or(0.0),
            y: self.map.get_float(ROTATION_Y_KEY).unwrap_or(0.0),
        }
    }

    /// The wrapped map.
    pub fn map(&self) -> &SharedMap {
        &self.map
    }
}

impl RotationSink for RotationField {
    fn publish(&self, rotation: Rotation) {
        self.map.set(ROTATION_X_KEY, rotation.x);
        self.map.set(ROTATION_Y_KEY, rotation.y);
    }
}

/// Applies remote rotation changes to the cube and redraws.
///
/// Only joiners attach a mirror; the originator drives the cube itself.
pub struct RotationMirror {
    map: SharedMap,
    subscription: SubscriptionId,
}

impl RotationMirror {
    /// Copy the current rotation onto the cube and follow remote updates.
    pub fn attach(field: &RotationField, scene: Rc<RefCell<SceneContext>>) -> Self {
        scene.borrow_mut().set_cube_rotation(field.read());

        let source = field.clone();
        let subscription = field.map.on_value_changed(move |change| {
            if change.local || (change.key != ROTATION_X_KEY && change.key != ROTATION_Y_KEY) {
                return;
            }
            let rotation = source.read();
            trace!("rotation: x={}, y={}", rotation.x, rotation.y);
            let mut scene = scene.borrow_mut();
            scene.set_cube_rotation(rotation);
            scene.render();
        });
        debug!("rotation mirror attached as {subscription}");

        Self {
            map: field.map.clone(),
            subscription,
        }
    }

    /// Stop following remote updates.
    pub fn detach(self) {
        self.map.off(self.subscription);
    }
}
