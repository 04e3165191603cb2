use super::{Camera2D, Camera3D};
use crate::scene::{NodeId, Scene};

/// Nodes owning the cameras chosen for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveCameras {
    pub camera_2d: Option<NodeId>,
    pub camera_3d: Option<NodeId>,
}

impl ActiveCameras {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.camera_2d.is_none() && self.camera_3d.is_none()
    }
}

/// Picks one camera of each kind.
///
/// Walks active nodes in pre-order. Among enabled cameras of a kind, the
/// first one marked current wins; otherwise the first enabled one is
/// promoted for this frame. Kinds without an enabled camera stay `None`.
#[must_use]
pub fn find_active_cameras(scene: &Scene) -> ActiveCameras {
    let mut first_2d = None;
    let mut current_2d = None;
    let mut first_3d = None;
    let mut current_3d = None;

    for id in scene.active_nodes() {
        let node = &scene[id];

        for camera in node
            .components()
            .filter_map(|c| c.as_any().downcast_ref::<Camera2D>())
            .filter(|c| c.is_enabled())
        {
            first_2d.get_or_insert(id);
            if camera.is_current() {
                current_2d.get_or_insert(id);
            }
        }

        for camera in node
            .components()
            .filter_map(|c| c.as_any().downcast_ref::<Camera3D>())
            .filter(|c| c.is_enabled())
        {
            first_3d.get_or_insert(id);
            if camera.is_current() {
                current_3d.get_or_insert(id);
            }
        }
    }

    ActiveCameras {
        camera_2d: current_2d.or(first_2d),
        camera_3d: current_3d.or(first_3d),
    }
}
