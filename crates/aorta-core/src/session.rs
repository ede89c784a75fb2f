//! Session context owning the model group and pointer state
//!
//! A `Session` is the single owner of the mutable scene state for one mounted
//! view. Rendering hosts feed it the batch load result, pointer poses and input
//! events, and read back mesh world matrices and the hover label once per frame.
//! Nothing here touches a renderer, so the whole interaction model runs headless.

use glam::Mat4;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::hover::HoverReporter;
use crate::interaction::{Hand, InteractionController, InteractionSettings, PointerEvent};
use crate::load::LoadError;
use crate::normalize::{NormalizeError, Normalizer};
use crate::scene::{Frame, Group, Mesh, SceneError};
use crate::transform::Pose;

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Result of handing a batch load result to the session
#[derive(Debug)]
pub enum LoadOutcome {
    /// Group populated and normalized
    Ready { parts: usize },
    /// A part failed to load; the group stays empty
    Failed(LoadError),
    /// The meshes were not usable; the group stays as it was
    Rejected(SessionError),
    /// The session was unmounted before the load finished
    Discarded,
}

impl LoadOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadOutcome::Ready { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Number of parts a complete model has
    pub expected_parts: usize,
    pub normalizer: Normalizer,
    pub interaction: InteractionSettings,
}

impl SessionSettings {
    pub fn for_parts(expected_parts: usize) -> Self {
        Self {
            expected_parts,
            normalizer: Normalizer::default(),
            interaction: InteractionSettings::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    group: Group,
    controller: InteractionController,
    normalizer: Normalizer,
    hover: HoverReporter,
    expected_parts: usize,
    label: String,
    mounted: bool,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            group: Group::new(),
            controller: InteractionController::new(settings.interaction),
            normalizer: settings.normalizer,
            hover: HoverReporter,
            expected_parts: settings.expected_parts,
            label: String::new(),
            mounted: true,
        }
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn expected_parts(&self) -> usize {
        self.expected_parts
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// True once the group is loaded and normalized; interaction is gated on this
    pub fn is_ready(&self) -> bool {
        self.mounted && self.group.is_normalized()
    }

    /// Current hover label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Accept the result of a batch load.
    ///
    /// On success the meshes become the group's children and the group is
    /// normalized, exactly once. Failures leave the group empty. Results arriving
    /// after `unmount` are dropped.
    pub fn complete_load(&mut self, result: Result<Vec<Mesh>, LoadError>) -> LoadOutcome {
        if !self.mounted {
            debug!("Load finished after unmount, discarded");
            return LoadOutcome::Discarded;
        }

        let meshes = match result {
            Ok(meshes) => meshes,
            Err(e) => {
                error!(part = %e.part, error = %e, "Model load failed");
                return LoadOutcome::Failed(e);
            }
        };

        if meshes.len() != self.expected_parts {
            let err = NormalizeError::Incomplete {
                expected: self.expected_parts,
                actual: meshes.len(),
            };
            warn!(error = %err, "Rejected incomplete model");
            return LoadOutcome::Rejected(err.into());
        }

        if let Err(e) = self.group.install(meshes) {
            warn!(error = %e, "Rejected second model load");
            return LoadOutcome::Rejected(e.into());
        }

        if let Err(e) = self.normalizer.normalize(&mut self.group, self.expected_parts) {
            error!(error = %e, "Model normalization failed");
            self.group.clear();
            return LoadOutcome::Rejected(e.into());
        }

        info!(parts = self.group.len(), "Model ready");
        LoadOutcome::Ready {
            parts: self.group.len(),
        }
    }

    pub fn set_pointer_pose(&mut self, hand: Hand, pose: Pose) {
        if self.mounted {
            self.controller.set_pose(hand, pose);
        }
    }

    /// Handle one input event. Events before the model is ready are ignored.
    pub fn handle(&mut self, hand: Hand, event: PointerEvent) -> bool {
        if !self.is_ready() {
            debug!(?hand, ?event, "Input before the model is ready, ignored");
            return false;
        }
        self.controller.handle(hand, event, &mut self.group)
    }

    /// Per-frame update: recompute the hover label from both pointer rays
    pub fn tick(&mut self) -> &str {
        if self.is_ready() {
            let rays = Hand::ALL.map(|hand| self.controller.pointer(hand).pose.ray());
            let parent_world = self.parent_world();
            self.label = self.hover.report(&self.group, &rays, &parent_world);
        } else {
            self.label.clear();
        }
        &self.label
    }

    pub fn frame_world(&self, frame: Frame) -> Mat4 {
        self.controller.frame_world(frame)
    }

    /// World matrix of the group's current parent frame
    pub fn parent_world(&self) -> Mat4 {
        self.frame_world(self.group.parent())
    }

    pub fn mesh_world_matrix(&self, index: usize) -> Option<Mat4> {
        self.group.mesh_world_matrix(index, &self.parent_world())
    }

    /// Show or hide a part by alias
    pub fn set_part_visible(&mut self, alias: &str, visible: bool) -> bool {
        self.group.set_visible(alias, visible)
    }

    /// Tear down: drop the model and ignore every later load result and event
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.controller.reset();
        self.group.clear();
        self.label.clear();
        info!("Session unmounted");
    }
}
