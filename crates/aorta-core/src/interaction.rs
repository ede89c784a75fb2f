//! Pointer-driven grab, release and scale gestures
//!
//! Two pointer devices drive the model. Each is either idle or holding the
//! group. Select-start casts the device ray at the group's parts and, on a hit,
//! highlights the group and parents it to the device so it follows rigidly.
//! Select-end hands the group back to the scene root without moving it. Squeeze
//! scales every part about the group's bounding-box center: the primary device
//! shrinks, the secondary grows.
//!
//! Only one device can hold the group; a second select-start is ignored rather
//! than stealing it. Events that do not apply in the current state are no-ops.

use glam::Mat4;
use tracing::{debug, info, warn};

use crate::scene::{Frame, Group};
use crate::transform::Pose;

/// Pointer device identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Primary,
    Secondary,
}

impl Hand {
    /// Fixed device order used by hover reporting
    pub const ALL: [Hand; 2] = [Hand::Primary, Hand::Secondary];

    fn index(self) -> usize {
        match self {
            Hand::Primary => 0,
            Hand::Secondary => 1,
        }
    }
}

/// Input events a pointer device emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    SelectStart,
    SelectEnd,
    Squeeze,
}

/// Selection state of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grip {
    #[default]
    Idle,
    Holding,
}

/// What a squeeze on a given device does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqueezeAction {
    Shrink,
    Grow,
}

impl SqueezeAction {
    pub fn for_hand(hand: Hand) -> Self {
        match hand {
            Hand::Primary => SqueezeAction::Shrink,
            Hand::Secondary => SqueezeAction::Grow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub hand: Hand,
    pub pose: Pose,
    pub grip: Grip,
}

/// Squeeze factors and optional limits on the cumulative squeeze factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSettings {
    pub shrink_factor: f32,
    pub grow_factor: f32,
    /// Lowest allowed product of applied factors; `None` for no limit
    pub min_scale: Option<f32>,
    /// Highest allowed product of applied factors; `None` for no limit
    pub max_scale: Option<f32>,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            shrink_factor: 0.98,
            grow_factor: 1.02,
            min_scale: None,
            max_scale: None,
        }
    }
}

impl InteractionSettings {
    pub fn factor(&self, action: SqueezeAction) -> f32 {
        match action {
            SqueezeAction::Shrink => self.shrink_factor,
            SqueezeAction::Grow => self.grow_factor,
        }
    }

    fn allows(&self, total: f32) -> bool {
        self.min_scale.map_or(true, |min| total >= min)
            && self.max_scale.map_or(true, |max| total <= max)
    }
}

/// Per-device selection state and the gestures that act on the group
#[derive(Debug, Clone)]
pub struct InteractionController {
    pointers: [Pointer; 2],
    settings: InteractionSettings,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(InteractionSettings::default())
    }
}

impl InteractionController {
    pub fn new(settings: InteractionSettings) -> Self {
        let pointer = |hand| Pointer {
            hand,
            pose: Pose::default(),
            grip: Grip::Idle,
        };
        Self {
            pointers: [pointer(Hand::Primary), pointer(Hand::Secondary)],
            settings,
        }
    }

    pub fn settings(&self) -> &InteractionSettings {
        &self.settings
    }

    pub fn pointer(&self, hand: Hand) -> &Pointer {
        &self.pointers[hand.index()]
    }

    pub fn set_pose(&mut self, hand: Hand, pose: Pose) {
        self.pointers[hand.index()].pose = pose;
    }

    /// Device currently holding the group
    pub fn holder(&self) -> Option<Hand> {
        self.pointers
            .iter()
            .find(|p| p.grip == Grip::Holding)
            .map(|p| p.hand)
    }

    /// World matrix of a frame
    pub fn frame_world(&self, frame: Frame) -> Mat4 {
        match frame {
            Frame::Scene => Mat4::IDENTITY,
            Frame::Pointer(hand) => self.pointer(hand).pose.to_matrix(),
        }
    }

    /// Dispatch one input event. Returns whether anything changed.
    pub fn handle(&mut self, hand: Hand, event: PointerEvent, group: &mut Group) -> bool {
        match event {
            PointerEvent::SelectStart => self.select_start(hand, group),
            PointerEvent::SelectEnd => self.select_end(hand, group),
            PointerEvent::Squeeze => self.squeeze(hand, group),
        }
    }

    /// Grab the group if the device ray hits one of its parts
    pub fn select_start(&mut self, hand: Hand, group: &mut Group) -> bool {
        if let Some(holder) = self.holder() {
            if holder == hand {
                debug!(?hand, "Select start while already holding, ignored");
            } else {
                warn!(?hand, ?holder, "Group is held by another device, grab rejected");
            }
            return false;
        }

        let pose = self.pointer(hand).pose;
        let parent_world = self.frame_world(group.parent());
        let Some(hit) = group.nearest_hit(&pose.ray(), &parent_world) else {
            debug!(?hand, "Select start missed the model");
            return false;
        };

        group.set_highlight(true);
        group.attach_to(Frame::Pointer(hand), &parent_world, &pose.to_matrix());
        self.pointers[hand.index()].grip = Grip::Holding;

        info!(
            ?hand,
            part = group.mesh(hit.index).map(|m| m.name.as_str()).unwrap_or_default(),
            distance = hit.distance,
            "Grabbed model"
        );
        true
    }

    /// Release the group into the scene root, keeping its apparent pose
    pub fn select_end(&mut self, hand: Hand, group: &mut Group) -> bool {
        if self.pointer(hand).grip != Grip::Holding {
            debug!(?hand, "Select end without a hold, ignored");
            return false;
        }

        let frame_world = self.frame_world(Frame::Pointer(hand));
        group.detach_and_preserve_world_pose(&frame_world);
        group.set_highlight(false);
        self.pointers[hand.index()].grip = Grip::Idle;

        info!(?hand, position = ?group.transform.translation, "Released model");
        true
    }

    /// Scale the group about its bounding-box center
    pub fn squeeze(&mut self, hand: Hand, group: &mut Group) -> bool {
        if group.is_empty() {
            debug!(?hand, "Squeeze before the model loaded, ignored");
            return false;
        }

        let action = SqueezeAction::for_hand(hand);
        let factor = self.settings.factor(action);
        let total = group.squeeze_factor() * factor;
        if !self.settings.allows(total) {
            debug!(?hand, ?action, total, "Squeeze outside the configured scale range, ignored");
            return false;
        }

        let parent_world = self.frame_world(group.parent());
        group.scale_about_center(factor, &parent_world).is_some()
    }

    /// Drop any hold without touching the group
    pub fn reset(&mut self) {
        for pointer in &mut self.pointers {
            pointer.grip = Grip::Idle;
        }
    }
}
