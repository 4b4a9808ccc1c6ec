/// Entrance animation: layers drop in and untwist, labels fade up
use std::f32::consts::FRAC_PI_4;

use crate::scene::Scene;
use crate::tween::{Animate, Ease, Timeline};

/// Seconds between consecutive layers (and consecutive labels)
pub const STAGGER: f32 = 0.28;
/// How far below its resting height a layer starts
pub const DROP_DISTANCE: f32 = 10.0;
/// Extra yaw a layer starts with
pub const SPIN: f32 = 0.8;
/// Yaw every layer settles at
pub const SETTLED_ROTATION_Y: f32 = FRAC_PI_4;
/// Ease curve of every entrance tween unless configured otherwise
pub const ENTRANCE_EASE: Ease = Ease::PowerOut(2);

const FALL_DURATION: f32 = 1.5;
const TURN_DURATION: f32 = 1.2;
const TURN_OFFSET: f32 = 0.2;
const FADE_DURATION: f32 = 1.0;
const FADE_OFFSET: f32 = 0.5;

/// Properties the entrance animation writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimTarget {
    LayerY(usize),
    LayerRotationY(usize),
    LabelOpacity(usize),
}

impl Animate<AnimTarget> for Scene {
    fn property_mut(&mut self, target: AnimTarget) -> Option<&mut f32> {
        match target {
            AnimTarget::LayerY(i) => self.meshes.get_mut(i).map(|m| &mut m.transform.position.y),
            AnimTarget::LayerRotationY(i) => {
                self.meshes.get_mut(i).map(|m| &mut m.transform.rotation.y)
            }
            AnimTarget::LabelOpacity(i) => self.labels.get_mut(i).map(|l| &mut l.opacity),
        }
    }
}

pub struct Entrance;

impl Entrance {
    /// Put every layer and label in its starting pose and queue the tweens.
    ///
    /// Call [`Timeline::advance_to`] with seconds since this call to play it.
    pub fn start(scene: &mut Scene) -> Timeline<AnimTarget> {
        Self::start_with(scene, ENTRANCE_EASE)
    }

    /// [`Entrance::start`] with every tween on the `ease` curve.
    pub fn start_with(scene: &mut Scene, ease: Ease) -> Timeline<AnimTarget> {
        let mut timeline = Timeline::new();

        for (i, layer) in scene.meshes.iter_mut().enumerate() {
            let delay = i as f32 * STAGGER;

            layer.transform.position.y -= DROP_DISTANCE;
            timeline.to(AnimTarget::LayerY(i), layer.rest_y, FALL_DURATION, delay, ease);

            layer.transform.rotation.y += SPIN;
            timeline.to(
                AnimTarget::LayerRotationY(i),
                SETTLED_ROTATION_Y,
                TURN_DURATION,
                delay + TURN_OFFSET,
                ease,
            );
        }

        for (i, label) in scene.labels.iter_mut().enumerate() {
            label.opacity = 0.0;
            timeline.to(
                AnimTarget::LabelOpacity(i),
                1.0,
                FADE_DURATION,
                i as f32 * STAGGER + FADE_OFFSET,
                ease,
            );
        }

        log::debug!(
            "entrance queued: {} tweens over {:.2}s",
            timeline.tweens().len(),
            timeline.duration()
        );
        timeline
    }

    /// Resting pose without animating
    pub fn settle(scene: &mut Scene) {
        for layer in &mut scene.meshes {
            layer.transform.position.y = layer.rest_y;
            layer.transform.rotation.y = SETTLED_ROTATION_Y;
        }
        for label in &mut scene.labels {
            label.opacity = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::ApproxMeasure;
    use crate::layers::default_layers;
    use crate::scene::BUILD_ROTATION_Y;
    use crate::theme::Theme;
    use approx::assert_relative_eq;

    fn scene() -> Scene {
        let theme = Theme::default();
        Scene::build(&theme, &default_layers(&theme), &ApproxMeasure).unwrap()
    }

    #[test]
    fn test_start_pose() {
        let mut scene = scene();
        let timeline = Entrance::start(&mut scene);
        assert_eq!(timeline.tweens().len(), 3 * 2 + 5);
        assert_relative_eq!(scene.meshes[0].transform.position.y, -11.0);
        assert_relative_eq!(scene.meshes[2].transform.rotation.y, BUILD_ROTATION_Y + SPIN);
        assert!(scene.labels.iter().all(|l| l.opacity == 0.0));
        // last label: 4 * 0.28 + 0.5 + 1.0
        assert_relative_eq!(timeline.duration(), 2.62, epsilon = 1e-5);
    }

    #[test]
    fn test_staggered_start() {
        let mut scene = scene();
        let mut timeline = Entrance::start(&mut scene);
        timeline.advance_to(0.2, &mut scene);
        // first layer moving, third still waiting for its 0.56s delay
        assert!(scene.meshes[0].transform.position.y > -11.0);
        assert_relative_eq!(scene.meshes[2].transform.position.y, 2.6 - DROP_DISTANCE);
        assert_relative_eq!(scene.labels[0].opacity, 0.0);
    }

    #[test]
    fn test_custom_ease() {
        let mut default_curve = scene();
        let mut eased = Entrance::start(&mut default_curve);
        let mut linear_curve = scene();
        let mut linear = Entrance::start_with(&mut linear_curve, Ease::Linear);
        assert!(linear.tweens().iter().all(|t| t.ease == Ease::Linear));

        // halfway through the first fall, power2.out is further along
        eased.advance_to(0.75, &mut default_curve);
        linear.advance_to(0.75, &mut linear_curve);
        assert_relative_eq!(linear_curve.meshes[0].transform.position.y, -6.0, epsilon = 1e-5);
        assert!(
            default_curve.meshes[0].transform.position.y
                > linear_curve.meshes[0].transform.position.y
        );
    }

    #[test]
    fn test_settle_matches_end_of_timeline() {
        let mut animated = scene();
        let mut timeline = Entrance::start(&mut animated);
        timeline.advance_to(10.0, &mut animated);

        let mut settled = scene();
        Entrance::settle(&mut settled);
        for (a, b) in animated.meshes.iter().zip(&settled.meshes) {
            assert_eq!(a.transform, b.transform);
        }
    }
}
