//! AnimationSystem Tests
//!
//! Tests for:
//! - Driving several animators against a host SlotMap
//! - Missing targets logged and skipped
//! - Shared build session for property overrides

mod common;

use slotmap::{DefaultKey, SlotMap};

use common::*;
use kinema::animation::{
    AnimatedComponent, AnimationProperty, AnimationSequence, AnimationSystem, TimelineNode,
};
use kinema::KinemaError;

fn fade(to: f32) -> AnimatedComponent<Sprite> {
    AnimatedComponent::default().with_sequence(
        AnimationSequence::for_channel("alpha", alpha_channel())
            .with_node(TimelineNode::field(0.0, 0.0))
            .with_node(TimelineNode::field(1.0, to).with_property("gain").with_callback("faded")),
    )
}

#[test]
fn system_drives_every_animator() {
    init_logger();
    let mut sprites: SlotMap<DefaultKey, Sprite> = SlotMap::new();
    let a = sprites.insert(Sprite::default());
    let b = sprites.insert(Sprite::default());

    let mut system = AnimationSystem::default();
    system.properties.insert(AnimationProperty::new("gain", 1.0));
    let animator_a = system.add(a, fade(1.0));
    system.add(b, fade(2.0));
    assert_eq!(system.len(), 2);
    assert_eq!(system.target_of(animator_a), Some(a));

    let reports = system.build_all(&sprites);
    assert!(reports.iter().all(|(_, report)| report.warnings.is_empty()));

    let events = system.update(0.5, &mut sprites);
    // The tween's callback sits at its start
    assert_eq!(events.len(), 2);
    assert!(approx(sprites[a].alpha, 0.5));
    assert!(approx(sprites[b].alpha, 1.0));
}

#[test]
fn overrides_are_shared_by_one_build_session() {
    let mut sprites: SlotMap<DefaultKey, Sprite> = SlotMap::new();
    let a = sprites.insert(Sprite::default());
    let b = sprites.insert(Sprite::default());

    let mut system = AnimationSystem::default();
    system.properties.insert(AnimationProperty::new("gain", 1.0));
    system.add(a, fade(1.0));
    system.add(b, fade(1.0));

    system.properties.set_value_anim("gain", 4.0);
    system.build_all(&sprites);
    system.update(1.0, &mut sprites);
    assert!(approx(sprites[a].alpha, 4.0));
    assert!(approx(sprites[b].alpha, 4.0));

    // Consumed by the session above
    assert!(!system.properties.get("gain").is_some_and(AnimationProperty::has_value_anim));
}

#[test]
fn missing_target_is_skipped() {
    let mut sprites: SlotMap<DefaultKey, Sprite> = SlotMap::new();
    let a = sprites.insert(Sprite::default());
    let b = sprites.insert(Sprite::default());

    let mut system = AnimationSystem::default();
    system.properties.insert(AnimationProperty::new("gain", 1.0));
    let gone = system.add(a, fade(1.0));
    system.add(b, fade(1.0));

    sprites.remove(a);
    let reports = system.build_all(&sprites);
    let (_, report) = reports.iter().find(|(key, _)| *key == gone).unwrap();
    assert!(matches!(report.warnings.as_slice(), [KinemaError::MissingTarget(_)]));

    let events = system.update(0.5, &mut sprites);
    assert!(events.iter().all(|(key, _)| *key != gone));
    assert!(approx(sprites[b].alpha, 0.5));
}

#[test]
fn target_removed_after_build_is_skipped_on_update() {
    let mut sprites: SlotMap<DefaultKey, Sprite> = SlotMap::new();
    let a = sprites.insert(Sprite::default());

    let mut system = AnimationSystem::default();
    system.properties.insert(AnimationProperty::new("gain", 1.0));
    system.add(a, fade(1.0));
    system.build_all(&sprites);

    sprites.remove(a);
    assert!(system.update(0.5, &mut sprites).is_empty());
}

#[test]
fn removing_an_animator_drops_its_callbacks() {
    let mut sprites: SlotMap<DefaultKey, Sprite> = SlotMap::new();
    let a = sprites.insert(Sprite::default());

    let mut system = AnimationSystem::default();
    system.properties.insert(AnimationProperty::new("gain", 1.0));
    let key = system.add(a, fade(1.0));
    system.build_all(&sprites);

    let component = system.remove(key);
    assert!(component.is_some());
    assert!(system.is_empty());
    assert!(system.update(1.0, &mut sprites).is_empty());
    assert!(approx(sprites[a].alpha, 0.0));
}
