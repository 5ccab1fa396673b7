//! Playback Tests
//!
//! Tests for:
//! - Callback cues: once per crossing per playthrough
//! - Loop and ping-pong playthroughs re-arming cues
//! - Seek, pause/resume, stop and rebuild semantics
//! - Step callbacks collapsing per-channel events
//! - State refresh for auto-update channels
//! - Grouped field writes

mod common;

use glam::Vec2;

use common::*;
use kinema::animation::{
    AnimatedComponent, AnimationSequence, CallbackEvent, FloatProperty, LoopMode, PlaybackPhase,
    PropertyTable, StatePropertyOptions, TimelineNode, Vector2Property,
};
use kinema::AnimationSettings;

fn names(events: &[CallbackEvent]) -> Vec<&str> {
    events.iter().map(|e| e.name.as_str()).collect()
}

fn cue_sequence() -> AnimationSequence {
    AnimationSequence::for_channel("alpha", alpha_channel())
        .with_node(TimelineNode::field(0.0, 0.0).with_callback("begin"))
        .with_node(TimelineNode::field(1.0, 1.0).with_callback("middle"))
        .with_node(TimelineNode::field(2.0, 0.0).with_callback("end"))
}

fn built(settings: AnimationSettings) -> (AnimatedComponent<Sprite>, Sprite) {
    let mut component = AnimatedComponent::new(settings).with_sequence(cue_sequence());
    let sprite = Sprite::default();
    component.build(&sprite, &mut PropertyTable::new());
    (component, sprite)
}

// ============================================================================
// Callbacks
// ============================================================================

#[test]
fn callbacks_fire_once_at_segment_start() {
    init_logger();
    let (mut component, mut sprite) = built(AnimationSettings::default());

    // Each tween segment begins where the previous keyframe sits
    let events = component.tick(0.1, &mut sprite);
    assert_eq!(names(&events), vec!["begin", "middle"]);
    assert_eq!(events[0].channel, Some(alpha_channel()));

    assert!(component.tick(0.5, &mut sprite).is_empty());
    let events = component.tick(0.5, &mut sprite);
    assert_eq!(names(&events), vec!["end"]);
    assert!(component.tick(5.0, &mut sprite).is_empty());
}

#[test]
fn snapped_keyframe_callback_fires_at_its_time() {
    let sequence = AnimationSequence::for_channel("alpha", alpha_channel())
        .with_node(TimelineNode::field(0.0, 0.0))
        .with_node(TimelineNode::field(1.0, 1.0).snapped().with_callback("pop"));
    let mut component = AnimatedComponent::default().with_sequence(sequence);
    let mut sprite = Sprite::default();
    component.build(&sprite, &mut PropertyTable::new());

    assert!(component.tick(0.9, &mut sprite).is_empty());
    let events = component.tick(0.2, &mut sprite);
    assert_eq!(names(&events), vec!["pop"]);
    assert!(approx(events[0].time, 1.0));
}

#[test]
fn large_step_fires_every_crossed_cue_in_order() {
    let (mut component, mut sprite) = built(AnimationSettings::default());
    let events = component.tick(10.0, &mut sprite);
    assert_eq!(names(&events), vec!["begin", "middle", "end"]);
    assert_eq!(component.phase(), Some(PlaybackPhase::Completed));
}

#[test]
fn loop_rearms_callbacks() {
    let settings = AnimationSettings {
        loop_mode: LoopMode::Loop,
        ..Default::default()
    };
    let sequence = AnimationSequence::for_channel("alpha", alpha_channel())
        .with_node(TimelineNode::field(0.0, 0.0))
        .with_node(TimelineNode::field(1.0, 1.0))
        .with_node(TimelineNode::field(2.0, 0.0).with_callback("tock"));
    let mut component = AnimatedComponent::new(settings).with_sequence(sequence);
    let mut sprite = Sprite::default();
    component.build(&sprite, &mut PropertyTable::new());

    let mut fired = 0;
    for _ in 0..40 {
        fired += component.tick(0.25, &mut sprite).len();
    }
    // 10 seconds over a 2 second timeline; the cue sits at t = 1
    assert_eq!(fired, 5);
    assert!(!component.is_finished());
}

#[test]
fn ping_pong_fires_on_the_way_back() {
    let settings = AnimationSettings {
        loop_mode: LoopMode::PingPong,
        ..Default::default()
    };
    let (mut component, mut sprite) = built(settings);

    assert_eq!(names(&component.tick(0.5, &mut sprite)), vec!["begin", "middle"]);
    assert_eq!(names(&component.tick(1.0, &mut sprite)), vec!["end"]);
    // Bounce off t = 2 and come back past t = 1
    let events = component.tick(2.0, &mut sprite);
    assert_eq!(names(&events), vec!["end"]);
    assert!(approx(sprite.alpha, 0.5));
}

#[test]
fn ping_pong_edge_cue_fires_once_per_bounce() {
    let settings = AnimationSettings {
        loop_mode: LoopMode::PingPong,
        ..Default::default()
    };
    let sequence = AnimationSequence::for_channel("alpha", alpha_channel())
        .with_node(TimelineNode::field(0.0, 0.0))
        .with_node(TimelineNode::field(2.0, 1.0).snapped().with_callback("edge"));
    let mut component = AnimatedComponent::new(settings).with_sequence(sequence);
    let mut sprite = Sprite::default();
    component.build(&sprite, &mut PropertyTable::new());

    assert!(component.tick(1.5, &mut sprite).is_empty());
    let events = component.tick(1.0, &mut sprite);
    assert_eq!(names(&events), vec!["edge"]);
    assert!(approx(events[0].time, 2.0));

    // Back through t = 0 and forward again, landing on the edge
    assert!(component.tick(2.0, &mut sprite).is_empty());
    assert_eq!(names(&component.tick(1.5, &mut sprite)), vec!["edge"]);
}

// ============================================================================
// Transport
// ============================================================================

#[test]
fn seek_skips_earlier_cues() {
    let (mut component, mut sprite) = built(AnimationSettings::default());
    component.seek(1.0);
    let events = component.tick(0.1, &mut sprite);
    // Cues exactly at the seek time still fire
    assert_eq!(names(&events), vec!["end"]);
    assert!(approx(sprite.alpha, 0.9));
}

#[test]
fn pause_freezes_time() {
    let (mut component, mut sprite) = built(AnimationSettings::default());
    component.tick(0.5, &mut sprite);
    component.pause();
    component.tick(1.0, &mut sprite);
    assert!(approx(sprite.alpha, 0.5));
    component.resume();
    component.tick(0.25, &mut sprite);
    assert!(approx(sprite.alpha, 0.75));
}

#[test]
fn time_scale_speeds_up_playback() {
    let settings = AnimationSettings {
        time_scale: 2.0,
        ..Default::default()
    };
    let (mut component, mut sprite) = built(settings);
    component.tick(0.25, &mut sprite);
    assert!(approx(sprite.alpha, 0.5));
}

#[test]
fn stop_drops_pending_callbacks() {
    let (mut component, mut sprite) = built(AnimationSettings::default());
    component.tick(0.5, &mut sprite);
    component.stop();
    assert!(component.schedule().is_none());
    assert!(component.is_finished());
    assert!(component.tick(5.0, &mut sprite).is_empty());
    assert!(approx(sprite.alpha, 0.5));
}

#[test]
fn rebuild_discards_in_flight_schedule() {
    let (mut component, mut sprite) = built(AnimationSettings::default());
    let events = component.tick(0.5, &mut sprite);
    assert_eq!(events.len(), 2);

    component.build(&sprite, &mut PropertyTable::new());
    assert_eq!(component.phase(), Some(PlaybackPhase::Pending));
    let events = component.tick(0.1, &mut sprite);
    assert_eq!(names(&events), vec!["begin", "middle"]);
}

#[test]
fn play_restarts_from_zero() {
    let (mut component, mut sprite) = built(AnimationSettings::default());
    component.tick(10.0, &mut sprite);
    assert!(component.is_finished());

    component.play();
    assert!(!component.is_finished());
    let events = component.tick(0.5, &mut sprite);
    assert_eq!(names(&events), vec!["begin", "middle"]);
    assert!(approx(sprite.alpha, 0.5));
}

// ============================================================================
// Step Callbacks
// ============================================================================

fn two_channel_sequences() -> Vec<AnimationSequence> {
    [position_x(), position_y()]
        .into_iter()
        .map(|channel| {
            AnimationSequence::for_channel("pos", channel)
                .with_node(TimelineNode::field(0.0, 0.0))
                .with_node(TimelineNode::field(1.0, 1.0).snapped().with_callback("landed"))
        })
        .collect()
}

#[test]
fn per_channel_callbacks_by_default() {
    let mut component = AnimatedComponent::default();
    component.sequences = two_channel_sequences();
    let mut sprite = Sprite::default();
    component.build(&sprite, &mut PropertyTable::new());

    let events = component.tick(2.0, &mut sprite);
    assert_eq!(names(&events), vec!["landed", "landed"]);
}

#[test]
fn step_callback_collapses_channels() {
    let mut component = AnimatedComponent::default();
    component.sequences = two_channel_sequences();
    component.step_callback = true;
    let mut sprite = Sprite::default();
    component.build(&sprite, &mut PropertyTable::new());

    let events = component.tick(2.0, &mut sprite);
    assert_eq!(names(&events), vec!["landed"]);
    assert_eq!(events[0].channel, None);
}

#[test]
fn state_callbacks_without_bound_channels_still_fire() {
    let sequence = AnimationSequence::new("states")
        .with_node(TimelineNode::state(0.5, "empty", 1.0).with_callback("ping"));
    let mut component = AnimatedComponent::default()
        .with_sequence(sequence)
        .with_state(SpriteState::named("empty"));
    let mut sprite = Sprite::default();
    let report = component.build(&sprite, &mut PropertyTable::new());
    assert_eq!(report.channels, 0);
    assert_eq!(report.cues, 1);

    let events = component.tick(1.0, &mut sprite);
    assert_eq!(names(&events), vec!["ping"]);
    assert_eq!(events[0].channel, None);
}

// ============================================================================
// Grouped Writes
// ============================================================================

#[test]
fn unanimated_components_keep_live_values() {
    let sequence = AnimationSequence::for_channel("x", position_x())
        .with_node(TimelineNode::field(0.0, 0.0))
        .with_node(TimelineNode::field(1.0, 4.0));
    let mut component = AnimatedComponent::default().with_sequence(sequence);
    let mut sprite = Sprite {
        position: Vec2::new(0.0, 3.0),
        ..Default::default()
    };
    component.build(&sprite, &mut PropertyTable::new());

    component.tick(0.5, &mut sprite);
    assert_eq!(sprite.position, Vec2::new(2.0, 3.0));
}

#[test]
fn removed_list_item_is_skipped_not_fatal() {
    let channel = kinema::animation::FieldKey::item(POINTS, 1).component(0);
    let sequence = AnimationSequence::for_channel("p", channel)
        .with_node(TimelineNode::field(0.0, 0.0))
        .with_node(TimelineNode::field(1.0, 1.0));
    let alpha = AnimationSequence::for_channel("alpha", alpha_channel())
        .with_node(TimelineNode::field(0.0, 0.0))
        .with_node(TimelineNode::field(1.0, 1.0));
    let mut component = AnimatedComponent::default().with_sequence(sequence).with_sequence(alpha);
    let mut sprite = Sprite {
        points: vec![Vec2::ZERO, Vec2::ZERO],
        ..Default::default()
    };
    component.build(&sprite, &mut PropertyTable::new());

    sprite.points.truncate(1);
    component.tick(0.5, &mut sprite);
    assert_eq!(sprite.points.len(), 1);
    assert!(approx(sprite.alpha, 0.5));
}

// ============================================================================
// State Refresh
// ============================================================================

#[derive(Debug, Clone)]
struct Target {
    name: &'static str,
    alpha: f32,
    position: Vec2,
    auto_update: bool,
}

impl kinema::animation::StateBase<Sprite> for Target {
    fn name(&self) -> &str {
        self.name
    }

    fn generate_property_map(&self, _target: &Sprite, map: &mut kinema::animation::PropertyMapBuilder<'_, Sprite>) {
        let live = StatePropertyOptions {
            auto_update: true,
            ..Default::default()
        };
        let alpha = FloatProperty::new(self.alpha);
        let alpha = if self.auto_update { alpha.with_options(live) } else { alpha };
        map.bind(&alpha, kinema::animation::FieldKey::new(ALPHA))
            .bind(&Vector2Property::new(self.position), kinema::animation::FieldKey::new(POSITION));
    }
}

fn refresh_component(auto_update: bool) -> (AnimatedComponent<Sprite>, Sprite) {
    let sequence = AnimationSequence::new("states")
        .with_node(TimelineNode::state(0.0, "goal", 0.0))
        .with_node(TimelineNode::state(1.0, "goal", 1.0));
    let state = Target {
        name: "goal",
        alpha: 1.0,
        position: Vec2::new(10.0, 10.0),
        auto_update,
    };
    let mut component = AnimatedComponent::default().with_sequence(sequence).with_state(state);
    let sprite = Sprite::default();
    component.build(&sprite, &mut PropertyTable::new());
    (component, sprite)
}

fn retarget(component: &mut AnimatedComponent<Sprite>) {
    let state = Target {
        name: "goal",
        alpha: 3.0,
        position: Vec2::new(30.0, 30.0),
        auto_update: true,
    };
    component.states.insert(state);
}

#[test]
fn refresh_updates_auto_update_channels_only() {
    let (mut component, mut sprite) = refresh_component(true);
    component.tick(0.5, &mut sprite);
    assert!(approx(sprite.alpha, 0.5));

    // Position was built one-shot and keeps its original goal
    retarget(&mut component);
    let report = component.refresh_states(&sprite);
    assert_eq!(report.channels, 1);

    component.tick(0.25, &mut sprite);
    assert!(approx(sprite.alpha, 2.25));
    assert!(approx(sprite.position.x, 7.5));
}

#[test]
fn refresh_ignores_one_shot_channels() {
    let (mut component, mut sprite) = refresh_component(false);
    retarget(&mut component);
    let report = component.refresh_states(&sprite);
    assert_eq!(report.channels, 0);

    component.tick(1.0, &mut sprite);
    assert!(approx(sprite.alpha, 1.0));
}
