mod common;

use keyline_core::{
    Animation, Animator, ChannelKind, ChannelRef, Component, Config, DataPoint, EditSession,
    FillValue, Interpolation, KeyframeData, NodeId, NumericOnly, TimelineError,
};

fn no_snapping() -> Config {
    Config {
        snapping: 0.0,
        ..Config::default()
    }
}

fn set(animator: &mut Animator, channel: ChannelKind, time: f64, v: [f64; 3], cfg: &Config) {
    animator
        .create_keyframe(channel, time, Some(FillValue::Vector(v)), cfg, &NumericOnly)
        .unwrap()
        .unwrap();
}

#[test]
fn freezing_a_rotation_captures_the_current_pose() {
    let cfg = Config::default();
    let mut arm = Animator::bone(NodeId::new(), "arm");
    set(&mut arm, ChannelKind::Rotation, 0.0, [0.0, 0.0, 0.0], &cfg);
    set(&mut arm, ChannelKind::Rotation, 1.0, [90.0, 0.0, 0.0], &cfg);

    let edit = arm
        .create_keyframe(ChannelKind::Rotation, 0.5, None, &cfg, &NumericOnly)
        .unwrap()
        .unwrap();
    assert!(edit.removed.is_empty());
    let kf = &edit.created[0];
    assert_eq!(kf.time, 0.5);
    assert_eq!(kf.data_points, vec![DataPoint::xyz(45.0, 0.0, 0.0)]);
    assert_eq!(kf.interpolation, Interpolation::Linear);
    assert_eq!(arm.channel(ChannelKind::Rotation).unwrap().len(), 3);
}

#[test]
fn frozen_keyframes_inherit_interpolation_from_the_closest_neighbour() {
    let cfg = no_snapping();
    let mut arm = Animator::bone(NodeId::new(), "arm");
    set(&mut arm, ChannelKind::Position, 0.0, [0.0, 0.0, 0.0], &cfg);
    set(&mut arm, ChannelKind::Position, 3.0, [3.0, 0.0, 0.0], &cfg);
    let far = arm.channel(ChannelKind::Position).unwrap().keyframes()[1].id;
    arm.keyframe_mut(far).unwrap().interpolation = Interpolation::Step;

    let near_step = arm
        .create_keyframe(ChannelKind::Position, 2.5, None, &cfg, &NumericOnly)
        .unwrap()
        .unwrap();
    assert_eq!(near_step.created[0].interpolation, Interpolation::Step);
    let near_linear = arm
        .create_keyframe(ChannelKind::Position, 0.4, None, &cfg, &NumericOnly)
        .unwrap()
        .unwrap();
    assert_eq!(near_linear.created[0].interpolation, Interpolation::Linear);
}

#[test]
fn frozen_values_are_rounded_to_two_digits() {
    let cfg = no_snapping();
    let mut arm = Animator::bone(NodeId::new(), "arm");
    set(&mut arm, ChannelKind::Position, 0.0, [0.0, 0.0, 0.0], &cfg);
    set(&mut arm, ChannelKind::Position, 3.0, [1.0, 0.0, 0.0], &cfg);
    let edit = arm
        .create_keyframe(ChannelKind::Position, 1.0, None, &cfg, &NumericOnly)
        .unwrap()
        .unwrap();
    assert_eq!(edit.created[0].data_points[0].x, Some(Component::Number(0.33)));
}

#[test]
fn frozen_scale_stays_uniform_only_when_the_neighbour_is() {
    let cfg = no_snapping();
    let mut arm = Animator::bone(NodeId::new(), "arm");
    set(&mut arm, ChannelKind::Scale, 0.0, [2.0, 2.0, 2.0], &cfg);
    let first = arm.channel(ChannelKind::Scale).unwrap().keyframes()[0].id;
    arm.keyframe_mut(first).unwrap().uniform = true;

    let edit = arm
        .create_keyframe(ChannelKind::Scale, 1.0, None, &cfg, &NumericOnly)
        .unwrap()
        .unwrap();
    assert!(edit.created[0].uniform);

    let mut leg = Animator::bone(NodeId::new(), "leg");
    set(&mut leg, ChannelKind::Scale, 0.0, [2.0, 1.0, 2.0], &cfg);
    let first = leg.channel(ChannelKind::Scale).unwrap().keyframes()[0].id;
    leg.keyframe_mut(first).unwrap().uniform = true;
    let edit = leg
        .create_keyframe(ChannelKind::Scale, 1.0, None, &cfg, &NumericOnly)
        .unwrap()
        .unwrap();
    assert!(!edit.created[0].uniform);
}

#[test]
fn empty_channels_start_from_the_default_value() {
    let cfg = Config::default();
    let mut arm = Animator::bone(NodeId::new(), "arm");
    let edit = arm
        .create_keyframe(ChannelKind::Scale, 1.0, None, &cfg, &NumericOnly)
        .unwrap()
        .unwrap();
    assert_eq!(edit.created[0].data_points, vec![DataPoint::uniform(1.0)]);
}

#[test]
fn new_keyframes_snap_and_replace_neighbours() {
    let cfg = Config::default();
    let mut arm = Animator::bone(NodeId::new(), "arm");
    set(&mut arm, ChannelKind::Position, 1.0, [1.0, 0.0, 0.0], &cfg);
    let old = arm.keyframes().next().unwrap().id;

    // 1.01 snaps to 1.0 on the 24 fps grid
    let edit = arm
        .create_keyframe(
            ChannelKind::Position,
            1.01,
            Some(FillValue::Vector([2.0, 0.0, 0.0])),
            &cfg,
            &NumericOnly,
        )
        .unwrap()
        .unwrap();
    assert_eq!(edit.created[0].time, 1.0);
    assert_eq!(edit.removed.len(), 1);
    assert_eq!(edit.removed[0].id, old);
    assert_eq!(arm.keyframes().count(), 1);
}

#[test]
fn replacement_without_snapping_uses_a_fixed_window() {
    let cfg = no_snapping();
    let mut arm = Animator::bone(NodeId::new(), "arm");
    set(&mut arm, ChannelKind::Position, 1.0, [1.0, 0.0, 0.0], &cfg);
    set(&mut arm, ChannelKind::Position, 1.02, [1.0, 0.0, 0.0], &cfg);
    assert_eq!(arm.keyframes().count(), 2);

    let edit = arm
        .create_keyframe(ChannelKind::Position, 1.005, None, &cfg, &NumericOnly)
        .unwrap()
        .unwrap();
    assert_eq!(edit.removed.len(), 1);
    assert_eq!(edit.removed[0].time, 1.0);
    let times: Vec<f64> = arm.keyframes().map(|k| k.time).collect();
    assert_eq!(times, vec![1.02, 1.005]);
}

#[test]
fn unknown_channels_are_ignored() {
    let mut arm = Animator::bone(NodeId::new(), "arm");
    let data = KeyframeData {
        id: None,
        channel: ChannelRef::Name("opacity".into()),
        time: 0.0,
        data_points: vec![],
        interpolation: Interpolation::Linear,
        uniform: false,
    };
    assert_eq!(arm.add_keyframe(data.clone()).unwrap(), None);
    let by_index = KeyframeData {
        channel: ChannelRef::Index(7),
        ..data
    };
    assert_eq!(arm.add_keyframe(by_index).unwrap(), None);
    assert_eq!(arm.keyframes().count(), 0);
}

#[test]
fn loads_keep_ids_and_times_as_given() {
    let mut arm = Animator::bone(NodeId::new(), "arm");
    let data: KeyframeData = serde_json::from_str(
        r#"{"uuid":"6f1c6a5e-3d1e-4c57-9d8f-2f0e9b3f4a10","channel":0,"time":0.013,
            "data_points":[{"x":5,"y":0,"z":0}]}"#,
    )
    .unwrap();
    let id = arm.add_keyframe(data).unwrap().unwrap();
    assert_eq!(id.to_string(), "6f1c6a5e-3d1e-4c57-9d8f-2f0e9b3f4a10");
    let kf = arm.keyframe(id).unwrap();
    assert_eq!(kf.channel, ChannelKind::Rotation);
    assert_eq!(kf.time, 0.013);
}

#[test]
fn timeline_channel_is_load_only_and_holds_one_marker() {
    let cfg = Config::default();
    let mut fx = Animator::effects();
    let err = fx
        .create_keyframe(ChannelKind::Timeline, 0.0, None, &cfg, &NumericOnly)
        .unwrap_err();
    assert_eq!(err.category(), "channel");

    let marker = |time| KeyframeData {
        id: None,
        channel: ChannelRef::Name("timeline".into()),
        time,
        data_points: vec![],
        interpolation: Interpolation::Linear,
        uniform: false,
    };
    assert!(fx.add_keyframe(marker(0.0)).unwrap().is_some());
    assert_eq!(
        fx.add_keyframe(marker(1.0)).unwrap_err(),
        TimelineError::ChannelFull {
            channel: ChannelKind::Timeline,
            capacity: 1
        }
    );
}

#[test]
fn sound_channel_rejects_keyframes_beyond_capacity() {
    let cfg = Config::default();
    let mut fx = Animator::effects();
    for i in 0..1000 {
        fx.create_keyframe(
            ChannelKind::Sound,
            i as f64,
            Some(FillValue::DataPoints(vec![DataPoint::cue("a.ogg")])),
            &cfg,
            &NumericOnly,
        )
        .unwrap()
        .unwrap();
    }
    assert!(fx.channel(ChannelKind::Sound).unwrap().is_full());
    let err = fx
        .create_keyframe(ChannelKind::Sound, 5000.0, None, &cfg, &NumericOnly)
        .unwrap_err();
    assert!(matches!(err, TimelineError::ChannelFull { capacity: 1000, .. }));
}

#[test]
fn full_sound_channel_still_replaces_at_an_existing_time() {
    let cfg = Config::default();
    let mut fx = Animator::effects();
    for i in 0..1000 {
        fx.create_keyframe(
            ChannelKind::Sound,
            i as f64,
            Some(FillValue::DataPoints(vec![DataPoint::cue("a.ogg")])),
            &cfg,
            &NumericOnly,
        )
        .unwrap()
        .unwrap();
    }
    let old = fx
        .find_keyframe_near(ChannelKind::Sound, 5.0, cfg.replace_epsilon())
        .map(|k| k.id)
        .unwrap();

    let edit = fx
        .create_keyframe(
            ChannelKind::Sound,
            5.0,
            Some(FillValue::DataPoints(vec![DataPoint::cue("b.ogg")])),
            &cfg,
            &NumericOnly,
        )
        .unwrap()
        .unwrap();
    assert_eq!(edit.removed.len(), 1);
    assert_eq!(edit.removed[0].id, old);
    let channel = fx.channel(ChannelKind::Sound).unwrap();
    assert_eq!(channel.len(), 1000);
    assert_eq!(
        channel.find_near(5.0, cfg.replace_epsilon()).and_then(|k| k.cue_file()),
        Some("b.ogg")
    );
}

#[test]
fn non_finite_times_are_rejected() {
    let mut arm = Animator::bone(NodeId::new(), "arm");
    let err = arm
        .create_keyframe(ChannelKind::Position, f64::INFINITY, None, &Config::default(), &NumericOnly)
        .unwrap_err();
    assert_eq!(err.category(), "validation");
}

#[test]
fn get_or_make_reuses_the_keyframe_under_the_playhead() {
    let cfg = Config::default();
    let mut arm = Animator::bone(NodeId::new(), "arm");
    set(&mut arm, ChannelKind::Rotation, 1.0, [10.0, 0.0, 0.0], &cfg);
    let existing = arm.keyframes().next().unwrap().id;

    // half a 1/24 s step is ~0.0208 s
    let found = arm
        .get_or_make_keyframe(ChannelKind::Rotation, 1.02, &cfg, &NumericOnly)
        .unwrap()
        .unwrap();
    assert_eq!(found.before, Some(existing));
    assert_eq!(found.result, existing);
    assert!(found.edit.is_empty());

    let made = arm
        .get_or_make_keyframe(ChannelKind::Rotation, 2.0, &cfg, &NumericOnly)
        .unwrap()
        .unwrap();
    assert_eq!(made.before, None);
    assert_ne!(made.result, existing);
    let kf = arm.keyframe(made.result).unwrap();
    assert_eq!(kf.data_points, vec![DataPoint::xyz(10.0, 0.0, 0.0)]);
}

#[test]
fn removing_and_muting() {
    let cfg = Config::default();
    let mut arm = Animator::bone(NodeId::new(), "arm");
    set(&mut arm, ChannelKind::Scale, 0.0, [1.0, 1.0, 1.0], &cfg);
    let id = arm.keyframes().next().unwrap().id;
    assert_eq!(arm.remove_keyframe(id).map(|k| k.id), Some(id));
    assert!(arm.remove_keyframe(id).is_none());

    assert!(arm.toggle_muted(ChannelKind::Rotation));
    assert!(!arm.is_muted(ChannelKind::Position));
}

#[test]
fn session_edits_track_selection_and_length() {
    let mut anim = Animation::new("wave");
    let mut session = EditSession::new(Config::default());
    let arm = anim.bone_animator(NodeId::new(), "arm").id();

    let first = session
        .create_keyframe(
            &mut anim,
            arm,
            ChannelKind::Position,
            Some(FillValue::Vector([1.0, 0.0, 0.0])),
            Some(3.0),
            true,
            &NumericOnly,
        )
        .unwrap()
        .unwrap();
    let first_id = first.created[0].id;
    assert_eq!(session.selected_keyframes(), &[(arm, first_id)]);
    assert_eq!(anim.length, 3.0);

    // Replacing the selected keyframe drops it from the selection.
    session.set_time(3.0).unwrap();
    let second = session
        .create_keyframe(&mut anim, arm, ChannelKind::Position, None, None, false, &NumericOnly)
        .unwrap()
        .unwrap();
    assert_eq!(second.removed[0].id, first_id);
    assert!(session.selected_keyframes().is_empty());

    let removed = session
        .remove_keyframe(&mut anim, second.created[0].id)
        .unwrap();
    assert_eq!(removed.removed.len(), 1);
    assert!(matches!(
        session.remove_keyframe(&mut anim, second.created[0].id),
        Err(TimelineError::KeyframeNotFound { .. })
    ));

    assert_eq!(session.toggle_muted(&mut anim, arm, ChannelKind::Scale), Some(true));
    assert_eq!(session.toggle_muted(&mut anim, arm, ChannelKind::Sound), None);
}
