use std::sync::Arc;

use glam::{Mat4, Vec3};
use marionette_animation_core::Interpolation;
use marionette_scene_core::{
    Aabb, ArmatureInstance, BufferMode, Document, DrawableTransform, Mesh, Node, SceneError,
    SceneInstance, SceneTemplate, TargetPath, TemplateOptions,
};
use marionette_test_fixtures::builder::DocumentBuilder;
use marionette_test_fixtures::{documents, scenes};

fn approx_vec3(a: Vec3, b: Vec3, eps: f32) {
    assert!(a.abs_diff_eq(b, eps), "left={a:?} right={b:?} eps={eps}");
}

fn translation(m: Mat4) -> Vec3 {
    m.w_axis.truncate()
}

fn build(doc: &Document) -> SceneTemplate {
    SceneTemplate::build(doc, 0, &TemplateOptions::default()).expect("template builds")
}

fn structural_reason(result: Result<SceneTemplate, SceneError>) -> String {
    match result {
        Err(SceneError::Structural { reason }) => reason,
        other => panic!("expected a structural error, got {other:?}"),
    }
}

/// it should place the child of a static parent halfway along its translation curve
#[test]
fn two_node_chain_at_half_time() -> anyhow::Result<()> {
    let doc = scenes::two_node_chain()?;
    let template = build(&doc);
    let child = template.find_node("child").expect("child node");
    let parent = template.find_node("parent").expect("parent node");
    assert!(parent < child);

    let mut armature = ArmatureInstance::new(&template);
    approx_vec3(translation(armature.world_matrix(child)), Vec3::ZERO, 1e-6);

    armature.set_animation_frame(0, 0.5)?;
    approx_vec3(translation(armature.world_matrix(child)), Vec3::new(0.5, 0.0, 0.0), 1e-6);
    assert_eq!(armature.world_matrix(parent), Mat4::IDENTITY);
    assert_eq!(armature.current_track(), Some(0));
    assert_eq!(armature.current_time(), 0.5);

    armature.set_animation_frame(0, 7.0)?;
    approx_vec3(translation(armature.world_matrix(child)), Vec3::X, 1e-6);

    armature.set_rest_pose();
    assert_eq!(armature.current_track(), None);
    approx_vec3(translation(armature.world_matrix(child)), Vec3::ZERO, 1e-6);
    Ok(())
}

/// it should produce one palette matrix per joint, in declared joint order
#[test]
fn skinning_palette_follows_declared_joint_order() -> anyhow::Result<()> {
    let doc = scenes::skinned_chain(3)?;
    let template = build(&doc);
    let mut instance = SceneInstance::new(&template);

    // rest pose: world(joint) * inverse_bind == identity
    assert_eq!(instance.palette(0).len(), 3);
    for m in instance.palette(0) {
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    let bend = template.track_index("bend").expect("bend track");
    instance.set_animation_frame(bend, 1.0)?;
    let drawable = instance.drawables().next().expect("strip drawable");
    let DrawableTransform::Skinned(palette) = drawable.transform() else {
        panic!("strip should be skinned");
    };
    assert_eq!(palette.len(), 3);
    // declared order is tip first: tip bind position (0,2,0) ends at (-1,-1,0)
    approx_vec3(palette[0].transform_point3(Vec3::new(0.0, 2.0, 0.0)), Vec3::new(-1.0, -1.0, 0.0), 1e-3);
    approx_vec3(palette[1].transform_point3(Vec3::Y), Vec3::new(-1.0, 0.0, 0.0), 1e-3);
    approx_vec3(palette[2].transform_point3(Vec3::ZERO), Vec3::ZERO, 1e-3);

    let positions = drawable.world_positions().expect("geometry captured");
    assert_eq!(positions.len(), 6);
    approx_vec3(positions[4], Vec3::new(-1.0, -0.5, 0.0), 1e-3);
    Ok(())
}

/// it should reject a bad track index without touching the current pose
#[test]
fn out_of_range_track_leaves_state_untouched() -> anyhow::Result<()> {
    let doc = scenes::two_node_chain()?;
    let template = build(&doc);
    let mut instance = SceneInstance::new(&template);
    instance.set_animation_frame(0, 0.25)?;
    let before: Vec<Mat4> = instance.armature().world_matrices().to_vec();

    let err = instance.set_animation_frame(5, 0.75).unwrap_err();
    assert_eq!(err, SceneError::TrackOutOfRange { index: 5, count: 1 });
    assert!(err.is_recoverable());
    assert_eq!(instance.armature().world_matrices(), before.as_slice());
    assert_eq!(instance.armature().current_time(), 0.25);

    let err = instance.set_animation_frame_by_name("missing", 0.75).unwrap_err();
    assert!(matches!(err, SceneError::TrackNotFound { .. }));
    assert_eq!(instance.armature().world_matrices(), before.as_slice());
    Ok(())
}

/// it should let the source document go once the template is built
#[test]
fn template_does_not_retain_document() -> anyhow::Result<()> {
    let doc = Arc::new(scenes::skinned_chain(2)?);
    let weak_doc = Arc::downgrade(&doc);
    let weak_bytes = Arc::downgrade(&doc.buffers[0].0);

    let template = SceneTemplate::build(&doc, 0, &TemplateOptions::default())?;
    drop(doc);
    assert!(weak_doc.upgrade().is_none());
    assert!(weak_bytes.upgrade().is_none());

    let mut instance = SceneInstance::new(&template);
    instance.set_animation_frame(0, 0.5)?;
    assert_eq!(instance.palette(0).len(), 2);
    Ok(())
}

/// it should keep only the byte buffers alive in shared mode
#[test]
fn shared_mode_keeps_buffers_not_document() -> anyhow::Result<()> {
    let doc = Arc::new(scenes::skinned_chain(2)?);
    let weak_doc = Arc::downgrade(&doc);
    let weak_bytes = Arc::downgrade(&doc.buffers[0].0);
    let options = TemplateOptions {
        buffer_mode: BufferMode::Shared,
        ..Default::default()
    };

    let template = SceneTemplate::build(&doc, 0, &options)?;
    drop(doc);
    assert!(weak_doc.upgrade().is_none());
    assert!(weak_bytes.upgrade().is_some());

    let geometry = template.drawables()[0].geometry().expect("geometry captured");
    assert!(geometry.positions().is_shared());
    assert_eq!(geometry.vertex_count(), 4);

    drop(template);
    assert!(weak_bytes.upgrade().is_none());
    Ok(())
}

/// it should skip geometry capture but still compute bounds when asked
#[test]
fn geometry_capture_is_optional() -> anyhow::Result<()> {
    let doc = scenes::skinned_chain(2)?;
    let options = TemplateOptions {
        capture_geometry: false,
        ..Default::default()
    };
    let template = SceneTemplate::build(&doc, 0, &options)?;
    assert!(template.drawables()[0].geometry().is_none());
    assert!(template.bounds().is_some());
    let instance = SceneInstance::new(&template);
    let drawable = instance.all_drawables().next().expect("drawable");
    assert!(drawable.world_positions().is_none());
    Ok(())
}

/// it should report dangling and unreachable references at build time
#[test]
fn structural_errors_abort_construction() -> anyhow::Result<()> {
    let doc = scenes::two_node_chain()?;
    let reason = structural_reason(SceneTemplate::build(&doc, 3, &TemplateOptions::default()));
    assert!(reason.contains("scene 3"), "{reason}");

    let mut bad_target = doc.clone();
    bad_target.animations[0].channels[0].target.node = 42;
    let reason = structural_reason(SceneTemplate::build(&bad_target, 0, &TemplateOptions::default()));
    assert!(reason.contains("node 42"), "{reason}");

    let mut bad_child = doc.clone();
    bad_child.nodes[1].children.push(9);
    let reason = structural_reason(SceneTemplate::build(&bad_child, 0, &TemplateOptions::default()));
    assert!(reason.contains("node 9"), "{reason}");

    let mut cycle = doc.clone();
    cycle.nodes[0].children.push(1);
    let reason = structural_reason(SceneTemplate::build(&cycle, 0, &TemplateOptions::default()));
    assert!(reason.contains("reached twice"), "{reason}");

    let mut bad_mesh = doc.clone();
    bad_mesh.nodes[0].mesh = Some(0);
    let reason = structural_reason(SceneTemplate::build(&bad_mesh, 0, &TemplateOptions::default()));
    assert!(reason.contains("mesh 0"), "{reason}");

    // joints live under a root the scene does not list
    let mut skinned = scenes::skinned_chain(2)?;
    let holder = skinned.nodes.len() - 1;
    skinned.scenes[0].nodes = vec![holder];
    let reason = structural_reason(SceneTemplate::build(&skinned, 0, &TemplateOptions::default()));
    assert!(reason.contains("skin 0"), "{reason}");

    // channel target outside the scene
    let mut orphan = scenes::two_node_chain()?;
    orphan.nodes.push(Node::default());
    orphan.animations[0].channels[0].target.node = 2;
    let reason = structural_reason(SceneTemplate::build(&orphan, 0, &TemplateOptions::default()));
    assert!(reason.contains("not reachable"), "{reason}");
    Ok(())
}

/// it should surface invalid curves and layouts as structural errors
#[test]
fn malformed_animation_data_is_structural() -> anyhow::Result<()> {
    let mut b = DocumentBuilder::new();
    let node = b.node(Node::default());
    let anim = b.animation("broken");
    b.keyed(
        anim,
        node,
        TargetPath::Translation,
        &[0.0, 0.0],
        &[Vec3::ZERO, Vec3::X],
        Interpolation::Linear,
    )?;
    b.scene(&[node]);
    let doc = b.build();
    let reason = structural_reason(SceneTemplate::build(&doc, 0, &TemplateOptions::default()));
    assert!(reason.contains("does not follow"), "{reason}");

    let mut short = scenes::two_node_chain()?;
    short.accessors[1].count = 10;
    let reason = structural_reason(SceneTemplate::build(&short, 0, &TemplateOptions::default()));
    assert!(reason.contains("accessor 1"), "{reason}");

    let mut huge = scenes::two_node_chain()?;
    huge.accessors[1].count = usize::MAX / 4;
    let reason = structural_reason(SceneTemplate::build(&huge, 0, &TemplateOptions::default()));
    assert!(reason.contains("accessor 1"), "{reason}");
    Ok(())
}

/// it should reject weights channels that disagree with the mesh's morph targets
#[test]
fn weights_channel_must_match_morph_targets() -> anyhow::Result<()> {
    let mut b = DocumentBuilder::new();
    let positions = b.accessor(&[Vec3::ZERO, Vec3::X, Vec3::Y])?;
    let target = b.accessor(&[Vec3::Z, Vec3::Z, Vec3::Z])?;
    let mesh = b.mesh(Mesh {
        positions,
        morph_targets: vec![target],
        ..Default::default()
    });
    let node = b.node(Node {
        mesh: Some(mesh),
        ..Default::default()
    });
    let bare = b.node(Node::default());
    let anim = b.animation("morph");
    b.keyed(
        anim,
        node,
        TargetPath::Weights,
        &[0.0, 1.0],
        &[0.0f32, 0.0, 1.0, 1.0],
        Interpolation::Linear,
    )?;
    b.scene(&[node, bare]);
    let doc = b.build();
    let reason = structural_reason(SceneTemplate::build(&doc, 0, &TemplateOptions::default()));
    assert!(reason.contains("2 morph targets but the mesh has 1"), "{reason}");

    let mut meshless = doc.clone();
    meshless.animations[0].channels[0].target.node = bare;
    let reason =
        structural_reason(SceneTemplate::build(&meshless, 0, &TemplateOptions::default()));
    assert!(reason.contains("without a mesh"), "{reason}");

    let mut matching = doc;
    matching.meshes[0].morph_targets.push(target);
    assert!(SceneTemplate::build(&matching, 0, &TemplateOptions::default()).is_ok());
    Ok(())
}

/// it should hide a node's drawables without hiding its descendants
#[test]
fn visibility_hides_rendering_not_kinematics() -> anyhow::Result<()> {
    let doc: Document = documents::load("blink")?;
    let template = SceneTemplate::build_default(&doc, &TemplateOptions::default())?;
    assert_eq!(template.name(), Some("face"));
    let head = template.find_node("head").expect("head");
    let lid = template.find_node("eyelid").expect("eyelid");
    let blink = template.track_index("blink").expect("blink track");
    assert_eq!(template.track_duration(blink), Some(2.0));

    let mut instance = SceneInstance::new(&template);
    instance.set_animation_frame(blink, 1.5)?;
    assert!(!instance.armature().is_visible(head));
    assert!(instance.armature().is_visible(lid));
    approx_vec3(
        translation(instance.armature().world_matrix(lid)),
        Vec3::new(0.0, 2.0, 0.0),
        1e-6,
    );
    assert_eq!(instance.drawables().count(), 1);
    Ok(())
}

/// it should animate morph weights and apply them to captured geometry
#[test]
fn morph_weights_drive_geometry() -> anyhow::Result<()> {
    let doc: Document = documents::load("blink")?;
    let template = build(&doc);
    let lid = template.find_node("eyelid").expect("eyelid");
    let mut instance = SceneInstance::new(&template);

    instance.set_animation_frame(0, 0.5)?;
    assert!((instance.armature().morph_weights(lid).get(0) - 0.5).abs() < 1e-6);
    let drawable = instance.drawables().next().expect("lid drawable");
    assert_eq!(drawable.mesh(), 0);
    assert_eq!(drawable.node(), lid);
    let positions = drawable.world_positions().expect("geometry");
    approx_vec3(positions[0], Vec3::new(0.0, 2.0, 0.5), 1e-6);
    approx_vec3(positions[1], Vec3::new(1.0, 2.0, 0.5), 1e-6);

    instance.set_rest_pose();
    assert!(instance.armature().morph_weights(lid).is_zero());
    Ok(())
}

/// it should hide a mesh node whose own visibility channel is off
#[test]
fn hidden_drawables_are_skipped() -> anyhow::Result<()> {
    let mut b = DocumentBuilder::new();
    let positions = b.accessor(&[Vec3::ZERO, Vec3::X, Vec3::Y])?;
    let mesh = b.mesh(Mesh {
        positions,
        default_weights: vec![0.25],
        ..Default::default()
    });
    let node = b.node(Node {
        mesh: Some(mesh),
        ..Default::default()
    });
    let anim = b.animation("toggle");
    b.keyed(
        anim,
        node,
        TargetPath::Visibility,
        &[0.0, 1.0],
        &[1.0f32, 0.0],
        Interpolation::Step,
    )?;
    b.scene(&[node]);
    let doc = b.build();
    let template = build(&doc);
    assert!((template.nodes()[0].rest_weights().get(0) - 0.25).abs() < 1e-6);

    let mut instance = SceneInstance::new(&template);
    instance.set_animation_frame(0, 0.5)?;
    assert_eq!(instance.drawables().count(), 1);
    instance.set_animation_frame(0, 1.0)?;
    assert_eq!(instance.drawables().count(), 0);
    assert_eq!(instance.all_drawables().count(), 1);
    assert!(!instance.all_drawables().all(|d| d.is_visible()));
    Ok(())
}

/// it should honour step and cubic samplers read from accessors
#[test]
fn step_and_cubic_channels() -> anyhow::Result<()> {
    let mut b = DocumentBuilder::new();
    let stepper = b.node(Node::default());
    let smooth = b.node(Node::default());
    let anim = b.animation("modes");
    b.keyed(
        anim,
        stepper,
        TargetPath::Scale,
        &[0.0, 1.0],
        &[Vec3::ONE, Vec3::splat(3.0)],
        Interpolation::Step,
    )?;
    // zero tangents: smoothstep from 0 to 2 on X
    b.keyed(
        anim,
        smooth,
        TargetPath::Translation,
        &[0.0, 1.0],
        &[Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, Vec3::X * 2.0, Vec3::ZERO],
        Interpolation::CubicSpline,
    )?;
    b.scene(&[stepper, smooth]);
    let doc = b.build();
    let template = build(&doc);
    let mut armature = ArmatureInstance::new(&template);

    armature.set_animation_frame(0, 0.75)?;
    let stepped = armature.local_matrix(0).x_axis.truncate().length();
    assert!((stepped - 1.0).abs() < 1e-6);
    approx_vec3(translation(armature.world_matrix(1)), Vec3::new(1.6875, 0.0, 0.0), 1e-5);

    armature.set_animation_frame(0, 0.5)?;
    approx_vec3(translation(armature.world_matrix(1)), Vec3::X, 1e-6);
    Ok(())
}

/// it should bound rigid meshes exactly and skinned meshes with a margin
#[test]
fn rest_and_frame_bounds() -> anyhow::Result<()> {
    let mut b = DocumentBuilder::new();
    let positions = b.accessor(&[Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)])?;
    let mesh = b.mesh(Mesh {
        positions,
        ..Default::default()
    });
    let authored = b.mesh(Mesh {
        positions,
        bounds: Some(Aabb {
            min: Vec3::splat(-2.0),
            max: Vec3::splat(2.0),
        }),
        ..Default::default()
    });
    let a = b.node(Node {
        mesh: Some(mesh),
        translation: Some(Vec3::new(10.0, 0.0, 0.0)),
        ..Default::default()
    });
    let c = b.node(Node {
        mesh: Some(authored),
        ..Default::default()
    });
    b.scene(&[a, c]);
    let doc = b.build();
    let template = build(&doc);
    let bounds = template.bounds().expect("bounds");
    assert!(bounds.contains(Vec3::new(11.0, 0.0, 0.0), 1e-4));
    assert!(bounds.contains(Vec3::splat(2.0), 1e-4));
    assert_eq!(template.drawables()[0].local_bounds().map(|s| s.radius), Some(1.0));

    let skinned = scenes::skinned_chain(3)?;
    let template = build(&skinned);
    let rest = template.bounds().expect("skinned bounds");
    let local = template.drawables()[0].local_bounds().expect("local bounds");
    assert!((rest.radius - local.radius * template.skinned_bounds_margin()).abs() < 1e-5);

    let mut instance = SceneInstance::new(&template);
    let hold = template.track_index("hold").expect("hold track");
    instance.set_animation_frame(hold, 2.0)?;
    let moved = instance.world_bounds().expect("frame bounds");
    assert!((moved.center.z - 4.0).abs() < 1e-4, "{moved:?}");
    Ok(())
}

/// it should index tracks by position and by name
#[test]
fn track_queries() -> anyhow::Result<()> {
    let doc = scenes::skinned_chain(2)?;
    let template = build(&doc);
    assert_eq!(template.track_count(), 2);
    assert_eq!(template.track_index("hold"), Some(1));
    assert_eq!(template.track_name(0), Some("bend"));
    assert_eq!(template.track_duration(0), Some(1.0));
    assert_eq!(template.track_duration(1), Some(2.0));
    assert_eq!(template.track_duration(2), None);

    let mut instance = SceneInstance::new(&template);
    instance.set_animation_frame_by_name("hold", 1.0)?;
    assert_eq!(instance.armature().current_track(), Some(1));
    Ok(())
}

/// it should let many instances read one template from different threads
#[test]
fn instances_share_a_template_across_threads() -> anyhow::Result<()> {
    let doc = scenes::skinned_chain(4)?;
    let template = build(&doc);
    drop(doc);

    let results: Vec<Vec3> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let template = &template;
                scope.spawn(move || {
                    let mut instance = SceneInstance::new(template);
                    instance
                        .set_animation_frame(0, i as f32 * 0.25)
                        .expect("track exists");
                    translation(instance.palette(0)[0])
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread finished"))
            .collect()
    });

    let mut serial = SceneInstance::new(&template);
    for (i, got) in results.iter().enumerate() {
        serial.set_animation_frame(0, i as f32 * 0.25)?;
        assert_eq!(*got, translation(serial.palette(0)[0]));
    }
    Ok(())
}
