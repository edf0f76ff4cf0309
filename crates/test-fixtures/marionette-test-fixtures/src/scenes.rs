//! Ready-made documents used across test suites.

use anyhow::Result;
use glam::{Mat4, Quat, Vec3, Vec4};
use marionette_animation_core::Interpolation;
use marionette_codec_core::{ComponentEncoding, ComponentKind};
use marionette_scene_core::{Document, Mesh, Node, Skin, TargetPath};

use crate::builder::DocumentBuilder;

/// Static identity parent with a child translating from the origin to +X over one second.
pub fn two_node_chain() -> Result<Document> {
    let mut b = DocumentBuilder::new();
    let child = b.node(Node {
        name: Some("child".into()),
        ..Default::default()
    });
    let parent = b.node(Node {
        name: Some("parent".into()),
        children: vec![child],
        ..Default::default()
    });
    let anim = b.animation("slide");
    b.keyed(
        anim,
        child,
        TargetPath::Translation,
        &[0.0, 1.0],
        &[Vec3::ZERO, Vec3::X],
        Interpolation::Linear,
    )?;
    b.scene(&[parent]);
    Ok(b.build())
}

/// A vertical chain of `joints` nodes, one unit apart, skinned by a strip mesh.
///
/// The skin lists the joints tip first, the reverse of the hierarchy order.
/// Track "bend" rotates every joint from 0 to 90 degrees about Z (keys stored
/// as normalized i16); track "hold" only translates the root along +Z.
pub fn skinned_chain(joints: usize) -> Result<Document> {
    let mut b = DocumentBuilder::new();

    let mut nodes = Vec::with_capacity(joints);
    for i in 0..joints {
        let node = b.node(Node {
            name: Some(format!("joint{i}")),
            translation: Some(if i == 0 { Vec3::ZERO } else { Vec3::Y }),
            ..Default::default()
        });
        if let Some(&parent) = nodes.last() {
            b.node_mut(parent).children.push(node);
        }
        nodes.push(node);
    }
    let declared: Vec<usize> = nodes.iter().rev().copied().collect();

    // joint j in hierarchy sits at y = j; bind pose inverse translates it back
    let inverse_bind: Vec<Mat4> = declared
        .iter()
        .map(|&n| Mat4::from_translation(Vec3::new(0.0, -(n as f32), 0.0)))
        .collect();
    let ibm = b.accessor(&inverse_bind)?;

    let positions: Vec<Vec3> = (0..joints)
        .flat_map(|j| [Vec3::new(-0.5, j as f32, 0.0), Vec3::new(0.5, j as f32, 0.0)])
        .collect();
    let skin_joint_of = |hierarchy: usize| (joints - 1 - hierarchy) as f32;
    let joint_indices: Vec<[f32; 4]> = (0..joints)
        .flat_map(|j| {
            let s = skin_joint_of(j);
            [[s, 0.0, 0.0, 0.0], [s, 0.0, 0.0, 0.0]]
        })
        .collect();
    let weights: Vec<Vec4> = vec![Vec4::X; joints * 2];

    let positions = b.accessor(&positions)?;
    let joint_acc = b.encoded_accessor(
        &joint_indices,
        ComponentEncoding::new(ComponentKind::U16, false)?,
    )?;
    let weight_acc = b.encoded_accessor(&weights, ComponentEncoding::new(ComponentKind::U8, true)?)?;
    let mesh = b.mesh(Mesh {
        name: Some("strip".into()),
        positions,
        joints: Some(joint_acc),
        weights: Some(weight_acc),
        ..Default::default()
    });
    let skin = b.skin(Skin {
        name: Some("chain".into()),
        joints: declared.clone(),
        inverse_bind_matrices: Some(ibm),
    });
    let holder = b.node(Node {
        name: Some("strip".into()),
        mesh: Some(mesh),
        skin: Some(skin),
        ..Default::default()
    });

    let bend = b.animation("bend");
    let quarter = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    let rotation_keys = b.encoded_accessor(
        &[Quat::IDENTITY, quarter],
        ComponentEncoding::new(ComponentKind::I16, true)?,
    )?;
    let bend_times = b.accessor(&[0.0f32, 1.0])?;
    for &n in &nodes {
        b.channel(
            bend,
            n,
            TargetPath::Rotation,
            bend_times,
            rotation_keys,
            Interpolation::Linear,
        );
    }

    let hold = b.animation("hold");
    b.keyed(
        hold,
        nodes[0],
        TargetPath::Translation,
        &[0.0, 2.0],
        &[Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0)],
        Interpolation::Linear,
    )?;

    b.scene(&[nodes[0], holder]);
    Ok(b.build())
}
