//! Multi-selection gizmo demo.
//!
//! Three cubes on the ground and a small cube parented to the last one.
//! Select any combination and drag the handles; every finished drag is
//! logged as one committed batch.
//!
//! Controls:
//! - 1/2/3/4: Toggle selection of cubes (4 is the child)
//! - A/D: Select all / Deselect all
//! - G/R/S/F: Position / Rotation / Scale / Free gizmo
//! - Tab: Cycle gizmos
//! - Q: Toggle world/local alignment
//! - N: Toggle snapping
//! - P: Toggle proportional scaling

use bevy::prelude::*;
use bevy_scene_gizmos::{
    GizmoCamera, GizmoConfig, GizmoKind, GizmoMode, GizmoSelection, SceneGizmoPlugin,
    SelectionProvider, TransformJournal,
};

#[derive(Component)]
struct TargetIndex(u8);

#[derive(Component)]
struct Hud;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(SceneGizmoPlugin)
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (keyboard_controls, selection_input, log_commits, update_hud),
        )
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(8.0, 8.0, 12.0).looking_at(Vec3::ZERO, Vec3::Y),
        GizmoCamera,
    ));

    // Light
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            illuminance: 5000.0,
            ..default()
        },
        Transform::from_xyz(-6.0, 8.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Ground
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::new(Vec3::Y, Vec2::splat(10.0)))),
        MeshMaterial3d(materials.add(Color::srgb(0.15, 0.15, 0.18))),
    ));

    // Cubes
    let cube = meshes.add(Cuboid::new(1.0, 1.0, 1.0));
    let colors = [
        Color::srgb(0.9, 0.3, 0.3),
        Color::srgb(0.3, 0.9, 0.3),
        Color::srgb(0.3, 0.3, 0.9),
    ];
    let positions = [
        Vec3::new(-3.0, 0.5, 0.0),
        Vec3::new(0.0, 0.5, 0.0),
        Vec3::new(3.0, 0.5, 0.0),
    ];

    let mut last = None;
    for (i, (color, pos)) in colors.into_iter().zip(positions).enumerate() {
        let id = commands
            .spawn((
                Mesh3d(cube.clone()),
                MeshMaterial3d(materials.add(color)),
                Transform::from_translation(pos),
                TargetIndex((i + 1) as u8),
            ))
            .id();
        last = Some(id);
    }

    // A child riding on the blue cube, turned and scaled so parent-space
    // conversion is visible.
    if let Some(parent) = last {
        commands.spawn((
            Mesh3d(cube.clone()),
            MeshMaterial3d(materials.add(Color::srgb(0.9, 0.8, 0.3))),
            Transform::from_xyz(0.0, 1.0, 0.0)
                .with_rotation(Quat::from_rotation_y(0.6))
                .with_scale(Vec3::splat(0.4)),
            TargetIndex(4),
            ChildOf(parent),
        ));
    }

    // HUD
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(10.0),
                left: Val::Px(10.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
        ))
        .with_children(|p| {
            p.spawn((
                Text::new(""),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Hud,
            ));
        });
}

fn keyboard_controls(
    keys: Res<ButtonInput<KeyCode>>,
    mut mode: ResMut<GizmoMode>,
    mut config: ResMut<GizmoConfig>,
) {
    for (key, kind) in [
        (KeyCode::KeyG, GizmoKind::Position),
        (KeyCode::KeyR, GizmoKind::Rotation),
        (KeyCode::KeyS, GizmoKind::Scale),
        (KeyCode::KeyF, GizmoKind::Free),
    ] {
        if keys.just_pressed(key) {
            mode.kind = kind;
        }
    }
    if keys.just_pressed(KeyCode::Tab) {
        mode.kind = mode.kind.next();
    }
    if keys.just_pressed(KeyCode::KeyP) {
        mode.proportional_scaling = !mode.proportional_scaling;
    }
    if keys.just_pressed(KeyCode::KeyQ) {
        config.alignment = config.alignment.toggled();
    }
    if keys.just_pressed(KeyCode::KeyN) {
        config.snap.enabled = !config.snap.enabled;
    }
}

fn selection_input(
    keys: Res<ButtonInput<KeyCode>>,
    mut selection: ResMut<GizmoSelection>,
    targets: Query<(Entity, &TargetIndex)>,
) {
    let index = [
        (KeyCode::Digit1, 1),
        (KeyCode::Digit2, 2),
        (KeyCode::Digit3, 3),
        (KeyCode::Digit4, 4),
    ]
    .into_iter()
    .find_map(|(key, idx)| keys.just_pressed(key).then_some(idx));

    if let Some(idx) = index {
        if let Some((entity, _)) = targets.iter().find(|(_, ti)| ti.0 == idx) {
            selection.toggle(entity);
        }
    }

    if keys.just_pressed(KeyCode::KeyA) {
        let mut all: Vec<(u8, Entity)> = targets.iter().map(|(e, ti)| (ti.0, e)).collect();
        all.sort_by_key(|(idx, _)| *idx);
        selection.set(all.into_iter().map(|(_, e)| e));
    }

    if keys.just_pressed(KeyCode::KeyD) {
        selection.clear();
    }
}

fn log_commits(mut journal: ResMut<TransformJournal>) {
    for batch in journal.drain_committed() {
        info!("Committed {} transform(s)", batch.changes.len());
    }
}

fn update_hud(
    mode: Res<GizmoMode>,
    config: Res<GizmoConfig>,
    selection: Res<GizmoSelection>,
    mut query: Query<&mut Text, With<Hud>>,
) {
    let Ok(mut text) = query.single_mut() else { return };

    let on = |b: bool| if b { "on" } else { "off" };

    text.0 = format!(
        "Gizmo: {} | Alignment: {}\n\
         Snap: {} | Proportional: {}\n\
         Selected: {}\n\n\
         [1/2/3/4] toggle cubes  [A] all  [D] none\n\
         [G/R/S/F] position / rotation / scale / free  [Tab] cycle\n\
         [Q] toggle world/local  [N] snap  [P] proportional",
        mode.kind,
        config.alignment,
        on(config.snap.enabled),
        on(mode.proportional_scaling),
        selection.selected_entities().len(),
    );
}
