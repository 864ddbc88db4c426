//! Multi-selection transform gizmos for Bevy 0.18.
//!
//! Translate, rotate and scale any number of selected entities at once, or
//! drag them freely over the ground. Parented entities keep their hierarchy:
//! every write is converted back into the entity's parent space.
//!
//! # Quick Start
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_scene_gizmos::{GizmoCamera, GizmoSelection, SceneGizmoPlugin};
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(SceneGizmoPlugin)
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(mut commands: Commands, mut selection: ResMut<GizmoSelection>) {
//!     commands.spawn((
//!         Camera3d::default(),
//!         Transform::from_xyz(0.0, 6.0, 12.0).looking_at(Vec3::ZERO, Vec3::Y),
//!         GizmoCamera,
//!     ));
//!
//!     let cube = commands.spawn(Transform::from_xyz(0.0, 0.5, 0.0)).id();
//!     selection.set([cube]);
//! }
//! ```
//!
//! # Layers
//!
//! - The engine ([`GizmoController`], the four [`gizmos`], snapping and frame
//!   conversion) is pure and talks to the host through [`EntityStore`],
//!   [`TransformDispatcher`], [`ScenePicker`] and [`SelectionProvider`].
//! - [`SceneGizmoPlugin`] runs that engine against the ECS world, with
//!   pointer picking and handle drawing.
//!
//! # Configuration
//!
//! - [`GizmoConfig`]: snapping, world or local alignment, scale sensitivity
//! - [`GizmoMode`]: which gizmo is shown and the proportional scale lock
//! - [`GizmoStyle`]: handle geometry, hit tolerances and colours
//!
//! Drags are committed to [`TransformJournal`] as one batch each.

#![warn(missing_docs)]

use bevy::prelude::*;

mod controller;
mod draw;
mod frame;
mod gizmo_frame;
pub mod gizmos;
mod handles;
mod interaction;
mod math;
mod pivot;
mod session;
pub mod snap;
mod store;
mod types;

pub use controller::GizmoController;
pub use draw::{draw_handles, HandleRenderer, HandleView};
pub use frame::{FrameConverter, FrameError};
pub use gizmo_frame::GizmoFrame;
pub use handles::{hit_test, HandleDrag};
pub use interaction::{GizmoInput, GizmoPointer, WorldEntityStore};
pub use math::{ray_horizontal_plane, rotation_between};
pub use pivot::centroid;
pub use session::{DragSession, EntitySnapshot};
pub use snap::Snapped;
pub use store::{
    local_matrix, EntityStore, GizmoSelection, NoScenePicker, SceneGraph, ScenePicker,
    SelectionProvider, TransformBatch, TransformDispatcher, TransformJournal,
};
pub use types::{
    AlignmentMode, AxisColors, GizmoAxis, GizmoCamera, GizmoConfig, GizmoHandle, GizmoKind,
    GizmoMode, GizmoStateColors, GizmoStyle, SnapSettings,
};

use crate::interaction::{configure_gizmos, draw_gizmo, drive_gizmo, sample_pointer};

/// Plugin that runs the gizmo against the app's entities.
///
/// Registers the gizmo resources and the per-frame chain: sample the pointer,
/// drive the controller, draw the handles. Cameras opt in with
/// [`GizmoCamera`]; the host fills [`GizmoSelection`].
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_scene_gizmos::SceneGizmoPlugin;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(SceneGizmoPlugin)
///     .run();
/// ```
pub struct SceneGizmoPlugin;

impl Plugin for SceneGizmoPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GizmoConfig>()
            .init_resource::<GizmoStyle>()
            .init_resource::<GizmoMode>()
            .init_resource::<GizmoSelection>()
            .init_resource::<GizmoController>()
            .init_resource::<TransformJournal>()
            .init_resource::<GizmoPointer>()
            .init_resource::<GizmoInput>()
            .add_systems(Startup, configure_gizmos)
            .add_systems(Update, (sample_pointer, drive_gizmo, draw_gizmo).chain());
    }
}
