//! Gizmo overlay for ground detector diagnostics.
//!
//! Only detectors built with [`GroundDetector::with_diagnostics`] are drawn.

use bevy::color::palettes::css::{GREEN, MAGENTA, RED, YELLOW};
use bevy::prelude::*;

use crate::detection::CandidateVerdict;
use crate::detector::GroundDetector;

/// Draws ground cast candidates, the accepted hit and the measured surface.
///
/// Requires Bevy's gizmo plugin, which `DefaultPlugins` includes.
pub struct GroundDetectorDebugPlugin;

impl Plugin for GroundDetectorDebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, draw_ground_diagnostics);
    }
}

fn draw_ground_diagnostics(mut gizmos: Gizmos, q_detectors: Query<&GroundDetector>) {
    for detector in &q_detectors {
        let Some(diagnostics) = detector.diagnostics() else {
            continue;
        };
        let origin = diagnostics.cast_origin;

        for report in &diagnostics.candidates {
            let hit = report.hit;
            let color = match report.verdict {
                CandidateVerdict::Accepted => GREEN,
                _ => RED,
            };
            gizmos.line_2d(origin, hit.point, color);
            gizmos.line_2d(hit.point, hit.point + hit.normal * hit.distance, MAGENTA);
        }

        let end = diagnostics.ground_point.unwrap_or(detector.bottom());
        gizmos.line_2d(origin, end, YELLOW);

        if let Some(surface) = diagnostics.surface_point {
            gizmos.circle_2d(surface, 0.05, MAGENTA);
        }
    }
}
