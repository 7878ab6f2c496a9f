//! Observer HUD
//!
//! Everything here reads replicated state only: [`ReplicatedBoss`] snapshots,
//! the telegraphs observers were told about, and the combat log.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::director::constants::{ARENA_HALF_X, ARENA_HALF_Z};
use crate::director::{TelegraphShape, UnitKind};
use crate::encounter::systems::{DisplayName, EncounterClock, Health, ReplicatedBoss, Unit};

use super::telegraphs::{ScreenShakeState, VisibleTelegraphs};

const HEADER_COLOR: egui::Color32 = egui::Color32::from_rgb(230, 204, 153);
const LOG_LINES: usize = 40;

fn health_color(fraction: f32) -> egui::Color32 {
    if fraction > 0.35 {
        egui::Color32::from_rgb(51, 204, 51)
    } else {
        egui::Color32::from_rgb(204, 51, 51)
    }
}

fn kind_color(kind: UnitKind) -> egui::Color32 {
    match kind {
        UnitKind::Boss => egui::Color32::from_rgb(200, 60, 60),
        UnitKind::Player => egui::Color32::from_rgb(70, 120, 220),
        UnitKind::Helper => egui::Color32::from_rgb(190, 120, 220),
        UnitKind::Obstacle => egui::Color32::from_rgb(140, 140, 140),
    }
}

fn log_color(event_type: CombatLogEventType) -> egui::Color32 {
    match event_type {
        CombatLogEventType::Damage => egui::Color32::from_rgb(255, 150, 100),
        CombatLogEventType::Death => egui::Color32::from_rgb(255, 80, 80),
        CombatLogEventType::PhaseChange => HEADER_COLOR,
        CombatLogEventType::BuffApplied | CombatLogEventType::BuffExpired => {
            egui::Color32::from_rgb(120, 220, 120)
        }
        CombatLogEventType::CrowdControl => egui::Color32::from_rgb(100, 200, 255),
        _ => egui::Color32::from_rgb(200, 200, 200),
    }
}

/// Boss frame: health, phase, active ability and modifiers.
pub fn render_boss_panel(
    mut contexts: EguiContexts,
    bosses: Query<(&ReplicatedBoss, &Health, Option<&DisplayName>)>,
) {
    // Use try_ctx_mut to gracefully handle window close
    let Some(ctx) = contexts.try_ctx_mut() else { return; };

    egui::TopBottomPanel::top("boss_panel")
        .frame(
            egui::Frame::side_top_panel(&ctx.style())
                .fill(egui::Color32::from_black_alpha(180))
                .stroke(egui::Stroke::NONE),
        )
        .show(ctx, |ui| {
            for (replicated, health, name) in bosses.iter() {
                let snapshot = &replicated.snapshot;
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(name.map_or("Boss", |n| n.0.as_str()))
                            .size(18.0)
                            .color(HEADER_COLOR)
                            .strong(),
                    );
                    if let Some(phase) = &snapshot.phase_name {
                        ui.label(egui::RichText::new(format!("[{}]", phase)).size(14.0));
                    }
                    if snapshot.in_transition {
                        ui.label(egui::RichText::new("TRANSITION").color(egui::Color32::YELLOW));
                    }
                    if snapshot.stunned {
                        ui.label(egui::RichText::new("STUNNED").color(egui::Color32::from_rgb(100, 200, 255)));
                    }
                    if snapshot.shield_active {
                        ui.label(
                            egui::RichText::new(format!("SHIELD {:.0}%", snapshot.shield_reduction * 100.0))
                                .color(egui::Color32::from_rgb(190, 120, 220)),
                        );
                    }
                });

                let fraction = health.fraction();
                ui.add(
                    egui::ProgressBar::new(fraction)
                        .fill(health_color(fraction))
                        .text(format!("{:.0} / {:.0}", health.current, health.max)),
                );

                ui.horizontal(|ui| {
                    let casting = snapshot.active_ability.as_deref().unwrap_or("-");
                    ui.label(format!("Casting: {}", casting));
                    ui.separator();
                    ui.label(format!(
                        "Damage dealt x{:.2}  Damage taken x{:.2}",
                        snapshot.damage_dealt_multiplier, snapshot.damage_taken_multiplier
                    ));
                });
            }
        });
}

/// Recent combat log lines on the left.
pub fn render_combat_log(mut contexts: EguiContexts, combat_log: Res<CombatLog>) {
    let Some(ctx) = contexts.try_ctx_mut() else { return; };

    egui::SidePanel::left("combat_log")
        .default_width(320.0)
        .resizable(true)
        .show_separator_line(false)
        .frame(
            egui::Frame::side_top_panel(&ctx.style())
                .fill(egui::Color32::from_black_alpha(180))
                .stroke(egui::Stroke::NONE),
        )
        .show(ctx, |ui| {
            ui.label(egui::RichText::new("Combat Log").size(14.0).color(HEADER_COLOR));
            ui.separator();
            egui::ScrollArea::vertical().stick_to_bottom(true).show(ui, |ui| {
                for entry in combat_log.recent(LOG_LINES) {
                    ui.label(
                        egui::RichText::new(format!("[{:>6.1}] {}", entry.timestamp, entry.message))
                            .size(12.0)
                            .color(log_color(entry.event_type)),
                    );
                }
            });
        });
}

/// Top-down view of the arena with units and live telegraphs.
pub fn render_arena(
    mut contexts: EguiContexts,
    clock: Res<EncounterClock>,
    telegraphs: Res<VisibleTelegraphs>,
    shake: Res<ScreenShakeState>,
    units: Query<(&Unit, &Transform, Option<&Health>)>,
) {
    let Some(ctx) = contexts.try_ctx_mut() else { return; };

    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(egui::Color32::from_rgb(20, 20, 30)))
        .show(ctx, |ui| {
            let rect = ui.available_rect_before_wrap();
            let scale = (rect.width() / (ARENA_HALF_X * 2.0)).min(rect.height() / (ARENA_HALF_Z * 2.0));

            // Deterministic wobble so shake doesn't need an RNG
            let wobble = shake.intensity * 6.0 * (clock.elapsed * 60.0).sin();
            let center = rect.center() + egui::vec2(wobble, wobble * 0.5);
            let to_screen = |p: Vec3| center + egui::vec2(p.x * scale, p.z * scale);

            let painter = ui.painter_at(rect);
            painter.rect_stroke(
                egui::Rect::from_center_size(center, egui::vec2(ARENA_HALF_X * 2.0 * scale, ARENA_HALF_Z * 2.0 * scale)),
                0.0,
                egui::Stroke::new(1.0, egui::Color32::from_gray(90)),
            );

            let warn = egui::Color32::from_rgba_unmultiplied(255, 90, 40, 60);
            let warn_stroke = egui::Stroke::new(2.0, egui::Color32::from_rgb(255, 120, 60));
            for visible in telegraphs.iter() {
                let telegraph = &visible.telegraph;
                let origin = to_screen(telegraph.origin);
                match &telegraph.shape {
                    TelegraphShape::Circle { radius } => {
                        painter.circle(origin, radius * scale, warn, warn_stroke);
                    }
                    TelegraphShape::GrowingCircle { max_radius } => {
                        let radius = max_radius * visible.progress(clock.elapsed);
                        painter.circle_stroke(origin, max_radius * scale, warn_stroke);
                        painter.circle_filled(origin, radius * scale, warn);
                    }
                    TelegraphShape::Cone { radius, arc_degrees } => {
                        let facing = telegraph.direction.z.atan2(telegraph.direction.x);
                        let half = arc_degrees.to_radians() * 0.5;
                        let mut points = vec![origin];
                        for step in 0..=16 {
                            let angle = facing - half + (2.0 * half) * step as f32 / 16.0;
                            points.push(origin + egui::vec2(angle.cos(), angle.sin()) * *radius * scale);
                        }
                        painter.add(egui::Shape::convex_polygon(points, warn, warn_stroke));
                    }
                    TelegraphShape::Line { end } => {
                        painter.line_segment([origin, to_screen(*end)], warn_stroke);
                    }
                    TelegraphShape::ChargeTrack { target, locked } => {
                        let color = if *locked {
                            egui::Color32::from_rgb(255, 40, 40)
                        } else {
                            egui::Color32::from_rgb(255, 200, 60)
                        };
                        let end = to_screen(*target);
                        painter.line_segment([origin, end], egui::Stroke::new(3.0, color));
                        painter.circle_stroke(end, 6.0, egui::Stroke::new(2.0, color));
                    }
                }
            }

            for (unit, transform, health) in units.iter() {
                let alive = health.map_or(true, Health::is_alive);
                let pos = to_screen(transform.translation);
                let radius = match unit.kind {
                    UnitKind::Boss => 12.0,
                    UnitKind::Obstacle => 9.0,
                    _ => 7.0,
                };
                let color = if alive {
                    kind_color(unit.kind)
                } else {
                    egui::Color32::from_gray(60)
                };
                painter.circle_filled(pos, radius, color);
                if let Some(health) = health {
                    let width = radius * 2.0;
                    let top_left = pos + egui::vec2(-radius, radius + 3.0);
                    painter.rect_filled(
                        egui::Rect::from_min_size(top_left, egui::vec2(width, 3.0)),
                        0.0,
                        egui::Color32::from_gray(40),
                    );
                    painter.rect_filled(
                        egui::Rect::from_min_size(top_left, egui::vec2(width * health.fraction(), 3.0)),
                        0.0,
                        health_color(health.fraction()),
                    );
                }
            }
        });
}
