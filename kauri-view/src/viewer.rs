//! Interactive tree viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Simulation`] together with
//! its editable configuration and implements [`eframe::App`] to grow, draw
//! and export the tree. The 3-D tree is shown as an orthographic side view
//! that can be turned around the vertical axis.

use eframe::App;
use glam::{Vec2, Vec3};
use kauri_core::{
    config::SimConfig,
    distribution::Distribution,
    limb::LimbGraph,
    mesh::to_mesh,
    simulation::Simulation,
    types::{LimbId, LimbKind},
};

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: [`Simulation`] and the [`SimConfig`] it is
///   rebuilt from on reset.
/// - UI configuration (pan/zoom/yaw, spawn shape, timing).
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true` and enough time has passed, call [`Viewer::step_once`].
/// 3. Render limbs, attractors, leaves and the spawn hint.
pub struct Viewer {
    sim: Simulation,
    cfg: SimConfig,

    rng: rand::rngs::ThreadRng,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,
    /// Rotation of the view around the vertical axis, in radians.
    yaw: f32,

    spawn_shape: Distribution,
    spawn_count: usize,
    spawn_radius: f32,

    /// Branch limbs created in the last step (for highlighting).
    last_new_ids: Vec<LimbId>,
    mesh_stats: (usize, usize),
    status: String,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a viewer around a freshly built simulation.
    ///
    /// ### Errors
    /// Returns the simulation's error if `cfg` is invalid.
    pub fn new(cfg: SimConfig) -> kauri_core::Result<Self> {
        let sim = Simulation::new(cfg.clone())?;
        let mut viewer = Self {
            sim,
            cfg,
            rng: rand::rng(),
            running: false,
            zoom: 40.0,
            pan: egui::vec2(0.0, 150.0),
            yaw: 0.0,
            spawn_shape: Distribution::Hemisphere,
            spawn_count: 50,
            spawn_radius: 1.5,
            last_new_ids: Vec::with_capacity(16),
            mesh_stats: (0, 0),
            status: String::new(),
            step_interval: 0.1,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        };
        viewer.refresh_mesh();
        Ok(viewer)
    }

    /// Rebuilds the simulation from the current configuration.
    ///
    /// On an invalid configuration the old tree is kept and the error is
    /// shown in the status bar.
    fn reset(&mut self) {
        match Simulation::new(self.cfg.clone()) {
            Ok(sim) => {
                self.sim = sim;
                self.last_new_ids.clear();
                self.running = false;
                self.status.clear();
                self.refresh_mesh();
            }
            Err(e) => {
                log::warn!("reset failed: {e}");
                self.status = format!("reset failed: {e}");
            }
        }
    }

    /// Removes every remaining attraction point, so the next step completes
    /// growth.
    fn clear_attractors(&mut self) {
        self.sim.branches.attractors.points.clear();
        if let Some(roots) = self.sim.roots.as_mut() {
            roots.attractors.points.clear();
        }
    }

    /// Advances the simulation by one tick and refreshes the mesh statistics.
    fn step_once(&mut self) {
        match self.sim.tick() {
            Ok(report) => {
                self.last_new_ids = report.branches.new_limbs().to_vec();
                if !report.leaves.is_empty() {
                    self.status = format!("growth complete, {} leaves", report.leaves.len());
                    self.running = false;
                }
            }
            Err(e) => {
                log::error!("growth step failed: {e}");
                self.status = if e.is_geometry_error() {
                    format!("degenerate geometry, reset to continue: {e}")
                } else if e.is_config_error() {
                    format!("fix the config panel: {e}")
                } else {
                    format!("step failed: {e}")
                };
                self.running = false;
            }
        }
        self.refresh_mesh();
    }

    /// Skins both graphs with the panel's mesh settings and stores the
    /// combined vertex and triangle counts. This also updates limb sizes,
    /// which set the stroke widths.
    fn refresh_mesh(&mut self) {
        let origin = self.cfg.origin;
        let mut stats = (0, 0);
        let mut graphs: Vec<&mut LimbGraph> = vec![&mut self.sim.branches.graph];
        if let Some(roots) = self.sim.roots.as_mut() {
            graphs.push(&mut roots.graph);
        }
        for graph in graphs {
            match to_mesh(graph, origin, &self.cfg.mesh) {
                Ok(mesh) => {
                    stats.0 += mesh.vertices.len();
                    stats.1 += mesh.triangles.len();
                }
                Err(e) => self.status = format!("mesh failed: {e}"),
            }
        }
        self.mesh_stats = stats;
    }

    /// Writes `kauri_branches.obj` (and `kauri_roots.obj`) to the working
    /// directory.
    fn export_obj(&mut self) {
        let result = self.sim.meshes().and_then(|meshes| {
            meshes.branches.save_obj("kauri_branches.obj")?;
            if let Some(roots) = meshes.roots {
                roots.save_obj("kauri_roots.obj")?;
            }
            Ok(())
        });
        self.status = match result {
            Ok(()) => {
                log::info!("exported tree mesh to kauri_branches.obj");
                "exported kauri_branches.obj".to_owned()
            }
            Err(e) => {
                log::error!("export failed: {e}");
                format!("export failed: {e}")
            }
        };
    }

    /// Pushes the panel's growth parameters into the running simulation.
    fn apply_growth_config(&mut self) {
        self.sim.branches.growth = self.cfg.branches.growth;
        if let (Some(domain), Some(rc)) = (self.sim.roots.as_mut(), self.cfg.roots.as_ref()) {
            domain.growth = rc.growth;
        }
    }

    /// Projects a world position onto the view plane.
    fn project(&self, p: Vec3) -> Vec2 {
        let (s, c) = self.yaw.sin_cos();
        Vec2::new(p.x * c + p.z * s, p.y)
    }

    /// Lifts a view-plane position back into the world, on the plane
    /// through the origin facing the viewer.
    fn unproject(&self, p: Vec2) -> Vec3 {
        let (s, c) = self.yaw.sin_cos();
        Vec3::new(p.x * c, p.y, p.x * s)
    }

    /// Converts a view-plane position to screen-space.
    ///
    /// View coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The y-axis is flipped so that
    /// positive y goes up.
    fn view_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::view_to_screen`] (up to floating point rounding).
    fn screen_to_view(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    fn world_to_screen(&self, p: Vec3, rect: egui::Rect) -> egui::Pos2 {
        self.view_to_screen(self.project(p), rect)
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom, yaw).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.01..=1.0)
                        .speed(0.01),
                );

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                if ui.button("Clear attractors").clicked() {
                    self.clear_attractors();
                }

                if ui.button("Export OBJ").clicked() {
                    self.export_obj();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 1.0..=200.0).text("Zoom"));
                ui.add(
                    egui::Slider::new(&mut self.yaw, -std::f32::consts::PI..=std::f32::consts::PI)
                        .text("Yaw"),
                );
            });
        });
    }

    /// Builds the bottom status bar (timing, counts, messages).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt target = {:.3} s", self.step_interval));
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!(
                    "mesh = {} verts / {} tris",
                    self.mesh_stats.0, self.mesh_stats.1
                ));
                ui.label(format!("limbs = {}", self.sim.limb_count()));
                ui.label(format!("attractors = {}", self.sim.attractor_count()));
                ui.label(format!("tick = {}", self.sim.ticks()));
                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });
    }

    /// Builds the right-hand configuration panel.
    ///
    /// Growth parameters apply to the running tree immediately; layout
    /// parameters (trunk, counts, radii) take effect on the next reset.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Branch growth");
                let g = &mut self.cfg.branches.growth;
                Self::labeled_drag_f32(ui, "kill_distance:", &mut g.kill_distance, 0.0..=5.0, 0.01);
                Self::labeled_drag_f32(ui, "segment_length:", &mut g.segment_length, 0.05..=5.0, 0.01);
                Self::labeled_drag_f32(ui, "jitter:", &mut g.jitter, 0.0..=2.0, 0.01);

                if let Some(rc) = self.cfg.roots.as_mut() {
                    ui.separator();
                    ui.label("Root growth");
                    let g = &mut rc.growth;
                    Self::labeled_drag_f32(ui, "kill_distance:", &mut g.kill_distance, 0.0..=5.0, 0.01);
                    Self::labeled_drag_f32(ui, "segment_length:", &mut g.segment_length, 0.05..=5.0, 0.01);
                    Self::labeled_drag_f32(ui, "jitter:", &mut g.jitter, 0.0..=2.0, 0.01);
                }

                ui.separator();
                ui.label("Layout (on reset)");
                Self::labeled_drag_f32(ui, "trunk_height:", &mut self.cfg.trunk_height, 0.0..=20.0, 0.1);
                Self::labeled_drag_usize(
                    ui,
                    "branch points:",
                    &mut self.cfg.branches.attractor_count,
                    0..=5000,
                    5.0,
                );
                Self::labeled_drag_f32(
                    ui,
                    "branch spread:",
                    &mut self.cfg.branches.spread_radius,
                    0.1..=50.0,
                    0.1,
                );
                let mut roots_enabled = self.cfg.roots.is_some();
                if ui.checkbox(&mut roots_enabled, "grow roots").changed() {
                    self.cfg.roots = roots_enabled.then(kauri_core::config::DomainConfig::roots);
                }
                if let Some(rc) = self.cfg.roots.as_mut() {
                    Self::labeled_drag_usize(ui, "root points:", &mut rc.attractor_count, 0..=5000, 5.0);
                    Self::labeled_drag_f32(ui, "root spread:", &mut rc.spread_radius, 0.1..=50.0, 0.1);
                }

                ui.separator();
                ui.label("Mesh");
                Self::labeled_drag_usize(
                    ui,
                    "radial_subdivisions:",
                    &mut self.cfg.mesh.radial_subdivisions,
                    3..=64,
                    1.0,
                );
                Self::labeled_drag_f32(
                    ui,
                    "extremity_size:",
                    &mut self.cfg.mesh.extremity_size,
                    0.001..=1.0,
                    0.001,
                );
                Self::labeled_drag_f32(
                    ui,
                    "size_exponent:",
                    &mut self.cfg.mesh.size_exponent,
                    0.5..=5.0,
                    0.05,
                );

                ui.separator();
                ui.label("Spawning");
                Self::labeled_drag_usize(ui, "spawn_count:", &mut self.spawn_count, 1..=1000, 1.0);
                Self::labeled_drag_f32(ui, "spawn_radius:", &mut self.spawn_radius, 0.1..=20.0, 0.1);

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = SimConfig::default();
                }
            });
        self.apply_growth_config();
    }

    /// Builds the small floating toolbar for choosing the spawn shape.
    fn ui_toolbar(&mut self, ctx: &egui::Context) {
        egui::Area::new("toolbar".into())
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 100.0))
            .movable(false)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(0, 0, 0, 32))
                    .show(ui, |ui| {
                        ui.vertical(|ui| {
                            for (shape, label) in [
                                (Distribution::Sphere, "● Sphere"),
                                (Distribution::Hemisphere, "◓ Hemisphere"),
                                (Distribution::Canopy, "♣ Canopy"),
                                (Distribution::Cube, "■ Cube"),
                                (Distribution::Cone, "▲ Cone"),
                            ] {
                                if ui.selectable_label(self.spawn_shape == shape, label).clicked() {
                                    self.spawn_shape = shape;
                                }
                            }
                        });
                    });
            });
    }

    /// Draws a circle of the spawn radius at the hovered view position.
    fn ui_tool_hint(&self, painter: &egui::Painter, rect: egui::Rect, hover_view: Option<Vec2>) {
        let Some(center) = hover_view else {
            return;
        };
        let stroke = egui::Stroke::new(1.5, egui::Color32::YELLOW);
        let segments = 64;
        let mut pts = Vec::with_capacity(segments);
        use std::f32::consts::TAU;
        for i in 0..segments {
            let t = (i as f32) / (segments as f32) * TAU;
            let local = Vec2::new(t.cos(), t.sin()) * self.spawn_radius;
            pts.push(self.view_to_screen(center + local, rect));
        }
        painter.add(egui::Shape::closed_line(pts, stroke));
    }

    /// Adds a cloud of points at `center`; it feeds the roots when it lies
    /// below the tree origin, the branches otherwise.
    fn spawn_attractors(&mut self, center: Vec3) {
        let points = self
            .spawn_shape
            .generate(self.spawn_count, self.spawn_radius, center, &mut self.rng);
        match self.sim.roots.as_mut() {
            Some(roots) if center.y < self.cfg.origin.y => roots.attractors.extend(points),
            _ => self.sim.branches.attractors.extend(points),
        }
    }

    fn limb_color(kind: LimbKind) -> egui::Color32 {
        match kind {
            LimbKind::Trunk => egui::Color32::from_rgb(120, 80, 40),
            LimbKind::Branch => egui::Color32::from_rgb(160, 120, 70),
            LimbKind::Root => egui::Color32::from_rgb(200, 140, 90),
        }
    }

    fn draw_graph(&self, painter: &egui::Painter, rect: egui::Rect, graph: &LimbGraph, highlight: &[LimbId]) {
        for (id, limb) in graph.iter() {
            let a = self.world_to_screen(limb.start, rect);
            let b = self.world_to_screen(limb.end, rect);
            let width = (limb.size * 2.0 * self.zoom).max(1.0);
            let color = if highlight.contains(&id) {
                egui::Color32::RED
            } else {
                Self::limb_color(limb.kind)
            };
            painter.line_segment([a, b], egui::Stroke::new(width, color));
        }
    }

    /// Builds the central panel where the tree is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            let hover_view = response.hover_pos().map(|p| self.screen_to_view(p, rect));

            // Click spawns attraction points.
            if response.clicked()
                && let Some(center) = hover_view
            {
                self.spawn_attractors(self.unproject(center));
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let view_before = self.screen_to_view(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(1.0, 200.0);

                let screen_after = self.view_to_screen(view_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            // Ground line through the tree origin.
            let ground = self.project(self.cfg.origin).y;
            let left = self.view_to_screen(Vec2::new(-1000.0, ground), rect);
            let right = self.view_to_screen(Vec2::new(1000.0, ground), rect);
            painter.line_segment([left, right], egui::Stroke::new(1.0, egui::Color32::DARK_GRAY));

            if let Some(roots) = &self.sim.roots {
                self.draw_graph(&painter, rect, &roots.graph, &[]);
                for p in roots.attractors.iter() {
                    painter.circle_filled(self.world_to_screen(*p, rect), 2.0, egui::Color32::LIGHT_BLUE);
                }
            }
            self.draw_graph(&painter, rect, &self.sim.branches.graph, &self.last_new_ids);
            for p in self.sim.branches.attractors.iter() {
                painter.circle_filled(self.world_to_screen(*p, rect), 2.0, egui::Color32::LIGHT_RED);
            }
            for leaf in self.sim.leaves() {
                let p = self.world_to_screen(leaf.position, rect);
                painter.circle_filled(p, (0.08 * self.zoom).max(2.0), egui::Color32::GREEN);
            }

            // Tool hint overlay.
            self.ui_tool_hint(&painter, rect, hover_view);

            // Auto-run simulation if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
        self.ui_toolbar(ctx);
    }
}
