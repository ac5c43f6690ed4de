use anyhow::anyhow;
use crossbeam_channel::Receiver;
use geolayers::{
    data::fetch::{spawn_fetches, FetchOutcome},
    ui::{map_canvas, zoom_by, CanvasOptions, UiLayersExt},
    EngineConfig, HttpFetcher, LayerEngine, MemorySurface,
};
use std::sync::Arc;
use std::time::Duration;

/// GeoJSON layer viewer
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = EngineConfig::default().with_access_token_from_env();
    if config.access_token.is_none() {
        log::info!("no map access token set, drawing without a base map");
    }

    let surface = MemorySurface::new(&config.view);
    let outcomes = spawn_fetches(
        &tokio::runtime::Handle::current(),
        Arc::new(HttpFetcher::new()),
        &config.sources,
    );
    let engine = LayerEngine::new(config, surface)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("GeoLayers"),
        ..Default::default()
    };

    eframe::run_native(
        "geolayers-app",
        options,
        Box::new(move |_cc| Box::new(GeoLayersApp::new(engine, outcomes))),
    )
    .map_err(|e| anyhow!("viewer exited with error: {}", e))?;

    Ok(())
}

struct GeoLayersApp {
    engine: LayerEngine<MemorySurface>,
    outcomes: Receiver<FetchOutcome>,
    canvas: CanvasOptions,
}

impl GeoLayersApp {
    fn new(mut engine: LayerEngine<MemorySurface>, outcomes: Receiver<FetchOutcome>) -> Self {
        engine.surface_mut().load();
        engine.pump_events();

        Self {
            engine,
            outcomes,
            canvas: CanvasOptions::default(),
        }
    }

    fn drain_outcomes(&mut self) {
        for outcome in self.outcomes.try_iter() {
            self.engine.ingest(&outcome.source_id, outcome.result);
        }
    }

    fn status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("+").on_hover_text("Zoom in").clicked() {
                zoom_by(&mut self.engine, 1.0, &self.canvas);
            }
            if ui.button("−").on_hover_text("Zoom out").clicked() {
                zoom_by(&mut self.engine, -1.0, &self.canvas);
            }
            ui.separator();

            let surface = self.engine.surface();
            ui.label(format!(
                "Center: {:.5}, {:.5} | Zoom: {:.1}",
                surface.center().lat,
                surface.center().lng,
                surface.zoom()
            ));
        });
    }
}

impl eframe::App for GeoLayersApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_outcomes();

        if !self.engine.is_ready() {
            egui::CentralPanel::default().show(ctx, |ui| ui.loading_screen(self.engine.gate()));
            ctx.request_repaint_after(Duration::from_millis(100));
            return;
        }

        egui::SidePanel::left("layers_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                let rows = self.engine.sidebar_rows();
                if let Some(layer_id) = ui.layer_sidebar(&rows) {
                    if let Err(err) = self.engine.toggle(&layer_id) {
                        log::debug!("sidebar toggle of {} ignored: {}", layer_id, err);
                    }
                }

                ui.add_space(8.0);
                if ui.recenter_button() {
                    self.engine.recenter();
                }

                ui.separator();
                ui.inspector(self.engine.inspection());
            });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| self.status_bar(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                map_canvas(ui, &mut self.engine, &self.canvas);
            });
    }
}
