//! Desktop front end
//!
//! A background thread blocks on the tick relay and publishes the latest
//! beat number; the egui frame reads it for the progress bar. Everything
//! else runs on the UI thread against the session.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use color_eyre::eyre::{eyre, Result as EyreResult};
use eframe::egui;
use tracing::{info, warn};

use metrognome::{
    beat::BeatFilter, gallery, playback::PlaybackState, relay::TickReceiver, Session,
    SessionError,
};

/// Signatures offered in the drop-down. Any "N/D" can be typed.
const SIGNATURE_PRESETS: [&str; 5] = ["2/2", "2/4", "3/4", "4/4", "6/8"];

pub fn run(session: Session, ticks: TickReceiver) -> EyreResult<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 380.0])
            .with_title("MetroGnome"),
        ..Default::default()
    };

    eframe::run_native(
        "MetroGnome",
        options,
        Box::new(|cc| Ok(Box::new(GuiApp::new(cc, session, ticks)?))),
    )
    .map_err(|err| eyre!("window failed: {}", err))
}

struct GuiApp {
    session: Session,
    /// Latest beat delivered, 0 before the first
    beat: Arc<AtomicU32>,
    instrument: &'static str,
    signature_text: String,
    hit_text: String,
    error: Option<String>,
}

impl GuiApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        session: Session,
        mut ticks: TickReceiver,
    ) -> std::io::Result<Self> {
        let beat = Arc::new(AtomicU32::new(0));

        let shared = Arc::clone(&beat);
        let ctx = cc.egui_ctx.clone();
        thread::Builder::new()
            .name("metrognome-ticks".into())
            .spawn(move || {
                while let Some(event) = ticks.next_event() {
                    shared.store(event.beat, Ordering::Relaxed);
                    ctx.request_repaint();
                    let dropped = ticks.take_dropped();
                    if dropped > 0 {
                        warn!(dropped, "ticks dropped");
                    }
                }
                info!("tick relay closed");
            })?;

        let signature = session.signature();
        let signature_text = format!("{}/{}", signature.beats(), signature.note_value());
        let hit_text = session.hit_beats().to_string();
        let instrument = gallery::random_instrument(&mut rand::thread_rng());

        Ok(Self {
            session,
            beat,
            instrument,
            signature_text,
            hit_text,
            error: None,
        })
    }

    /// Run a playback action, keeping its error for display
    fn act(&mut self, f: impl FnOnce(&mut Session) -> Result<PlaybackState, SessionError>) {
        match f(&mut self.session) {
            Ok(state) => {
                info!(%state, "playback");
                self.error = None;
            }
            Err(err) => {
                warn!(%err, "playback action failed");
                self.error = Some(err.to_string());
            }
        }
    }

    fn apply_signature(&mut self) {
        match self.session.set_signature(&self.signature_text) {
            Ok(hits) => {
                self.hit_text = hits.to_string();
                self.error = None;
            }
            Err(err) => self.error = Some(err.to_string()),
        }
    }

    fn apply_hit_beats(&mut self) {
        if let Err(err) = self.session.set_hit_beats(&self.hit_text) {
            warn!(%err, "hit beats not applied");
            self.error = Some(err.to_string());
        }
    }

    fn header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let glyph = gallery::glyph(self.instrument).unwrap_or("🎵");
            ui.label(egui::RichText::new(glyph).size(48.0));
            ui.vertical(|ui| {
                ui.heading("MetroGnome");
                egui::ComboBox::from_id_salt("instrument")
                    .selected_text(self.instrument)
                    .show_ui(ui, |ui| {
                        for name in gallery::names() {
                            ui.selectable_value(&mut self.instrument, name, name);
                        }
                    });
            });
        });
    }

    fn progress(&self, ui: &mut egui::Ui) {
        let beats = self.session.signature().beats().max(1) as u32;
        let beat = self.beat.load(Ordering::Relaxed).min(beats);

        ui.add(
            egui::ProgressBar::new(beat as f32 / beats as f32)
                .text(beat.to_string())
                .desired_height(28.0),
        );
        ui.label(self.session.signature().to_string());
    }

    fn transport(&mut self, ui: &mut egui::Ui) {
        let controls = self.session.controls();

        ui.horizontal(|ui| {
            if ui
                .add_enabled(controls.start, egui::Button::new("Start"))
                .clicked()
            {
                self.act(|s| s.start(Instant::now()));
            }
            if ui
                .add_enabled(controls.pause, egui::Button::new(controls.pause_label))
                .clicked()
            {
                self.act(|s| s.toggle_pause(Instant::now()));
            }
            if ui
                .add_enabled(controls.stop, egui::Button::new("Stop"))
                .clicked()
            {
                self.act(Session::stop);
            }
            if ui
                .add_enabled(controls.restart, egui::Button::new("Restart"))
                .clicked()
            {
                self.act(|s| s.restart(Instant::now()));
            }
        });

        ui.horizontal(|ui| {
            if ui.button("Up").clicked() {
                self.session.tempo_up();
            }
            if ui.button("Down").clicked() {
                self.session.tempo_down();
            }
            if ui.button(self.session.mute_label()).clicked() {
                self.session.toggle_mute();
            }
            if ui.button(self.session.pan_label()).clicked() {
                self.session.toggle_pan();
            }
        });
    }

    fn signature_entry(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Signature");

            let mut picked = false;
            egui::ComboBox::from_id_salt("signature")
                .selected_text(self.signature_text.as_str())
                .show_ui(ui, |ui| {
                    for preset in SIGNATURE_PRESETS {
                        if ui
                            .selectable_label(self.signature_text == preset, preset)
                            .clicked()
                        {
                            self.signature_text = preset.to_string();
                            picked = true;
                        }
                    }
                });

            let edit = ui.add(
                egui::TextEdit::singleline(&mut self.signature_text).desired_width(60.0),
            );
            let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            if picked || submitted {
                self.apply_signature();
            }
        });

        ui.horizontal(|ui| {
            ui.label("Hit beats");
            let edit = ui.add(egui::TextEdit::singleline(&mut self.hit_text).desired_width(120.0));
            if edit.changed() {
                self.apply_hit_beats();
            }
        });

        let measure = self.session.signature().beats().max(0) as u32;
        if BeatFilter::is_ambiguous(measure) {
            ui.small("Beats 10 and up share digits with beats 1-9");
        }
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self.header(ui);
            ui.separator();
            self.progress(ui);
            ui.add_space(8.0);
            self.transport(ui);
            ui.separator();
            self.signature_entry(ui);

            if let Some(err) = &self.error {
                ui.colored_label(egui::Color32::from_rgb(244, 67, 54), err);
            }
        });
    }
}

impl Drop for GuiApp {
    fn drop(&mut self) {
        self.session.close();
    }
}
