use anyhow::{anyhow, Context, Result};
use eframe::egui;
use egui::{Color32, CornerRadius, RichText, ScrollArea, Stroke, ViewportBuilder};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod avatar;
mod config;
mod countdown;
mod error;
mod image_cache;
mod list_card;
mod list_item;
mod models;
mod poller;
mod query;
mod stock_client;
mod textures;

use crate::config::Config;
use crate::countdown::now_ms;
use crate::error::FetchError;
use crate::image_cache::ImageCache;
use crate::list_card::{CardKind, ListCard};
use crate::models::ImageMap;
use crate::poller::{Notify, Poller, RetryPolicy};
use crate::stock_client::StockClient;
use crate::textures::TextureStore;

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stock_watch=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

fn main() -> Result<()> {
    init_tracing()?;

    let config = Config::from_env().context("invalid configuration")?;
    info!(api = %config.api_url, "starting stock watch");

    // Network polling runs here; the UI thread only drains results
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("stock-watch-io")
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let title = config.window_title().to_string();
    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            let app = StockWatchApp::new(cc.egui_ctx.clone(), config, runtime)?;
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow!("window closed with error: {}", err))
}

struct AppTheme {
    background: Color32,
    panel_background: Color32,
    card_background: Color32,
    purchased_background: Color32,
    text: Color32,
    secondary_text: Color32,
    error_text: Color32,
    highlight: Color32,
    accent: Color32,
    separator: Color32,
    countdown_text: Color32,
    countdown_background: Color32,
    expired_background: Color32,
    button_background: Color32,
    button_foreground: Color32,
    button_active_background: Color32,
    button_hover_background: Color32,
}

impl AppTheme {
    fn dark() -> Self {
        Self {
            background: Color32::from_rgb(18, 18, 18),
            panel_background: Color32::from_rgb(26, 26, 30),
            card_background: Color32::from_rgb(38, 38, 44),
            purchased_background: Color32::from_rgb(46, 125, 72), // Green, marks a bought item
            text: Color32::from_rgb(240, 240, 240),
            secondary_text: Color32::from_rgb(180, 180, 180),
            error_text: Color32::from_rgb(239, 83, 80),
            highlight: Color32::from_rgb(129, 140, 248), // Indigo
            accent: Color32::from_rgb(96, 165, 250),
            separator: Color32::from_rgb(60, 60, 66),
            countdown_text: Color32::from_rgb(29, 78, 216),
            countdown_background: Color32::from_rgba_unmultiplied(255, 255, 255, 215),
            expired_background: Color32::from_rgba_unmultiplied(220, 38, 38, 210),
            button_background: Color32::from_rgb(66, 66, 66),
            button_foreground: Color32::from_rgb(240, 240, 240),
            button_active_background: Color32::from_rgb(99, 102, 241),
            button_hover_background: Color32::from_rgb(80, 80, 80),
        }
    }

    fn light() -> Self {
        Self {
            background: Color32::from_rgb(245, 245, 245),
            panel_background: Color32::from_rgb(255, 255, 255),
            card_background: Color32::from_rgb(238, 240, 246),
            purchased_background: Color32::from_rgb(134, 239, 172),
            text: Color32::from_rgb(20, 20, 20),
            secondary_text: Color32::from_rgb(90, 90, 90),
            error_text: Color32::from_rgb(185, 28, 28),
            highlight: Color32::from_rgb(79, 70, 229),
            accent: Color32::from_rgb(59, 130, 246),
            separator: Color32::from_rgb(200, 200, 200),
            countdown_text: Color32::from_rgb(29, 78, 216),
            countdown_background: Color32::from_rgba_unmultiplied(255, 255, 255, 230),
            expired_background: Color32::from_rgba_unmultiplied(220, 38, 38, 210),
            button_background: Color32::from_rgb(235, 235, 235),
            button_foreground: Color32::from_rgb(20, 20, 20),
            button_active_background: Color32::from_rgb(79, 70, 229),
            button_hover_background: Color32::from_rgb(210, 210, 210),
        }
    }

    fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.panel_background;
        style.visuals.window_stroke = Stroke::new(1.0, self.separator);
        style.visuals.widgets.noninteractive.bg_fill = self.card_background;
        style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text);

        style.visuals.widgets.inactive.bg_fill = self.button_background;
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.active.bg_fill = self.button_active_background;
        style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.button_foreground);

        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);

        style.visuals.window_corner_radius = CornerRadius::same(8);
        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(4);

        ctx.set_style(style);
    }
}

struct StockWatchApp {
    title: String,
    images: ImageCache,
    image_poller: Poller<ImageMap>,
    textures: TextureStore,
    wanted: ListCard,
    all: ListCard,
    theme: AppTheme,
    is_dark_mode: bool,
    // Dropped last so the pollers above abort before the runtime shuts down
    _runtime: Runtime,
}

impl StockWatchApp {
    fn new(ctx: egui::Context, config: Config, runtime: Runtime) -> Result<Self, FetchError> {
        let client = StockClient::new(config.api_url.clone())?;
        let retry = RetryPolicy {
            retries: config.fetch_retries,
        };
        let notify: Notify = Arc::new(move || ctx.request_repaint());
        let handle = runtime.handle().clone();

        let image_client = client.clone();
        let image_poller = Poller::spawn(
            &handle,
            "images",
            config.images_refresh,
            retry,
            notify.clone(),
            move || {
                let client = image_client.clone();
                async move { client.fetch_images().await }
            },
        );

        let wanted = ListCard::spawn(
            CardKind::Wanted,
            client.clone(),
            &handle,
            config.wanted_refresh,
            retry,
            notify.clone(),
        );
        let all = ListCard::spawn(
            CardKind::All,
            client.clone(),
            &handle,
            config.all_refresh,
            retry,
            notify.clone(),
        );

        Ok(Self {
            title: config.window_title().to_string(),
            images: ImageCache::new(),
            image_poller,
            textures: TextureStore::new(handle, client, notify),
            wanted,
            all,
            theme: AppTheme::dark(),
            is_dark_mode: true,
            _runtime: runtime,
        })
    }

    fn pump_images(&mut self) {
        // Failures are already logged by the poller; the old map stays in place
        if let Some(Ok(images)) = self.image_poller.latest() {
            self.images.replace(images);
            debug!(images = self.images.len(), "image cache replaced");
        }
    }

    fn toggle_theme(&mut self) {
        self.is_dark_mode = !self.is_dark_mode;
        self.theme = if self.is_dark_mode {
            AppTheme::dark()
        } else {
            AppTheme::light()
        };
    }
}

impl eframe::App for StockWatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);

        let now = now_ms();
        self.pump_images();
        self.textures.pump(ctx);
        self.wanted.pump(now);
        self.all.pump(now);

        let images = self.images.snapshot();
        let mut toggle_theme = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(&self.title).color(self.theme.text).size(22.0).strong());

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let icon = if self.is_dark_mode { "☀" } else { "🌙" };
                    let label = RichText::new(icon)
                        .color(self.theme.button_foreground)
                        .size(18.0);
                    let button = ui.add(
                        egui::Button::new(label)
                            .fill(self.theme.button_background)
                            .corner_radius(CornerRadius::same(6)),
                    );
                    if button.on_hover_text("Toggle light/dark theme").clicked() {
                        toggle_theme = true;
                    }
                });
            });
            ui.add_space(6.0);

            ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                self.wanted.show(ui, &images, &mut self.textures, &self.theme);
                self.all.show(ui, &images, &mut self.textures, &self.theme);
            });
        });

        if toggle_theme {
            self.toggle_theme();
        }

        // Wake up for the next countdown tick; poll results wake us on their own
        let next_tick = [self.wanted.next_tick_in(now), self.all.next_tick_in(now)]
            .into_iter()
            .flatten()
            .min();
        if let Some(delay) = next_tick {
            ctx.request_repaint_after(delay);
        }
    }
}
