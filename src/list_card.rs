use chrono::{DateTime, Local};
use egui::{CornerRadius, RichText, ScrollArea, Stroke, Ui};
use std::collections::HashMap;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

use crate::error::FetchError;
use crate::list_item::ItemRow;
use crate::models::{sort_by_name, ImageMap, ItemKey, StockItem};
use crate::poller::{Notify, Poller, RetryPolicy};
use crate::query::{QueryState, QueryStatus};
use crate::stock_client::StockClient;
use crate::textures::TextureStore;
use crate::AppTheme;

// Responsive columns, like a 1/2/3-column grid
const MIN_TILE_WIDTH: f32 = 240.0;
const MAX_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Wanted,
    All,
}

impl CardKind {
    pub fn title(&self) -> &'static str {
        match self {
            CardKind::Wanted => "Wanted Items",
            CardKind::All => "All Items",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CardKind::Wanted => "Wanted items that are in stock",
            CardKind::All => "All items that are in stock",
        }
    }

    pub fn empty_message(&self) -> &'static str {
        match self {
            CardKind::Wanted => "No wanted items",
            CardKind::All => "No all items",
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            CardKind::Wanted => "Error loading wanted items",
            CardKind::All => "Error loading all items",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CardKind::Wanted => "wanted",
            CardKind::All => "all",
        }
    }

    /// The wanted card stays small so the full list keeps most of the window.
    fn max_height(&self) -> f32 {
        match self {
            CardKind::Wanted => 260.0,
            CardKind::All => f32::INFINITY,
        }
    }
}

/// What a card shows right now.
#[derive(Debug, PartialEq)]
pub enum CardView<'a> {
    Loading,
    Error(&'a str),
    Empty,
    Items(&'a [StockItem]),
}

/// Item key plus how many earlier items in the same snapshot share it.
type RowKey = (ItemKey, usize);

fn row_keys(items: &[StockItem]) -> Vec<RowKey> {
    let mut seen: HashMap<ItemKey, usize> = HashMap::new();
    items
        .iter()
        .map(|item| {
            let key = item.key();
            let occurrence = seen.entry(key.clone()).or_insert(0);
            let row_key = (key, *occurrence);
            *occurrence += 1;
            row_key
        })
        .collect()
}

/// Card state without the network: the query plus one row per item.
pub struct ListModel {
    kind: CardKind,
    query: QueryState<Vec<StockItem>>,
    rows: HashMap<RowKey, ItemRow>,
}

impl ListModel {
    pub fn new(kind: CardKind) -> Self {
        Self {
            kind,
            query: QueryState::default(),
            rows: HashMap::new(),
        }
    }

    /// Take a poll result. On success the items are sorted and rows are
    /// reconciled by key: vanished keys drop their row (and its countdown),
    /// new keys get a fresh row, surviving rows follow the new snapshot.
    ///
    /// Items that repeat a key within one snapshot get their own rows, told
    /// apart by position among the repeats.
    pub fn apply(
        &mut self,
        result: Result<Vec<StockItem>, FetchError>,
        now: i64,
        local: DateTime<Local>,
    ) {
        let result = result.map(|mut items| {
            sort_by_name(&mut items);
            items
        });
        self.query.apply(result, local);

        if self.query.status != QueryStatus::Success {
            return;
        }

        let items = &self.query.data;
        let before = self.rows.len();
        let mut rows = std::mem::take(&mut self.rows);
        for (item, key) in items.iter().zip(row_keys(items)) {
            let row = match rows.remove(&key) {
                Some(mut row) => {
                    row.sync(item, now);
                    row
                }
                None => ItemRow::new(item, now),
            };
            self.rows.insert(key, row);
        }

        debug!(
            card = self.kind.label(),
            items = items.len(),
            dropped_rows = rows.len(),
            previous_rows = before,
            "list updated"
        );
    }

    pub fn view(&self) -> CardView<'_> {
        if let Some(message) = self.query.error() {
            CardView::Error(message)
        } else if self.query.is_loading() {
            CardView::Loading
        } else if self.query.data.is_empty() {
            CardView::Empty
        } else {
            CardView::Items(&self.query.data)
        }
    }

    /// Advance every due countdown. True when anything changed.
    pub fn tick(&mut self, now: i64) -> bool {
        let mut changed = false;
        for row in self.rows.values_mut() {
            changed |= row.tick(now);
        }
        changed
    }

    pub fn next_tick_in(&self, now: i64) -> Option<Duration> {
        self.rows.values().filter_map(|row| row.next_tick_in(now)).min()
    }

    /// Row for the `occurrence`-th item carrying `key` (0 for the first).
    pub fn row_mut(&mut self, key: &ItemKey, occurrence: usize) -> Option<&mut ItemRow> {
        self.rows.get_mut(&(key.clone(), occurrence))
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.query.last_updated
    }
}

/// A polled list card: "Wanted" or "All".
pub struct ListCard {
    model: ListModel,
    poller: Poller<Vec<StockItem>>,
}

impl ListCard {
    pub fn spawn(
        kind: CardKind,
        client: StockClient,
        runtime: &Handle,
        interval: Duration,
        retry: RetryPolicy,
        notify: Notify,
    ) -> Self {
        let poller = match kind {
            CardKind::Wanted => Poller::spawn(runtime, "wanted", interval, retry, notify, move || {
                let client = client.clone();
                async move { client.fetch_wanted().await }
            }),
            CardKind::All => Poller::spawn(runtime, "all", interval, retry, notify, move || {
                let client = client.clone();
                async move { client.fetch_all().await }
            }),
        };

        Self {
            model: ListModel::new(kind),
            poller,
        }
    }

    /// Apply the newest poll result (if any) and advance countdowns.
    pub fn pump(&mut self, now: i64) {
        if let Some(result) = self.poller.latest() {
            self.model.apply(result, now, Local::now());
        }
        self.model.tick(now);
    }

    pub fn next_tick_in(&self, now: i64) -> Option<Duration> {
        self.model.next_tick_in(now)
    }

    pub fn show(
        &mut self,
        ui: &mut Ui,
        images: &ImageMap,
        textures: &mut TextureStore,
        theme: &AppTheme,
    ) {
        let kind = self.model.kind;

        egui::Frame::new()
            .fill(theme.panel_background)
            .corner_radius(CornerRadius::same(10))
            .stroke(Stroke::new(1.0, theme.separator))
            .inner_margin(16.0)
            .outer_margin(egui::vec2(8.0, 6.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.label(
                            RichText::new(kind.title())
                                .color(theme.highlight)
                                .size(20.0)
                                .strong(),
                        );
                        ui.label(
                            RichText::new(kind.description())
                                .color(theme.secondary_text)
                                .size(13.0),
                        );
                    });

                    if let Some(updated) = self.model.last_updated() {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                            ui.label(
                                RichText::new(format!("Updated {}", updated.format("%H:%M:%S")))
                                    .color(theme.secondary_text)
                                    .size(12.0)
                                    .italics(),
                            );
                        });
                    }
                });
                ui.add_space(8.0);

                match self.model.view() {
                    CardView::Loading => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(RichText::new("Loading...").color(theme.secondary_text));
                        });
                        return;
                    }
                    CardView::Error(message) => {
                        ui.label(
                            RichText::new(kind.error_message())
                                .color(theme.error_text)
                                .strong(),
                        )
                        .on_hover_text(message);
                        return;
                    }
                    CardView::Empty => {
                        ui.label(
                            RichText::new(kind.empty_message())
                                .color(theme.secondary_text)
                                .italics(),
                        );
                        return;
                    }
                    CardView::Items(_) => {}
                }

                let ListModel { query, rows, .. } = &mut self.model;
                ScrollArea::vertical()
                    .id_salt(kind.label())
                    .max_height(kind.max_height())
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        let spacing = ui.spacing().item_spacing.x;
                        let available = ui.available_width();
                        let columns =
                            ((available / MIN_TILE_WIDTH) as usize).clamp(1, MAX_COLUMNS);
                        // Tile frames add 10px margin and 1px stroke per side
                        let gaps = spacing * (columns - 1) as f32;
                        let tile_width = ((available - gaps) / columns as f32 - 22.0).max(120.0);

                        ui.horizontal_wrapped(|ui| {
                            for (item, key) in query.data.iter().zip(row_keys(&query.data)) {
                                if let Some(row) = rows.get_mut(&key) {
                                    row.show(ui, item, images, textures, theme, tile_width);
                                }
                            }
                        });
                    });
            });
    }
}
