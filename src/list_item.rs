use egui::load::SizedTexture;
use egui::{
    Align, Align2, Color32, CornerRadius, CursorIcon, FontId, Layout, RichText, Sense, Stroke, Ui,
};
use std::time::Duration;

use crate::avatar;
use crate::countdown::{format_countdown, Countdown};
use crate::models::{ImageMap, StockItem};
use crate::textures::{AvatarTexture, TextureStore};
use crate::AppTheme;

const AVATAR_SIZE: f32 = 48.0;

/// Bottom-right indicator of a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Badge {
    Hidden,
    Countdown(String),
    Expired,
}

/// What goes in the avatar square.
#[derive(Debug, Clone, PartialEq)]
pub enum Avatar<'a> {
    Image(&'a str),
    Initials { label: String, color: Color32 },
}

pub fn avatar_for<'a>(name: &str, images: &'a ImageMap) -> Avatar<'a> {
    match images.get(name) {
        Some(url) if !url.is_empty() => Avatar::Image(url),
        _ => Avatar::Initials {
            label: avatar::initials(name),
            color: avatar::color_for(name),
        },
    }
}

/// UI state for one rendered item: its countdown and the purchased flag.
/// Lives exactly as long as the item's key stays in the list.
#[derive(Debug)]
pub struct ItemRow {
    countdown: Countdown,
    purchased: bool,
}

impl ItemRow {
    pub fn new(item: &StockItem, now: i64) -> Self {
        Self {
            countdown: Countdown::start(item.restock_time, now),
            purchased: false,
        }
    }

    /// Follow a new snapshot of the same item.
    pub fn sync(&mut self, item: &StockItem, now: i64) {
        self.countdown.retarget(item.restock_time, now);
    }

    pub fn tick(&mut self, now: i64) -> bool {
        self.countdown.tick(now)
    }

    pub fn next_tick_in(&self, now: i64) -> Option<Duration> {
        self.countdown.next_tick_in(now)
    }

    pub fn badge(&self) -> Badge {
        if !self.countdown.is_active() {
            Badge::Hidden
        } else if self.countdown.is_expired() {
            Badge::Expired
        } else {
            Badge::Countdown(format_countdown(self.countdown.remaining()))
        }
    }

    pub fn toggle_purchased(&mut self) {
        self.purchased = !self.purchased;
    }

    pub fn is_purchased(&self) -> bool {
        self.purchased
    }

    pub fn show(
        &mut self,
        ui: &mut Ui,
        item: &StockItem,
        images: &ImageMap,
        textures: &mut TextureStore,
        theme: &AppTheme,
        width: f32,
    ) {
        let fill = if self.purchased {
            theme.purchased_background
        } else {
            theme.card_background
        };

        let inner = egui::Frame::new()
            .fill(fill)
            .corner_radius(CornerRadius::same(12))
            .stroke(Stroke::new(1.0, theme.separator))
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_width(width);
                ui.horizontal(|ui| {
                    show_avatar(ui, item, images, textures, theme);
                    ui.add_space(8.0);

                    ui.vertical(|ui| {
                        ui.label(RichText::new(&item.name).color(theme.text).size(15.0).strong());
                        ui.label(
                            RichText::new(item.count.to_string())
                                .color(theme.secondary_text)
                                .size(13.0),
                        );
                    });

                    ui.with_layout(Layout::right_to_left(Align::Max), |ui| {
                        self.show_badge(ui, theme);
                    });
                });
            });

        let hint = if self.purchased {
            "Mark as not purchased"
        } else {
            "Mark as purchased"
        };
        let response = inner
            .response
            .interact(Sense::click())
            .on_hover_cursor(CursorIcon::PointingHand)
            .on_hover_text(hint);

        if response.hovered() {
            ui.painter().rect_stroke(
                response.rect,
                CornerRadius::same(12),
                Stroke::new(2.0, theme.accent),
                egui::StrokeKind::Outside,
            );
        }

        if response.clicked() {
            self.toggle_purchased();
        }
    }

    fn show_badge(&self, ui: &mut Ui, theme: &AppTheme) {
        let (text, text_color, fill, tooltip) = match self.badge() {
            Badge::Hidden => return,
            Badge::Countdown(text) => (
                text,
                theme.countdown_text,
                theme.countdown_background,
                "Restock countdown",
            ),
            Badge::Expired => (
                "EXPIRED".to_string(),
                Color32::WHITE,
                theme.expired_background,
                "Expired",
            ),
        };

        egui::Frame::new()
            .fill(fill)
            .corner_radius(CornerRadius::same(4))
            .inner_margin(egui::Margin::symmetric(6, 2))
            .show(ui, |ui| {
                ui.label(RichText::new(text).color(text_color).size(11.0).strong());
            })
            .response
            .on_hover_text(tooltip);
    }
}

fn show_avatar(
    ui: &mut Ui,
    item: &StockItem,
    images: &ImageMap,
    textures: &mut TextureStore,
    theme: &AppTheme,
) {
    let size = egui::vec2(AVATAR_SIZE, AVATAR_SIZE);

    let (label, color) = match avatar_for(&item.name, images) {
        Avatar::Image(url) => match textures.get(url) {
            AvatarTexture::Ready(texture) => {
                ui.add(
                    egui::Image::new(SizedTexture::from_handle(texture))
                        .fit_to_exact_size(size)
                        .corner_radius(CornerRadius::same(6)),
                )
                .on_hover_text(&item.name);
                return;
            }
            AvatarTexture::Pending => {
                let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
                ui.painter().rect_filled(rect, CornerRadius::same(6), theme.separator);
                return;
            }
            // Broken image: same fallback as a missing cache entry
            AvatarTexture::Failed => (avatar::initials(&item.name), avatar::color_for(&item.name)),
        },
        Avatar::Initials { label, color } => (label, color),
    };

    let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
    let painter = ui.painter();
    painter.rect_filled(rect, CornerRadius::same(6), color);
    painter.text(
        rect.center(),
        Align2::CENTER_CENTER,
        label,
        FontId::proportional(20.0),
        Color32::WHITE,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn item(name: &str, restock_time: i64) -> StockItem {
        StockItem {
            name: name.to_string(),
            count: 3,
            restock_time,
            stock_time: 0,
        }
    }

    #[test]
    fn no_badge_without_restock_time() {
        let row = ItemRow::new(&item("Carrot", 0), NOW);
        assert_eq!(row.badge(), Badge::Hidden);

        let row = ItemRow::new(&item("Carrot", -20), NOW);
        assert_eq!(row.badge(), Badge::Hidden);
    }

    #[test]
    fn countdown_badge_for_future_restock() {
        let row = ItemRow::new(&item("Carrot", NOW + 65_000), NOW);
        assert_eq!(row.badge(), Badge::Countdown("1:05".to_string()));
    }

    #[test]
    fn expired_badge_for_past_restock() {
        let row = ItemRow::new(&item("Carrot", NOW - 1), NOW);
        assert_eq!(row.badge(), Badge::Expired);
    }

    #[test]
    fn countdown_turns_into_expired() {
        let mut row = ItemRow::new(&item("Carrot", NOW + 1_000), NOW);
        assert!(row.tick(NOW + 1_000));
        assert_eq!(row.badge(), Badge::Expired);
        assert_eq!(row.next_tick_in(NOW + 1_000), None);
    }

    #[test]
    fn purchased_toggles_and_survives_sync() {
        let mut row = ItemRow::new(&item("Koi", NOW + 5_000), NOW);
        assert!(!row.is_purchased());

        row.toggle_purchased();
        assert!(row.is_purchased());

        row.sync(&item("Koi", NOW + 90_000), NOW + 10);
        assert!(row.is_purchased());
        assert_eq!(row.badge(), Badge::Countdown("1:29".to_string()));

        row.toggle_purchased();
        assert!(!row.is_purchased());
    }

    #[test]
    fn cached_image_wins_over_initials() {
        let images: ImageMap = [("Blue Potion".to_string(), "https://img/bp.png".to_string())]
            .into_iter()
            .collect();

        assert_eq!(avatar_for("Blue Potion", &images), Avatar::Image("https://img/bp.png"));
    }

    #[test]
    fn empty_cache_synthesizes_every_avatar() {
        let images = ImageMap::new();
        for name in ["Blue Potion", "X", "Ember Lily", "koi"] {
            match avatar_for(name, &images) {
                Avatar::Initials { label, color } => {
                    assert_eq!(label, avatar::initials(name));
                    assert_eq!(color, avatar::color_for(name));
                }
                Avatar::Image(_) => panic!("no image expected for {}", name),
            }
        }

        assert_eq!(
            avatar_for("Blue Potion", &images),
            Avatar::Initials {
                label: "BP".to_string(),
                color: avatar::color_for("Blue Potion"),
            }
        );
        assert!(matches!(avatar_for("X", &images), Avatar::Initials { label, .. } if label == "X"));
    }
}
