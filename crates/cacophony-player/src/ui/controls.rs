//! Overlay controls: filter bar, zoom buttons and the colour panel
//!
//! Pure view functions over the explorer's state; every interaction is a
//! [`Message`] handled in [`super::app`].

use cacophony_core::dataset::{Gender, SoundType};
use cacophony_core::engine::ZoomDirection;
use cacophony_core::filter::{suggest, FilterSet, AGE_PREFIX, AGE_RANGES};
use cacophony_core::palette::{filter_color, ColorMode};
use cacophony_widgets::theme::{to_color, LABEL_BG, LABEL_BORDER, LABEL_TEXT, MUTED_TEXT};
use iced::widget::{button, column, container, mouse_area, pick_list, row, text, text_input, Space};
use iced::{Alignment, Background, Border, Color, Element, Length, Theme};

use super::message::Message;

const FILTER_PLACEHOLDER: &str = "Add filter (e.g. Cough, Female, Age 35-44)";
const MAX_SUGGESTIONS: usize = 8;
const ZOOM_BUTTON_SIZE: f32 = 40.0;

/// Browsable group of filter names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCategory {
    SoundType,
    Gender,
    Age,
}

impl FilterCategory {
    pub const ALL: [FilterCategory; 3] = [
        FilterCategory::SoundType,
        FilterCategory::Gender,
        FilterCategory::Age,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FilterCategory::SoundType => "Sound Type",
            FilterCategory::Gender => "Gender",
            FilterCategory::Age => "Age",
        }
    }

    /// Filter names offered under this category
    pub fn options(&self) -> Vec<String> {
        match self {
            FilterCategory::SoundType => {
                SoundType::ALL.iter().map(|s| s.name().to_string()).collect()
            }
            FilterCategory::Gender => Gender::ALL.iter().map(|g| g.name().to_string()).collect(),
            FilterCategory::Age => AGE_RANGES
                .iter()
                .map(|r| format!("{}{}", AGE_PREFIX, r.label))
                .collect(),
        }
    }
}

/// Suggestions for `query` that are not already filters
pub fn suggestions_for(query: &str, filters: &FilterSet) -> Vec<String> {
    suggest(query)
        .into_iter()
        .filter(|name| !filters.contains(name))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Search input, suggestion or category menu, and the filter chips
pub fn filter_bar<'a>(
    query: &'a str,
    browsing: Option<FilterCategory>,
    filters: &'a FilterSet,
) -> Element<'a, Message> {
    let input = text_input(FILTER_PLACEHOLDER, query)
        .on_input(Message::FilterQuery)
        .on_submit(Message::SubmitFilter)
        .padding(8)
        .size(14)
        .width(Length::Fixed(340.0));

    let menu: Element<'a, Message> = if query.trim().is_empty() {
        category_menu(browsing, filters)
    } else {
        let items = suggestions_for(query, filters);
        if items.is_empty() {
            text("No matching filters").size(12).color(MUTED_TEXT).into()
        } else {
            column(items.into_iter().map(menu_item)).spacing(2).into()
        }
    };

    let chips = row(filters.filters().iter().map(|f| chip(&f.name, f.active)))
        .spacing(6)
        .wrap();

    container(column![input, menu, chips].spacing(8).width(Length::Fixed(340.0)))
        .padding(10)
        .style(panel_style)
        .into()
}

fn category_menu<'a>(
    browsing: Option<FilterCategory>,
    filters: &FilterSet,
) -> Element<'a, Message> {
    let tabs = row(FilterCategory::ALL.iter().map(|category| {
        let open = browsing == Some(*category);
        let next = if open { None } else { Some(*category) };
        button(text(category.label()).size(12))
            .on_press(Message::BrowseCategory(next))
            .style(if open { button::primary } else { button::secondary })
            .into()
    }))
    .spacing(6);

    match browsing {
        Some(category) => {
            let options = category
                .options()
                .into_iter()
                .filter(|name| !filters.contains(name))
                .map(menu_item);
            column![tabs, column(options).spacing(2)].spacing(6).into()
        }
        None => tabs.into(),
    }
}

fn menu_item<'a>(name: String) -> Element<'a, Message> {
    let swatch = swatch(filter_color(&name).map(to_color).unwrap_or(MUTED_TEXT), 10.0);
    button(row![swatch, text(name.clone()).size(13)].spacing(8).align_y(Alignment::Center))
        .on_press(Message::AddFilter(name))
        .width(Length::Fill)
        .style(button::text)
        .into()
}

/// Toggle on the label, remove on the cross; inactive chips are faded
fn chip<'a>(name: &str, active: bool) -> Element<'a, Message> {
    let base = filter_color(name).map(to_color).unwrap_or(MUTED_TEXT);
    let color = if active { base } else { Color { a: 0.35, ..base } };

    let label = button(text(name.to_string()).size(12).color(Color::WHITE))
        .on_press(Message::ToggleFilter(name.to_string()))
        .padding([4, 8])
        .style(button::text);
    let remove = button(text("×").size(12).color(Color::WHITE))
        .on_press(Message::RemoveFilter(name.to_string()))
        .padding([4, 6])
        .style(button::text);

    container(row![label, remove].align_y(Alignment::Center))
        .style(move |_theme| container::Style {
            background: Some(Background::Color(color)),
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 12.0.into(),
            },
            ..Default::default()
        })
        .into()
}

/// `+` above `-`; holding a button zooms continuously
pub fn zoom_buttons<'a>(can_zoom_in: bool, can_zoom_out: bool) -> Element<'a, Message> {
    column![
        zoom_button("+", ZoomDirection::In, can_zoom_in),
        zoom_button("−", ZoomDirection::Out, can_zoom_out),
    ]
    .spacing(8)
    .into()
}

/// Release and exit always stop, so a zoom that hits its bound mid-press
/// still ends cleanly
fn zoom_button<'a>(label: &'a str, direction: ZoomDirection, enabled: bool) -> Element<'a, Message> {
    let btn = button(text(label).size(20).center())
        .width(Length::Fixed(ZOOM_BUTTON_SIZE))
        .height(Length::Fixed(ZOOM_BUTTON_SIZE))
        .style(move |theme: &Theme, _status| {
            let status = if enabled {
                button::Status::Active
            } else {
                button::Status::Disabled
            };
            button::primary(theme, status)
        });

    let mut area = mouse_area(btn)
        .on_release(Message::ZoomReleased)
        .on_exit(Message::ZoomReleased);
    if enabled {
        area = area.on_press(Message::ZoomPressed(direction));
    }
    area.into()
}

/// "Color by" selector with its legend; minimised it shows only the header
pub fn control_panel<'a>(mode: ColorMode, minimized: bool) -> Element<'a, Message> {
    let toggle = button(text(if minimized { "+" } else { "−" }).size(12))
        .on_press(Message::TogglePanel)
        .padding([2, 8])
        .style(button::secondary);

    if minimized {
        return container(row![text("Controls").size(13).color(LABEL_TEXT), toggle]
            .spacing(10)
            .align_y(Alignment::Center))
        .padding(8)
        .style(panel_style)
        .into();
    }

    let header = row![
        text("Color by:").size(13).color(LABEL_TEXT),
        pick_list(&ColorMode::ALL[..], Some(mode), Message::SetColorMode).text_size(13),
        Space::new().width(Length::Fill),
        toggle,
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let legend = column(mode.legend().into_iter().map(|(label, color)| {
        row![swatch(to_color(color), 12.0), text(label).size(12).color(LABEL_TEXT)]
            .spacing(8)
            .align_y(Alignment::Center)
            .into()
    }))
    .spacing(4);

    container(column![header, legend].spacing(10).width(Length::Fixed(240.0)))
        .padding(10)
        .style(panel_style)
        .into()
}

/// Centered status shown until the first grid is published
pub fn loading_overlay<'a>(status: Option<&'a str>) -> Element<'a, Message> {
    let mut content = column![text("Loading…").size(20).color(LABEL_TEXT)]
        .spacing(8)
        .align_x(Alignment::Center);
    if let Some(status) = status {
        content = content.push(text(status).size(12).color(MUTED_TEXT));
    }

    container(container(content).padding(20).style(panel_style))
        .center(Length::Fill)
        .style(|_theme| container::Style {
            background: Some(Color::from_rgba(1.0, 1.0, 1.0, 0.6).into()),
            ..Default::default()
        })
        .into()
}

fn swatch<'a>(color: Color, size: f32) -> Element<'a, Message> {
    container(Space::new())
        .width(Length::Fixed(size))
        .height(Length::Fixed(size))
        .style(move |_theme| container::Style {
            background: Some(Background::Color(color)),
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 2.0.into(),
            },
            ..Default::default()
        })
        .into()
}

fn panel_style(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(LABEL_BG)),
        border: Border {
            color: LABEL_BORDER,
            width: 1.0,
            radius: 8.0.into(),
        },
        ..Default::default()
    }
}
