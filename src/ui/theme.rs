use ratatui::style::Color;

pub const BG_PRIMARY: Color = Color::Rgb(0, 0, 0);
pub const BG_PANEL: Color = Color::Rgb(12, 12, 12);
pub const FG_PRIMARY: Color = Color::Rgb(190, 190, 190);
pub const FG_DIM: Color = Color::Rgb(128, 128, 128);

pub const BAR_BG: Color = Color::Rgb(23, 52, 127);
pub const BAR_TEXT: Color = Color::Rgb(235, 240, 255);

pub const MENU_BG: Color = Color::Rgb(79, 79, 79);
pub const MENU_BORDER: Color = Color::Rgb(208, 208, 208);

pub const BORDER_IDLE: Color = Color::Rgb(61, 120, 120);
pub const BORDER_FOCUS: Color = Color::Rgb(187, 94, 0);

pub const BUTTON_BG: Color = Color::Rgb(61, 120, 120);
pub const BUTTON_FOCUS_BG: Color = Color::Rgb(187, 94, 0);
pub const BUTTON_TEXT: Color = Color::Rgb(255, 255, 255);

pub const USER_LABEL: Color = Color::Cyan;
pub const ASSISTANT_LABEL: Color = Color::Rgb(120, 160, 255);
pub const SUCCESS: Color = Color::Green;
pub const ERROR: Color = Color::LightRed;
