use crate::state::Connection;
use candash_core::TriState;
use ratatui::style::{Color, Modifier, Style};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(142, 192, 124))
    .add_modifier(Modifier::BOLD);
pub const TITLE_STYLE: Style = Style::new()
    .fg(Color::Rgb(191, 219, 254))
    .add_modifier(Modifier::BOLD);
pub const MUTED_STYLE: Style = Style::new().fg(Color::Rgb(146, 131, 116));
pub const BUTTON_STYLE: Style = Style::new()
    .fg(Color::Rgb(250, 189, 47))
    .add_modifier(Modifier::BOLD);

pub fn zebra_row_style(index: usize) -> Style {
    let bg = if index % 2 == 0 {
        Color::Rgb(18, 20, 26)
    } else {
        Color::Rgb(24, 27, 34)
    };
    Style::new().bg(bg)
}

pub fn connection_color(connection: &Connection) -> Color {
    match connection {
        Connection::Connected => Color::Rgb(184, 187, 38),
        Connection::Errored { .. } => Color::Rgb(254, 128, 25),
        Connection::Disconnected => Color::Rgb(146, 131, 116),
    }
}

pub fn tri_state_color(state: TriState) -> Color {
    match state {
        TriState::True => Color::Rgb(184, 187, 38),
        TriState::False => Color::Rgb(214, 93, 14),
        TriState::Unknown => Color::Rgb(146, 131, 116),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tri_states_render_in_distinct_colors() {
        let colors = [
            tri_state_color(TriState::True),
            tri_state_color(TriState::False),
            tri_state_color(TriState::Unknown),
        ];
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
    }
}
