use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, List, ListItem, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

/// Scrollable list content, shifted down while it is pulled past its top
pub struct ListPane<'a> {
    pub title: String,
    pub items: &'a [String],
    /// Rows of empty space above the first item
    pub pulled_rows: u16,
    pub border_color: Color,
}

impl<'a> ListPane<'a> {
    pub fn new(title: impl Into<String>, items: &'a [String], pulled_rows: u16) -> Self {
        Self {
            title: title.into(),
            items,
            pulled_rows,
            border_color: Color::DarkGray,
        }
    }

    pub fn with_border_color(mut self, color: Color) -> Self {
        self.border_color = color;
        self
    }

    /// Outer block of the pane
    pub fn block(&self) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.border_color))
            .title(Span::styled(
                format!(" {} ({}) ", self.title, self.items.len()),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ))
    }

    /// Area the items occupy inside `inner`, below the pulled gap
    pub fn content_area(&self, inner: Rect) -> Rect {
        let gap = self.pulled_rows.min(inner.height);
        Rect {
            x: inner.x,
            y: inner.y + gap,
            width: inner.width,
            height: inner.height - gap,
        }
    }

    /// Render the pane; returns the gap area above the items
    pub fn render(&self, frame: &mut Frame, area: Rect) -> Rect {
        let block = self.block();
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let content = self.content_area(inner);
        let list_items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| ListItem::new(item.as_str()))
            .collect();
        frame.render_widget(List::new(list_items), content);

        if self.items.len() > content.height as usize && content.height > 0 {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));
            let mut state = ScrollbarState::new(self.items.len());
            let scroll_area = Rect {
                x: area.x + area.width.saturating_sub(1),
                y: content.y,
                width: 1,
                height: content.height,
            };
            frame.render_stateful_widget(scrollbar, scroll_area, &mut state);
        }

        Rect {
            height: content.y - inner.y,
            ..inner
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_area_shifts_by_pulled_rows() {
        let items = vec!["a".to_string()];
        let pane = ListPane::new("Inbox", &items, 3);
        let inner = Rect::new(1, 1, 20, 10);

        let content = pane.content_area(inner);
        assert_eq!(content, Rect::new(1, 4, 20, 7));
    }

    #[test]
    fn test_content_area_clamps_gap() {
        let items = Vec::new();
        let pane = ListPane::new("Inbox", &items, 40);
        let inner = Rect::new(0, 0, 10, 5);

        let content = pane.content_area(inner);
        assert_eq!(content.height, 0);
        assert_eq!(content.y, 5);
    }
}
