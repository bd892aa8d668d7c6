//! Terminal geometry and rendering helpers.
//!
//! Nothing here keeps global state: [`Layout`] is rebuilt from every resize
//! and [`Viewport`] only knows its content, its size and its scroll offset.
//! Rendering functions return lines; the caller decides how to put them on
//! screen.

use console::{measure_text_width, style, truncate_str};

const TITLE: &str = "Certificate details";
const LIST_TITLE: &str = "Select the URL you want to check";
const LIST_HELP: &str = "↑/k up • ↓/j down • enter check • q quit";
const DOCUMENT_HELP: &str = "↑/k ↓/j scroll • pgup/pgdn page • ←/h back • q quit";
const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Rows above the header: the blank line every view starts with.
const TOP_MARGIN: usize = 1;

/// Screen split derived from the terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: usize,
    pub height: usize,
    pub header_height: usize,
    pub footer_height: usize,
}

impl Layout {
    pub fn new(width: u16, height: u16) -> Self {
        let width = usize::from(width);
        Layout {
            width,
            height: usize::from(height),
            header_height: header_view(width).len(),
            footer_height: footer_view(width, 0.0).len(),
        }
    }

    /// Rows left for the scrollable document.
    pub fn body_height(&self) -> usize {
        self.height
            .saturating_sub(TOP_MARGIN + self.header_height + self.footer_height)
    }

    /// Endpoints shown per list page.
    pub fn list_page_size(&self) -> usize {
        // title and blank line above the items; blank line, page counter
        // and help line below them
        self.height.saturating_sub(TOP_MARGIN + 5).max(1)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::new(80, 24)
    }
}

/// A scrollable window over a text document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    lines: Vec<String>,
    offset: usize,
    width: usize,
    height: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Viewport {
            width,
            height,
            ..Viewport::default()
        }
    }

    /// Replaces the content and scrolls back to the top.
    pub fn set_content(&mut self, content: &str) {
        self.lines = content.lines().map(str::to_string).collect();
        self.offset = 0;
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.offset = (self.offset + rows).min(self.max_offset());
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.offset = self.offset.saturating_sub(rows);
    }

    /// Fraction of the document scrolled past, 1.0 when it all fits.
    pub fn scroll_percent(&self) -> f64 {
        let max = self.max_offset();
        if max == 0 {
            1.0
        } else {
            self.offset as f64 / max as f64
        }
    }

    /// The rows currently on screen, clipped to the viewport width.
    pub fn visible_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .skip(self.offset)
            .take(self.height)
            .map(|line| truncate_str(line, self.width, "").into_owned())
            .collect()
    }
}

fn rule(width: usize, used: usize) -> String {
    "─".repeat(width.saturating_sub(used))
}

pub fn header_view(width: usize) -> Vec<String> {
    let title = format!("  {} ", TITLE);
    let line = rule(width, measure_text_width(&title));
    vec![format!("{}{}", style(title).bold(), style(line).dim())]
}

pub fn footer_view(width: usize, percent: f64) -> Vec<String> {
    let info = format!(" {:3.0}% │ {}", percent * 100.0, DOCUMENT_HELP);
    let info = truncate_str(&info, width, "…").into_owned();
    let line = rule(width, measure_text_width(&info));
    vec![format!("{}{}", style(line).dim(), style(info).dim())]
}

/// The document screen: header, visible rows padded to the body height, footer.
pub fn document_view(layout: &Layout, viewport: &Viewport) -> Vec<String> {
    let mut lines = vec![String::new()];
    lines.extend(header_view(layout.width));

    let visible = viewport.visible_lines();
    let padding = viewport.height().saturating_sub(visible.len());
    lines.extend(visible);
    lines.extend(std::iter::repeat(String::new()).take(padding));

    lines.extend(footer_view(layout.width, viewport.scroll_percent()));
    lines
}

/// The endpoint picker, paged so the selection is always visible.
pub fn list_view(layout: &Layout, endpoints: &[String], selection: usize) -> Vec<String> {
    let page_size = layout.list_page_size();
    let page = selection / page_size;
    let pages = endpoints.len().div_ceil(page_size).max(1);

    let mut lines = vec![String::new(), format!("  {}", style(LIST_TITLE).bold()), String::new()];
    for (index, endpoint) in endpoints
        .iter()
        .enumerate()
        .skip(page * page_size)
        .take(page_size)
    {
        let item = format!("{}. {}", index + 1, endpoint);
        let row = if index == selection {
            format!("  {}", style(format!("> {}", item)).color256(170))
        } else {
            format!("    {}", item)
        };
        lines.push(truncate_str(&row, layout.width, "…").into_owned());
    }
    lines.push(String::new());
    if pages > 1 {
        lines.push(format!("    {}", style(format!("page {}/{}", page + 1, pages)).dim()));
    }
    lines.push(format!("    {}", style(LIST_HELP).dim()));
    lines
}

/// The progress screen shown while a probe is outstanding.
pub fn checking_view(frame: usize, endpoint: &str) -> Vec<String> {
    let spinner = SPINNER_FRAMES[frame % SPINNER_FRAMES.len()];
    vec![
        String::new(),
        format!(
            "  {} {} {}",
            style(spinner).color256(69),
            style("Checking...").color256(252),
            style(endpoint).dim()
        ),
    ]
}
