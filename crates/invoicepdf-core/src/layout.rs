//! Fixed-geometry page layout
//!
//! Coordinates are millimetres from the top-left corner of the page. Every
//! emission takes a [`LayoutCursor`] and returns the advanced cursor; there is
//! no hidden drawing position.

use tracing::debug;

/// Points per millimetre
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// Page size, margins and stroke settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub left_margin: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    /// Gap between a cell's left edge and its text
    pub cell_padding: f32,
    pub line_width: f32,
}

impl PageGeometry {
    /// A4 portrait with 1 cm margins and a 2 cm bottom margin
    pub const A4_PORTRAIT: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        left_margin: 10.0,
        top_margin: 10.0,
        bottom_margin: 20.0,
        cell_padding: 1.0,
        line_width: 0.2,
    };

    /// Lowest y any element may reach before a new page is started
    pub fn break_threshold(&self) -> f32 {
        self.height - self.bottom_margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4_PORTRAIT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
}

/// Font face and size in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    pub style: FontStyle,
    pub size: f32,
}

impl Font {
    pub const fn regular(size: f32) -> Self {
        Self {
            style: FontStyle::Regular,
            size,
        }
    }

    pub const fn bold(size: f32) -> Self {
        Self {
            style: FontStyle::Bold,
            size,
        }
    }

    /// Font size in millimetres
    pub fn size_mm(&self) -> f32 {
        self.size / MM_TO_PT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const GREY: Rgb = Rgb(80, 80, 80);

    /// Components scaled to the 0-1 range
    pub fn unit(&self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

/// Where the cursor goes after a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineBreak {
    /// Stay on the line, right of the cell
    Right,
    /// Start of the next line
    NextLine,
}

/// Current drawing position: page index plus top-left coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub page: usize,
    pub x: f32,
    pub y: f32,
}

/// Visual attributes of a text cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStyle {
    pub font: Font,
    pub color: Rgb,
    pub border: bool,
}

/// A positioned text cell
#[derive(Debug, Clone, PartialEq)]
pub struct TextCell {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub text: String,
    pub style: CellStyle,
}

/// A positioned image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextCell),
    Image(ImageBox),
}

impl Element {
    /// Lowest y covered by the element
    pub fn bottom(&self) -> f32 {
        match self {
            Element::Text(cell) => cell.y + cell.height,
            Element::Image(image) => image.y + image.height,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

/// Accumulates pages of elements
#[derive(Debug, Clone)]
pub struct Layout {
    geometry: PageGeometry,
    pages: Vec<Page>,
}

impl Layout {
    /// Start a layout with one empty page and a cursor at its top-left margin
    pub fn new(geometry: PageGeometry) -> (Self, LayoutCursor) {
        let layout = Self {
            geometry,
            pages: vec![Page::default()],
        };
        let cursor = LayoutCursor {
            page: 0,
            x: geometry.left_margin,
            y: geometry.top_margin,
        };
        (layout, cursor)
    }

    /// Emit a text cell at the cursor
    pub fn cell(
        &mut self,
        cursor: LayoutCursor,
        width: f32,
        height: f32,
        text: impl Into<String>,
        style: CellStyle,
        line_break: LineBreak,
    ) -> LayoutCursor {
        let cursor = self.ensure_room(cursor, height);
        self.push(
            cursor,
            Element::Text(TextCell {
                x: cursor.x,
                y: cursor.y,
                width,
                height,
                text: text.into(),
                style,
            }),
        );

        match line_break {
            LineBreak::Right => LayoutCursor {
                x: cursor.x + width,
                ..cursor
            },
            LineBreak::NextLine => LayoutCursor {
                x: self.geometry.left_margin,
                y: cursor.y + height,
                ..cursor
            },
        }
    }

    /// Place an image at the cursor; the cursor moves down by its height
    pub fn image(&mut self, cursor: LayoutCursor, width: f32, height: f32) -> LayoutCursor {
        let cursor = self.ensure_room(cursor, height);
        self.push(
            cursor,
            Element::Image(ImageBox {
                x: cursor.x,
                y: cursor.y,
                width,
                height,
            }),
        );
        LayoutCursor {
            y: cursor.y + height,
            ..cursor
        }
    }

    /// Start a new page if an element of `height` would cross the threshold.
    /// The horizontal position is kept.
    fn ensure_room(&mut self, cursor: LayoutCursor, height: f32) -> LayoutCursor {
        let on_fresh_page = cursor.y <= self.geometry.top_margin;
        if cursor.y + height <= self.geometry.break_threshold() || on_fresh_page {
            return cursor;
        }

        self.pages.push(Page::default());
        let page = self.pages.len() - 1;
        debug!("Page break before y={:.1}, starting page {}", cursor.y, page + 1);
        LayoutCursor {
            page,
            x: cursor.x,
            y: self.geometry.top_margin,
        }
    }

    fn push(&mut self, cursor: LayoutCursor, element: Element) {
        if let Some(page) = self.pages.get_mut(cursor.page) {
            page.elements.push(element);
        }
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PLAIN: CellStyle = CellStyle {
        font: Font::regular(10.0),
        color: Rgb::BLACK,
        border: true,
    };

    #[test]
    fn test_cursor_starts_at_margins() {
        let (_, cursor) = Layout::new(PageGeometry::A4_PORTRAIT);
        assert_eq!(cursor, LayoutCursor { page: 0, x: 10.0, y: 10.0 });
    }

    #[test]
    fn test_cell_advances_right_then_next_line() {
        let (mut layout, cursor) = Layout::new(PageGeometry::A4_PORTRAIT);
        let cursor = layout.cell(cursor, 30.0, 8.0, "a", PLAIN, LineBreak::Right);
        assert_eq!(cursor, LayoutCursor { page: 0, x: 40.0, y: 10.0 });

        let cursor = layout.cell(cursor, 70.0, 8.0, "b", PLAIN, LineBreak::NextLine);
        assert_eq!(cursor, LayoutCursor { page: 0, x: 10.0, y: 18.0 });

        let pages = layout.into_pages();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].elements.len(), 2);
    }

    #[test]
    fn test_image_moves_cursor_down_only() {
        let (mut layout, cursor) = Layout::new(PageGeometry::A4_PORTRAIT);
        let cursor = LayoutCursor { x: 40.0, ..cursor };
        let after = layout.image(cursor, 10.0, 5.0);
        assert_eq!(after, LayoutCursor { page: 0, x: 40.0, y: 15.0 });
    }

    #[test]
    fn test_page_break_keeps_x() {
        let (mut layout, cursor) = Layout::new(PageGeometry::A4_PORTRAIT);
        let low = LayoutCursor { y: 272.0, x: 40.0, ..cursor };
        let after = layout.cell(low, 30.0, 8.0, "x", PLAIN, LineBreak::Right);
        assert_eq!(after, LayoutCursor { page: 1, x: 70.0, y: 10.0 });

        let pages = layout.into_pages();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].elements.is_empty());
        match &pages[1].elements[0] {
            Element::Text(cell) => assert_eq!((cell.x, cell.y), (40.0, 10.0)),
            other => panic!("unexpected element: {other:?}"),
        }
    }

    #[test]
    fn test_cell_ending_on_threshold_stays() {
        let (mut layout, cursor) = Layout::new(PageGeometry::A4_PORTRAIT);
        let at = LayoutCursor { y: 269.0, ..cursor };
        let after = layout.cell(at, 30.0, 8.0, "x", PLAIN, LineBreak::NextLine);
        assert_eq!(after.page, 0);
        assert_eq!(after.y, 277.0);
    }

    #[test]
    fn test_font_size_in_mm() {
        let size = Font::bold(14.0).size_mm();
        assert!((size - 4.9389).abs() < 1e-3);
    }
}
