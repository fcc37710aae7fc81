//! Invoice layout
//!
//! Turns a [`LineItemTable`] into an [`InvoiceDocument`]: title block, item
//! table with totals row, total statement and branding line. Nothing here
//! touches the filesystem.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::config::RenderConfig;
use crate::error::InvoiceError;
use crate::layout::{
    CellStyle, Element, Font, ImageBox, Layout, LayoutCursor, LineBreak, Page, PageGeometry, Rgb,
    TextCell,
};
use crate::logo::LogoImage;
use crate::table::{Amount, LineItemTable};
use crate::text::header_label;

/// Widths of the five table columns in millimetres
pub const COLUMN_WIDTHS: [f32; 5] = [30.0, 70.0, 30.0, 30.0, 30.0];

/// Height of every text line and table row
pub const ROW_HEIGHT: f32 = 8.0;

/// Rendered logo width in millimetres
pub const LOGO_WIDTH: f32 = 10.0;

const TITLE_WIDTH: f32 = 50.0;
const LINE_WIDTH: f32 = 30.0;

const TITLE: CellStyle = CellStyle {
    font: Font::bold(14.0),
    color: Rgb::BLACK,
    border: false,
};
const HEADER: CellStyle = CellStyle {
    font: Font::bold(10.0),
    color: Rgb::BLACK,
    border: true,
};
const ITEM: CellStyle = CellStyle {
    font: Font::regular(10.0),
    color: Rgb::GREY,
    border: true,
};
const TOTAL: CellStyle = CellStyle {
    font: Font::bold(10.0),
    color: Rgb::GREY,
    border: true,
};
const FOOTER: CellStyle = CellStyle {
    font: Font::bold(14.0),
    color: Rgb::GREY,
    border: false,
};

/// One rendered invoice, ready to be encoded
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub source: PathBuf,
    pub invoice_number: String,
    pub invoice_date: String,
    pub total: Amount,
    pub geometry: PageGeometry,
    pages: Vec<Page>,
    logo: Arc<LogoImage>,
}

impl InvoiceDocument {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn logo(&self) -> &LogoImage {
        &self.logo
    }

    /// All text cells in drawing order
    pub fn text_cells(&self) -> impl Iterator<Item = &TextCell> {
        self.pages
            .iter()
            .flat_map(|p| p.elements.iter())
            .filter_map(|e| match e {
                Element::Text(cell) => Some(cell),
                Element::Image(_) => None,
            })
    }

    /// All image placements in drawing order
    pub fn images(&self) -> impl Iterator<Item = &ImageBox> {
        self.pages
            .iter()
            .flat_map(|p| p.elements.iter())
            .filter_map(|e| match e {
                Element::Image(image) => Some(image),
                Element::Text(_) => None,
            })
    }
}

/// Lay out one invoice.
///
/// The header row shows the sheet's first five column names in sheet order,
/// while item cells are looked up through the configured selectors. The two
/// only line up when the selectors name those same columns in that order.
pub fn render_invoice(
    table: &LineItemTable,
    invoice_number: &str,
    invoice_date: &str,
    config: &RenderConfig,
    logo: &Arc<LogoImage>,
) -> Result<InvoiceDocument, InvoiceError> {
    let header = header_labels(table)?;
    let selectors = config.columns.as_array();
    for column in selectors {
        table.require_column(column)?;
    }
    let total = table.sum_column(&config.sum_column)?;

    let (mut layout, cursor) = Layout::new(PageGeometry::A4_PORTRAIT);

    // Title block
    let cursor = layout.cell(
        cursor,
        TITLE_WIDTH,
        ROW_HEIGHT,
        format!("Invoice nr. {}", invoice_number),
        TITLE,
        LineBreak::NextLine,
    );
    let mut cursor = layout.cell(
        cursor,
        TITLE_WIDTH,
        ROW_HEIGHT,
        format!("Date: {}", invoice_date),
        TITLE,
        LineBreak::NextLine,
    );

    cursor = table_row(&mut layout, cursor, header, HEADER, HEADER);

    for index in 0..table.row_count() {
        let mut cells: [String; 5] = Default::default();
        for (cell, column) in cells.iter_mut().zip(selectors) {
            *cell = table.value(index, column)?.to_string();
        }
        cursor = table_row(&mut layout, cursor, cells, ITEM, ITEM);
    }

    let totals: [String; 5] = [
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        total.to_string(),
    ];
    cursor = table_row(&mut layout, cursor, totals, ITEM, TOTAL);

    cursor = layout.cell(
        cursor,
        LINE_WIDTH,
        ROW_HEIGHT,
        format!("The total Price is {}", total),
        FOOTER,
        LineBreak::NextLine,
    );

    // Branding: the logo sits right of the company name
    cursor = layout.cell(
        cursor,
        LINE_WIDTH,
        ROW_HEIGHT,
        config.company_name.clone(),
        FOOTER,
        LineBreak::Right,
    );
    let cursor = layout.image(cursor, LOGO_WIDTH, logo.height_for_width(LOGO_WIDTH));

    let pages = layout.into_pages();
    debug!(
        "Laid out invoice {} on {} page(s), cursor ends at page {} y={:.1}",
        invoice_number,
        pages.len(),
        cursor.page + 1,
        cursor.y
    );

    Ok(InvoiceDocument {
        source: table.path.clone(),
        invoice_number: invoice_number.to_string(),
        invoice_date: invoice_date.to_string(),
        total,
        geometry: PageGeometry::A4_PORTRAIT,
        pages,
        logo: Arc::clone(logo),
    })
}

fn header_labels(table: &LineItemTable) -> Result<[String; 5], InvoiceError> {
    let columns = table.columns();
    if columns.len() < COLUMN_WIDTHS.len() {
        return Err(InvoiceError::unreadable(
            &table.path,
            format!("expected at least 5 columns, found {}", columns.len()),
        ));
    }
    Ok(std::array::from_fn(|i| header_label(&columns[i])))
}

/// Emit five bordered cells; `last` styles the rightmost one
fn table_row(
    layout: &mut Layout,
    mut cursor: LayoutCursor,
    cells: [String; 5],
    style: CellStyle,
    last: CellStyle,
) -> LayoutCursor {
    let count = cells.len();
    for (i, (text, width)) in cells.into_iter().zip(COLUMN_WIDTHS).enumerate() {
        let (style, line_break) = if i + 1 == count {
            (last, LineBreak::NextLine)
        } else {
            (style, LineBreak::Right)
        };
        cursor = layout.cell(cursor, width, ROW_HEIGHT, text, style, line_break);
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn logo() -> Arc<LogoImage> {
        Arc::new(LogoImage {
            path: PathBuf::from("logo.png"),
            width_px: 20,
            height_px: 10,
            rgb: vec![0; 20 * 10 * 3],
            alpha: None,
        })
    }

    fn config() -> RenderConfig {
        RenderConfig::new("in", "out", "logo.png", "PythonHow")
    }

    fn columns() -> Vec<String> {
        [
            "product_id",
            "product_name",
            "amount_purchased",
            "price_per_unit",
            "total_price",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn item(id: i64, name: &str, qty: i64, price: f64, total: f64) -> Vec<CellValue> {
        vec![
            CellValue::Int(id),
            CellValue::Text(name.into()),
            CellValue::Int(qty),
            CellValue::Float(price),
            CellValue::Float(total),
        ]
    }

    fn table(rows: Vec<Vec<CellValue>>) -> LineItemTable {
        LineItemTable::from_columns(Path::new("in/10001-2023.1.18.xlsx"), columns(), rows)
    }

    fn texts(doc: &InvoiceDocument) -> Vec<String> {
        doc.text_cells().map(|c| c.text.clone()).collect()
    }

    #[test]
    fn test_full_layout_text_order() {
        let doc = render_invoice(
            &table(vec![
                item(10001, "Chocolate", 3, 2.5, 7.5),
                item(10002, "Coffee", 2, 4.25, 8.5),
            ]),
            "10001",
            "2023.1.18",
            &config(),
            &logo(),
        )
        .unwrap();

        assert_eq!(
            texts(&doc),
            vec![
                "Invoice nr. 10001",
                "Date: 2023.1.18",
                "Product Id",
                "Product Name",
                "Amount Purchased",
                "Price Per Unit",
                "Total Price",
                "10001",
                "Chocolate",
                "3",
                "2.5",
                "7.5",
                "10002",
                "Coffee",
                "2",
                "4.25",
                "8.5",
                "",
                "",
                "",
                "",
                "16.0",
                "The total Price is 16.0",
                "PythonHow",
            ]
        );
        assert_eq!(doc.total, Amount::Float(16.0));
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_geometry_matches_fixed_widths() {
        let doc = render_invoice(
            &table(vec![item(1, "Tea", 1, 1.5, 1.5)]),
            "1",
            "d",
            &config(),
            &logo(),
        )
        .unwrap();
        let cells: Vec<&TextCell> = doc.text_cells().collect();

        // Title lines stack from the top margin
        assert_eq!((cells[0].x, cells[0].y), (10.0, 10.0));
        assert_eq!((cells[1].x, cells[1].y), (10.0, 18.0));

        // Header row
        let header: Vec<(f32, f32)> = cells[2..7].iter().map(|c| (c.x, c.width)).collect();
        assert_eq!(
            header,
            vec![(10.0, 30.0), (40.0, 70.0), (110.0, 30.0), (140.0, 30.0), (170.0, 30.0)]
        );
        assert!(cells[2..7].iter().all(|c| c.y == 26.0 && c.style.border));

        // Totals row: four empty cells then the bold sum
        let totals = &cells[12..17];
        assert!(totals[..4].iter().all(|c| c.text.is_empty() && c.style.border));
        assert_eq!(totals[4].style.font, Font::bold(10.0));
        assert_eq!(totals[4].y, 42.0);
    }

    #[test]
    fn test_logo_follows_company_name() {
        let doc = render_invoice(
            &table(vec![item(1, "Tea", 1, 1.5, 1.5)]),
            "1",
            "d",
            &config(),
            &logo(),
        )
        .unwrap();
        let company = doc.text_cells().last().unwrap();
        let image = doc.images().next().unwrap();

        assert_eq!(company.text, "PythonHow");
        assert_eq!(image.x, company.x + company.width);
        assert_eq!(image.y, company.y);
        assert_eq!((image.width, image.height), (10.0, 5.0));
    }

    #[test]
    fn test_zero_rows_renders_zero_total() {
        let doc = render_invoice(&table(vec![]), "1", "d", &config(), &logo()).unwrap();
        let texts = texts(&doc);
        assert_eq!(texts.len(), 2 + 5 + 5 + 2);
        assert_eq!(texts[11], "0");
        assert_eq!(texts[12], "The total Price is 0");
    }

    #[test]
    fn test_missing_selector_names_column() {
        let mut config = config();
        config.columns.unit_price = "unit_cost".into();
        let err = render_invoice(
            &table(vec![item(1, "Tea", 1, 1.5, 1.5)]),
            "1",
            "d",
            &config,
            &logo(),
        )
        .unwrap_err();
        match err {
            InvoiceError::MissingColumn { column, .. } => assert_eq!(column, "unit_cost"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_sum_column() {
        let mut config = config();
        config.sum_column = "grand_total".into();
        let err = render_invoice(&table(vec![]), "1", "d", &config, &logo()).unwrap_err();
        assert!(matches!(err, InvoiceError::MissingColumn { ref column, .. } if column == "grand_total"));
    }

    #[test]
    fn test_too_few_columns() {
        let narrow = LineItemTable::from_columns(
            Path::new("in/1-d.xlsx"),
            vec!["product_id".into(), "total_price".into()],
            vec![],
        );
        let err = render_invoice(&narrow, "1", "d", &config(), &logo()).unwrap_err();
        assert!(matches!(err, InvoiceError::UnreadableSpreadsheet { .. }));
    }

    #[test]
    fn test_header_stays_positional_when_selectors_reorder() {
        let mut config = config();
        config.columns.identifier = "product_name".into();
        config.columns.description = "product_id".into();

        let doc = render_invoice(
            &table(vec![item(7, "Tea", 1, 1.5, 1.5)]),
            "1",
            "d",
            &config,
            &logo(),
        )
        .unwrap();
        let texts = texts(&doc);
        // Header still follows the sheet order...
        assert_eq!(texts[2], "Product Id");
        assert_eq!(texts[3], "Product Name");
        // ...while item cells follow the selectors
        assert_eq!(texts[7], "Tea");
        assert_eq!(texts[8], "7");
    }

    #[test]
    fn test_long_table_paginates() {
        let rows = (0..80).map(|i| item(i, "Widget", 1, 1.0, 1.0)).collect();
        let doc = render_invoice(&table(rows), "1", "d", &config(), &logo()).unwrap();

        assert!(doc.page_count() > 1);
        let threshold = doc.geometry.break_threshold();
        for page in doc.pages() {
            for element in &page.elements {
                assert!(element.bottom() <= threshold);
            }
        }
        // The header is not repeated on later pages
        let headers = doc.text_cells().filter(|c| c.text == "Product Id").count();
        assert_eq!(headers, 1);
        assert_eq!(doc.total.to_string(), "80.0");
    }
}
