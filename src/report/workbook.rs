use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, Worksheet};

use crate::error::Result;
use crate::report::model::{analysis_rows, status_rows};
use crate::types::{AnalysisSummary, MarketSnapshot};

pub const LIVE_SHEET: &str = "Live Data";
pub const ANALYSIS_SHEET: &str = "Analysis";

pub const LIVE_COLUMNS: [&str; 6] = [
    "Name",
    "Symbol",
    "Price (USD)",
    "Market Cap (USD)",
    "24h Volume (USD)",
    "24h Change (%)",
];

/// Solid fill behind header rows (bold white text on top).
pub const HEADER_FILL: u32 = 0x366092;
/// Solid fill behind the LIVE status cell.
pub const STATUS_FILL: u32 = 0x70AD47;

/// Zero-based row of the Live Data table header: three status rows, then a
/// blank separator.
pub const LIVE_TABLE_HEADER_ROW: u32 = 4;

/// Build the two-sheet workbook and serialise it in memory.
pub fn render(snapshot: &MarketSnapshot, summary: &AnalysisSummary, next_update: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    write_live_sheet(workbook.add_worksheet(), snapshot, summary, next_update)?;
    write_analysis_sheet(workbook.add_worksheet(), summary)?;
    Ok(workbook.save_to_buffer()?)
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_pattern(FormatPattern::Solid)
}

fn status_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(STATUS_FILL))
        .set_pattern(FormatPattern::Solid)
}

fn write_live_sheet(
    sheet: &mut Worksheet,
    snapshot: &MarketSnapshot,
    summary: &AnalysisSummary,
    next_update: &str,
) -> Result<()> {
    sheet.set_name(LIVE_SHEET)?;

    for (i, metric) in status_rows(summary, next_update).iter().enumerate() {
        let row = i as u32;
        sheet.write_string(row, 0, &metric.label)?;
        if row == 0 {
            sheet.write_string_with_format(row, 1, &metric.value, &status_format())?;
        } else {
            sheet.write_string(row, 1, &metric.value)?;
        }
    }

    let header = header_format();
    for (col, title) in LIVE_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(LIVE_TABLE_HEADER_ROW, col as u16, *title, &header)?;
    }

    let price = Format::new().set_num_format("#,##0.00########");
    let money = Format::new().set_num_format("#,##0.00");
    let percent = Format::new().set_num_format("0.00");

    for (i, record) in snapshot.records().iter().enumerate() {
        let row = LIVE_TABLE_HEADER_ROW + 1 + i as u32;
        sheet.write_string(row, 0, &record.name)?;
        sheet.write_string(row, 1, &record.symbol)?;
        sheet.write_number_with_format(row, 2, record.price, &price)?;
        sheet.write_number_with_format(row, 3, record.market_cap, &money)?;
        sheet.write_number_with_format(row, 4, record.volume_24h, &money)?;
        sheet.write_number_with_format(row, 5, record.change_24h_pct, &percent)?;
    }

    sheet.set_column_width(0, 24)?;
    sheet.set_column_width(1, 20)?;
    sheet.set_column_width(2, 16)?;
    sheet.set_column_width(3, 22)?;
    sheet.set_column_width(4, 20)?;
    sheet.set_column_width(5, 16)?;
    Ok(())
}

fn write_analysis_sheet(sheet: &mut Worksheet, summary: &AnalysisSummary) -> Result<()> {
    sheet.set_name(ANALYSIS_SHEET)?;

    let header = header_format();
    sheet.write_string_with_format(0, 0, "Metric", &header)?;
    sheet.write_string_with_format(0, 1, "Value", &header)?;

    for (i, metric) in analysis_rows(summary).iter().enumerate() {
        if metric.is_blank() {
            continue;
        }
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &metric.label)?;
        if !metric.value.is_empty() {
            sheet.write_string(row, 1, &metric.value)?;
        }
    }

    sheet.set_column_width(0, 32)?;
    sheet.set_column_width(1, 34)?;
    Ok(())
}
