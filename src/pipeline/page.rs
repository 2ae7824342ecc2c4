//! Page extraction: one page's geometry and text into typed content units.
//!
//! ## Protocol
//!
//! 1. When table detection is on, locate table bounding boxes and render
//!    each table's cell grid as markdown.
//! 2. Extract running text with the table regions excluded — an element whose
//!    midpoint falls inside any table box belongs to that table and must not
//!    be double-counted as prose.
//! 3. Clean the text, segment it into paragraphs, drop rejected ones.
//! 4. Emit surviving paragraphs as text units in document order, then the
//!    page's tables. Per page, all text units precede all table units.
//!
//! A page yielding no units at all is valid — scanned image-only pages have
//! no extractable content and are not an error.

use tracing::debug;

use super::{normalize, segment, table};
use crate::config::ReaderConfig;
use crate::output::{ContentUnit, UnitKind};
use crate::source::{LayoutParams, PageContentSource, SourceResult};

/// Extract all content units for one page, text units first, then tables.
///
/// `page_num` is the true 1-based source page number and is stamped on every
/// unit produced.
pub fn extract_page(
    page: &dyn PageContentSource,
    page_num: usize,
    config: &ReaderConfig,
) -> SourceResult<Vec<ContentUnit>> {
    let mut rendered_tables: Vec<String> = Vec::new();
    let mut exclude = Vec::new();

    if config.detect_tables {
        let bboxes = page.find_tables()?;
        if !bboxes.is_empty() {
            debug!(page = page_num, tables = bboxes.len(), "tables detected");
        }
        for bbox in &bboxes {
            let grid = page.extract_table(bbox)?;
            if let Some(md) = table::render(&grid) {
                rendered_tables.push(md);
            }
        }
        exclude = bboxes;
    }

    let params = LayoutParams {
        y_density: config.y_density,
        exclude,
    };
    let text = normalize::clean(&page.text(&params)?);
    let raw_source = config.inspect.then(|| text.clone());

    let mut units = Vec::new();
    for para in segment::segment(&text) {
        if segment::should_reject(&para) {
            continue;
        }
        units.push(ContentUnit {
            page: page_num,
            kind: UnitKind::Text,
            content: para,
            order_hint: None,
            raw_source: raw_source.clone(),
        });
    }

    for md in rendered_tables {
        units.push(ContentUnit {
            page: page_num,
            kind: UnitKind::Table,
            content: md,
            order_hint: None,
            raw_source: None,
        });
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{BoundingBox, TableGrid};
    use std::cell::RefCell;

    /// Scripted page: fixed text, one table, and a record of the layout
    /// params it was asked to extract with.
    struct FakePage {
        text: String,
        tables: Vec<(BoundingBox, TableGrid)>,
        seen_params: RefCell<Option<LayoutParams>>,
    }

    impl PageContentSource for FakePage {
        fn text(&self, params: &LayoutParams) -> SourceResult<String> {
            *self.seen_params.borrow_mut() = Some(params.clone());
            Ok(self.text.clone())
        }

        fn find_tables(&self) -> SourceResult<Vec<BoundingBox>> {
            Ok(self.tables.iter().map(|(b, _)| *b).collect())
        }

        fn extract_table(&self, bbox: &BoundingBox) -> SourceResult<TableGrid> {
            Ok(self
                .tables
                .iter()
                .find(|(b, _)| b == bbox)
                .map(|(_, g)| g.clone())
                .unwrap_or_default())
        }
    }

    fn page_with_table() -> FakePage {
        FakePage {
            text: "Your annual percentage rate is shown below.\n\n\
                   Interest accrues from the transaction date.\n"
                .into(),
            tables: vec![(
                BoundingBox::new(0.0, 100.0, 500.0, 200.0),
                vec![
                    vec![Some("APR".into()), Some("24.9%".into())],
                    vec![Some("Cash".into()), Some("29.9%".into())],
                ],
            )],
            seen_params: RefCell::new(None),
        }
    }

    #[test]
    fn text_units_precede_table_units() {
        let page = page_with_table();
        let units = extract_page(&page, 4, &ReaderConfig::default()).unwrap();
        let kinds: Vec<UnitKind> = units.iter().map(|u| u.kind).collect();
        assert_eq!(
            kinds,
            vec![UnitKind::Text, UnitKind::Text, UnitKind::Table]
        );
        assert!(units.iter().all(|u| u.page == 4));
    }

    #[test]
    fn table_regions_are_excluded_from_text_extraction() {
        let page = page_with_table();
        let config = ReaderConfig::default();
        extract_page(&page, 1, &config).unwrap();
        let params = page.seen_params.borrow().clone().unwrap();
        assert_eq!(params.exclude.len(), 1);
        assert!((params.y_density - 13.8).abs() < f64::EPSILON);
    }

    #[test]
    fn table_detection_off_skips_find_tables() {
        let page = page_with_table();
        let config = ReaderConfig::builder()
            .detect_tables(false)
            .build()
            .unwrap();
        let units = extract_page(&page, 1, &config).unwrap();
        assert!(units.iter().all(|u| u.kind == UnitKind::Text));
        let params = page.seen_params.borrow().clone().unwrap();
        assert!(params.exclude.is_empty());
    }

    #[test]
    fn empty_page_yields_no_units() {
        let page = FakePage {
            text: String::new(),
            tables: vec![],
            seen_params: RefCell::new(None),
        };
        let units = extract_page(&page, 9, &ReaderConfig::default()).unwrap();
        assert!(units.is_empty());
    }

    #[test]
    fn inspect_mode_retains_raw_text_on_text_units_only() {
        let page = page_with_table();
        let config = ReaderConfig::builder().inspect(true).build().unwrap();
        let units = extract_page(&page, 1, &config).unwrap();
        for u in &units {
            match u.kind {
                UnitKind::Text => assert!(u.raw_source.is_some()),
                UnitKind::Table => assert!(u.raw_source.is_none()),
            }
        }
    }
}
