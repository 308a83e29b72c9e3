use scraper::{ElementRef, Html, Selector};

use crate::{Error, Result};

/// One result row as the portal renders it, before normalization.
/// Lives only between extraction and [`crate::normalize::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub doc: String,
    pub process_number: String,
    pub action_date: String,
    pub party_a: String,
    pub party_b: String,
    pub subject: String,
    /// `href` of the first cell's anchor, when the row links to a document.
    pub document_url: Option<String>,
}

/// Number of cells a data row carries.
const DATA_ROW_CELLS: usize = 6;

/// Extracts every result row from the rendered results page.
///
/// Results land in the document's single direct `body > table`; the row
/// selector is scoped to that path so the portal's other tables (layout,
/// navigation) never enter the walk. Within the table, rows are classified
/// by cell count: no cells is the header row, one cell is one of the
/// spacer rows the portal interleaves between data rows, six or more is a
/// data row. The first row with any other shape is the table's trailer
/// (pagination/footer) and ends the results, keeping everything collected
/// so far.
///
/// An empty table yields an empty `Vec`; zero results is not an error.
pub fn extract_rows(html: &str) -> Result<Vec<RawRow>> {
    let doc = Html::parse_document(html);

    let row_selector = create_selector("body > table > tbody > tr")?;
    let cell_selector = create_selector("td")?;
    let link_selector = create_selector("a")?;

    let mut rows = Vec::with_capacity(32);
    for row in doc.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        match cells.len() {
            0 | 1 => continue,
            n if n < DATA_ROW_CELLS => break,
            _ => {}
        }

        let document_url = cells[0]
            .select(&link_selector)
            .next()
            .and_then(|anchor| anchor.value().attr("href"))
            .map(str::to_owned);

        rows.push(RawRow {
            doc: cell_text(&cells[0]),
            process_number: cell_text(&cells[1]),
            action_date: cell_text(&cells[2]),
            party_a: cell_text(&cells[3]),
            party_b: cell_text(&cells[4]),
            subject: cell_text(&cells[5]),
            document_url,
        });
    }
    Ok(rows)
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_owned()
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseInvalidSelector(sel_str.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results_page(body: &str) -> String {
        format!("<html><body><table><tbody>{body}</tbody></table></body></html>")
    }

    fn data_row(doc_cell: &str, date: &str) -> String {
        format!(
            "<tr><td>{doc_cell}</td><td>TC-001234/567/89</td><td>{date}</td>\
             <td>Prefeitura Municipal</td><td>João da Silva</td><td>Licitação</td></tr>"
        )
    }

    const SPACER: &str = r#"<tr><td colspan="6">&nbsp;</td></tr>"#;

    #[test]
    fn extracts_data_rows_and_skips_spacers() {
        let html = results_page(&format!(
            "<tr><th>Doc</th></tr>{}{SPACER}{}{SPACER}{}",
            data_row("Acórdão 1", "10/02/2015"),
            data_row("Acórdão 2", "11/02/2015"),
            data_row("Acórdão 3", "12/02/2015"),
        ));

        let rows = extract_rows(&html).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].doc, "Acórdão 1");
        assert_eq!(rows[1].action_date, "11/02/2015");
        assert_eq!(rows[2].subject, "Licitação");
    }

    #[test]
    fn stops_cleanly_when_rows_run_out() {
        // Three valid rows and then nothing: exactly three, no error.
        let html = results_page(&format!(
            "{}{}{}",
            data_row("A", "01/01/2020"),
            data_row("B", "02/01/2020"),
            data_row("C", "03/01/2020"),
        ));
        let rows = extract_rows(&html).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn first_cell_anchor_becomes_document_url() {
        let html = results_page(&format!(
            "{}{}",
            data_row(r#"<a href="https://example.org/doc/42">Acórdão</a>"#, "10/02/2015"),
            data_row("Sem link", "11/02/2015"),
        ));

        let rows = extract_rows(&html).unwrap();
        assert_eq!(
            rows[0].document_url.as_deref(),
            Some("https://example.org/doc/42")
        );
        assert_eq!(rows[0].doc, "Acórdão");
        assert_eq!(rows[1].document_url, None);
    }

    #[test]
    fn cell_text_is_trimmed_and_accents_survive() {
        let html = results_page(
            "<tr><td>  Acórdão  </td><td>TC-1</td><td>10/02/2015</td>\
             <td>  Município de São Paulo </td><td></td><td> Matéria </td></tr>",
        );

        let rows = extract_rows(&html).unwrap();
        assert_eq!(rows[0].doc, "Acórdão");
        assert_eq!(rows[0].party_a, "Município de São Paulo");
        assert_eq!(rows[0].party_b, "");
        assert_eq!(rows[0].subject, "Matéria");
    }

    #[test]
    fn trailer_row_ends_the_results_keeping_collected_rows() {
        let html = results_page(&format!(
            "{}{SPACER}{}<tr><td>1</td><td>2</td><td>3</td></tr>{}",
            data_row("A", "01/01/2020"),
            data_row("B", "02/01/2020"),
            data_row("C", "03/01/2020"),
        ));

        let rows = extract_rows(&html).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].doc, "A");
        assert_eq!(rows[1].doc, "B");
    }

    #[test]
    fn only_the_direct_body_table_is_read() {
        // A layout table wrapped in a div, like the portal's search form
        // area, then the results table as a direct child of body.
        let html = format!(
            "<html><body>\
             <div><table><tbody><tr><td>menu</td><td>menu</td></tr></tbody></table></div>\
             <table><tbody>{}</tbody></table>\
             </body></html>",
            data_row("Acórdão", "10/02/2015"),
        );

        let rows = extract_rows(&html).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].doc, "Acórdão");
    }

    #[test]
    fn empty_table_yields_no_rows() {
        let rows = extract_rows(&results_page("")).unwrap();
        assert!(rows.is_empty());
    }
}
