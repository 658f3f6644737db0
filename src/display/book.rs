//! Book display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::Book;

#[derive(Tabled)]
struct BookRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "UID")]
    uid: String,
    #[tabled(rename = "Last opened")]
    last_opened: String,
}

/// Table of books; the active one is marked with `*`
pub fn format_book_list(books: &[Book]) -> String {
    if books.is_empty() {
        return "No books found.\n".to_string();
    }

    let rows = books.iter().map(|book| BookRow {
        marker: if book.active { "*" } else { "" },
        name: book.display_name.clone(),
        uid: book.uid.short().to_string(),
        last_opened: book
            .last_opened_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into()),
    });

    let mut table = Table::new(rows);
    table.with(Style::psql());
    format!("{}\n", table)
}

pub fn format_book_details(book: &Book) -> String {
    let mut output = String::new();
    output.push_str(&format!("Book: {}\n", book.display_name));
    output.push_str(&format!("  UID:         {}\n", book.uid));
    output.push_str(&format!("  Active:      {}\n", if book.active { "Yes" } else { "No" }));
    output.push_str(&format!(
        "  Created:     {}\n",
        book.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(opened) = book.last_opened_at {
        output.push_str(&format!(
            "  Last opened: {}\n",
            opened.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if let Some(source) = &book.source_uri {
        output.push_str(&format!("  Source:      {}\n", source));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list() {
        assert_eq!(format_book_list(&[]), "No books found.\n");
    }

    #[test]
    fn test_active_book_marked() {
        let mut first = Book::new("Household");
        first.active = true;
        let second = Book::new("Business");

        let output = format_book_list(&[first, second]);
        let household = output.lines().find(|l| l.contains("Household")).unwrap();
        let business = output.lines().find(|l| l.contains("Business")).unwrap();
        assert!(household.contains('*'));
        assert!(!business.contains('*'));
    }

    #[test]
    fn test_details_show_source() {
        let mut book = Book::new("Imported");
        book.source_uri = Some("/tmp/imported.json".into());
        let output = format_book_details(&book);
        assert!(output.contains("Source:      /tmp/imported.json"));
        assert!(output.contains("Active:      No"));
    }
}
