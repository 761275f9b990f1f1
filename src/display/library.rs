//! Library display formatting
//!
//! Formats readers, books and loans for terminal output.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{Book, BookId, Loan, Reader, ReaderId};

/// Format a list of readers as a table, with each reader's open loan count
pub fn format_reader_list(readers: &[(Reader, usize)]) -> String {
    if readers.is_empty() {
        return "No readers found.".to_string();
    }

    let name_width = readers
        .iter()
        .map(|(r, _)| r.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let email_width = readers
        .iter()
        .map(|(r, _)| r.email.len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<name_width$}  {:<email_width$}  {:>5}  {}\n",
        "ID",
        "Name",
        "Email",
        "Loans",
        "Genres",
        name_width = name_width,
        email_width = email_width,
    ));
    output.push_str(&format!(
        "{:-<12}  {:-<name_width$}  {:-<email_width$}  {:->5}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
        email_width = email_width,
    ));

    for (reader, open) in readers {
        output.push_str(&format!(
            "{:<12}  {:<name_width$}  {:<email_width$}  {:>5}  {}\n",
            reader.id.to_string(),
            reader.name,
            reader.email,
            open,
            reader.favorite_genres,
            name_width = name_width,
            email_width = email_width,
        ));
    }

    output
}

/// Format a single reader with their loan history
pub fn format_reader_details(reader: &Reader, loans: &[Loan], books: &[Book]) -> String {
    let titles = book_titles(books);
    let mut output = String::new();

    output.push_str(&format!("Reader: {}\n", reader.name));
    output.push_str(&format!("  ID:         {}\n", reader.id));
    output.push_str(&format!("  Email:      {}\n", reader.email));
    if !reader.favorite_genres.is_empty() {
        output.push_str(&format!("  Genres:     {}\n", reader.favorite_genres));
    }
    output.push_str(&format!(
        "  Registered: {}\n",
        reader.registered_at.format("%Y-%m-%d")
    ));

    if loans.is_empty() {
        output.push_str("  No loans.\n");
        return output;
    }

    output.push_str("  Loans:\n");
    for loan in loans {
        let status = match loan.returned_on {
            Some(day) => format!("returned {}", day),
            None => format!("due {}", loan.due_on),
        };
        output.push_str(&format!(
            "    {}  {}  ({})\n",
            loan.lent_on,
            titles.get(&loan.book_id).copied().unwrap_or("Unknown"),
            status
        ));
    }

    output
}

/// Format a list of books as a table
///
/// `available` holds the IDs of books that are on the shelf right now.
pub fn format_book_list(books: &[Book], available: &[BookId], readers: &[Reader]) -> String {
    if books.is_empty() {
        return "No books found.".to_string();
    }

    let names = reader_names(readers);
    let title_width = books
        .iter()
        .map(|b| b.title.len())
        .max()
        .unwrap_or(5)
        .max(5);
    let author_width = books
        .iter()
        .map(|b| b.author.len())
        .max()
        .unwrap_or(6)
        .max(6);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<11}  {:<title_width$}  {:<author_width$}  {:<12}  {:<9}  {}\n",
        "ID",
        "Title",
        "Author",
        "Genre",
        "Status",
        "Donor",
        title_width = title_width,
        author_width = author_width,
    ));
    output.push_str(&format!(
        "{:-<11}  {:-<title_width$}  {:-<author_width$}  {:-<12}  {:-<9}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        title_width = title_width,
        author_width = author_width,
    ));

    for book in books {
        let status = if available.contains(&book.id) {
            "available"
        } else {
            "on loan"
        };
        output.push_str(&format!(
            "{:<11}  {:<title_width$}  {:<author_width$}  {:<12}  {:<9}  {}\n",
            book.id.to_string(),
            book.title,
            book.author,
            book.genre,
            status,
            names.get(&book.donor_id).copied().unwrap_or("Unknown"),
            title_width = title_width,
            author_width = author_width,
        ));
    }

    output
}

/// Format loans as a table, flagging overdue ones
pub fn format_loan_list(
    loans: &[Loan],
    books: &[Book],
    readers: &[Reader],
    today: NaiveDate,
) -> String {
    if loans.is_empty() {
        return "No loans found.".to_string();
    }

    let titles = book_titles(books);
    let names = reader_names(readers);

    let title_width = loans
        .iter()
        .map(|l| titles.get(&l.book_id).map_or(7, |t| t.len()))
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<13}  {:<title_width$}  {:<20}  {:<10}  {:<10}  {}\n",
        "ID",
        "Book",
        "Reader",
        "Lent",
        "Due",
        "Status",
        title_width = title_width,
    ));
    output.push_str(&format!(
        "{:-<13}  {:-<title_width$}  {:-<20}  {:-<10}  {:-<10}  {:-<12}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        title_width = title_width,
    ));

    for loan in loans {
        output.push_str(&format!(
            "{:<13}  {:<title_width$}  {:<20}  {:<10}  {:<10}  {}\n",
            loan.id.to_string(),
            titles.get(&loan.book_id).copied().unwrap_or("Unknown"),
            names.get(&loan.reader_id).copied().unwrap_or("Unknown"),
            loan.lent_on.to_string(),
            loan.due_on.to_string(),
            loan_status(loan, today),
            title_width = title_width,
        ));
    }

    output
}

/// Short status text for a loan
pub fn loan_status(loan: &Loan, today: NaiveDate) -> String {
    if let Some(day) = loan.returned_on {
        return format!("returned {}", day);
    }

    match loan.days_until_due(today) {
        d if d < 0 => format!("OVERDUE {}d", -d),
        0 => "due today".to_string(),
        1 => "due tomorrow".to_string(),
        d => format!("{}d left", d),
    }
}

fn book_titles(books: &[Book]) -> HashMap<BookId, &str> {
    books.iter().map(|b| (b.id, b.title.as_str())).collect()
}

fn reader_names(readers: &[Reader]) -> HashMap<ReaderId, &str> {
    readers.iter().map(|r| (r.id, r.name.as_str())).collect()
}
