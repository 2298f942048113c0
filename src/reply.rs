//! Chat reply texts, in Telegram's legacy Markdown.

use crate::catalog::BookRecord;
use crate::publish::IndexRow;
use crate::query::SearchResults;

const LETTERS_PER_ROW: usize = 5;

pub fn welcome(total: usize) -> String {
    format!(
        "🌙 *Welcome to Moon Read Catalog Bot!* 📚\n\n\
         I can help you find novels from our collection of *{total}* EPUBs!\n\n\
         *How to use:*\n\n\
         🔍 *Search for a book:*\n`/search tempest`\n\n\
         📋 *Browse full catalog:*\n`KATALOG` or `/katalog`\n\n\
         📖 *Random book:*\n`/random`\n\n\
         ℹ️ *Help:*\n`/help`\n\n\
         Start searching now! 🚀"
    )
}

pub fn help() -> String {
    "📚 *Moon Read Catalog Bot - Help*\n\n\
     🔍 *Search:*\n\
     • `/search keyword` - Search for books\n\
     • Example: `/search villainess tempest`\n\n\
     📋 *Catalog:*\n\
     • `KATALOG` or `/katalog` - Full catalog organized alphabetically\n\n\
     📖 *Random:*\n\
     • `/random` - Get a random book recommendation\n\n\
     *Search Tips:*\n\
     • Search is case-insensitive\n\
     • Partial matches work (e.g., \"temp\" finds \"Tempest\")"
        .to_string()
}

pub fn search_usage() -> String {
    "❌ Please provide a search keyword!\n\n*Example:*\n`/search tempest`\n`/search villainess romance`"
        .to_string()
}

pub fn search_results(results: &SearchResults<'_>) -> String {
    let keyword = entity_text(&results.keyword, '*');
    if results.total == 0 {
        return format!("📭 No books found for: *{keyword}*\n\nTry different keywords!");
    }

    let mut out = format!("🔍 *Search Results for: {keyword}*\n\n");
    out.push_str(&format!("Found *{}* book(s)\n", results.total));
    if results.is_truncated() {
        out.push_str(&format!("_(Showing first {} results)_\n", results.shown.len()));
    }
    out.push('\n');

    for (i, book) in results.shown.iter().enumerate() {
        out.push_str(&format!("{}. {}\n\n", i + 1, link(book)));
    }

    if let Some(note) = results.overflow_note() {
        out.push_str(&format!("_...and {note} results_\n"));
        out.push_str("\n💡 Tip: Use more specific keywords to narrow results");
    }
    out
}

pub fn random_book(book: &BookRecord) -> String {
    format!(
        "📖 *Random Book Recommendation*\n\n{}\n\nWant another? Type `/random` again!",
        link(book)
    )
}

pub fn catalog_not_loaded() -> String {
    "❌ Catalog not loaded. Please try again later.".to_string()
}

pub fn index_not_ready() -> String {
    "⏳ Catalog is being prepared... Please try again in a moment.\n\n\
     You can use `/search keyword` to find books in the meantime!"
        .to_string()
}

pub fn catalog_index(total_books: usize, rows: &[IndexRow]) -> String {
    let mut out = String::from("📚 *Moon Read Full Catalog*\n\n");
    out.push_str(&format!("Total Books: *{total_books}*\n\n"));
    out.push_str("🔤 *Browse by Letter:*\n\n");

    for chunk in rows.chunks(LETTERS_PER_ROW) {
        let line: Vec<String> = chunk
            .iter()
            .map(|row| format!("[{}]({}) ({})", row.letter, row.url, row.count))
            .collect();
        out.push_str(&line.join(" • "));
        out.push('\n');
    }

    out.push_str("\n💡 *Tips:*\n");
    out.push_str("• Click any letter to see all books starting with that letter\n");
    out.push_str("• Use `/search keyword` to find specific books\n");
    out.push_str("• Try `/random` for a random recommendation");
    out
}

fn link(book: &BookRecord) -> String {
    format!("[{}]({})", entity_text(&book.title, ']'), book.link)
}

/// Text inside a legacy Markdown entity cannot be escaped, so the character
/// that would close the entity early is dropped.
fn entity_text(raw: &str, closing: char) -> String {
    raw.chars().filter(|c| *c != closing).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::Letter;
    use crate::query::{Keyword, search};

    #[test]
    fn search_reply_notes_truncation() -> anyhow::Result<()> {
        let records: Vec<BookRecord> = (0..25)
            .map(|i| BookRecord::new(format!("Moon {i}"), format!("https://x/{i}")))
            .collect();
        let results = search(&records, &Keyword::parse("moon")?);
        let text = search_results(&results);

        assert!(text.contains("Found *25* book(s)"));
        assert!(text.contains("_(Showing first 20 results)_"));
        assert!(text.contains("20. [Moon 19](https://x/19)"));
        assert!(!text.contains("Moon 20]"));
        assert!(text.contains("_...and 5 more results_"));
        Ok(())
    }

    #[test]
    fn search_reply_without_overflow_has_no_footer() -> anyhow::Result<()> {
        let records = vec![BookRecord::new("Tempest", "https://x/1")];
        let results = search(&records, &Keyword::parse("temp")?);
        let text = search_results(&results);
        assert!(text.contains("Found *1* book(s)"));
        assert!(!text.contains("Showing first"));
        assert!(!text.contains("more results"));
        Ok(())
    }

    #[test]
    fn search_reply_for_no_match() -> anyhow::Result<()> {
        let results = search(&[], &Keyword::parse("nothing")?);
        assert!(search_results(&results).starts_with("📭 No books found for: *nothing*"));
        Ok(())
    }

    #[test]
    fn catalog_index_rows_hold_five_letters() {
        let rows: Vec<IndexRow> = "ABCDEFG"
            .chars()
            .map(Letter::Alpha)
            .chain([Letter::Other])
            .map(|letter| IndexRow {
                letter,
                url: format!("https://telegra.ph/{letter}"),
                count: 1,
            })
            .collect();
        let text = catalog_index(8, &rows);
        let lines: Vec<&str> = text.lines().filter(|l| l.starts_with('[')).collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].matches(" • ").count(), 4);
        assert!(lines[0].starts_with("[A](https://telegra.ph/A) (1)"));
        assert!(lines[1].ends_with("[#](https://telegra.ph/#) (1)"));
        assert!(text.contains("Total Books: *8*"));
    }

    #[test]
    fn link_text_cannot_close_early() {
        let book = BookRecord::new("[Side] Story", "https://x/s");
        assert_eq!(link(&book), "[[Side Story](https://x/s)");
        assert_eq!(entity_text("a*b", '*'), "ab");
    }
}
