//! Text rendering of browse views.
//!
//! Renderers build the whole block before anything is printed, so a defect
//! caught by the render boundary never leaves half a view on screen.

use std::fmt::Write as _;

use catalog_browse::{FeedSnapshot, PageSnapshot, RecordView, RenderError, ViewStatus};
use catalog_core::{ListItem, Record};
use console::style;

use crate::output::{control, page_strip, stat_bar, status_badge};

/// Highest base stat value drawn at full bar width.
const STAT_SCALE: u32 = 255;
const STAT_BAR_WIDTH: usize = 24;

fn item_line(
    out: &mut String,
    position: usize,
    item: &ListItem,
    card: Option<&RecordView>,
) -> Result<(), RenderError> {
    let id = item
        .record_id()
        .map(|id| format!("#{:<4}", id))
        .unwrap_or_else(|| " ".repeat(5));
    let detail = card.map(card_detail).unwrap_or_default();
    if detail.is_empty() {
        writeln!(out, "  {:>4}  {}  {}", position, style(id).dim(), item.name)?;
    } else {
        writeln!(
            out,
            "  {:>4}  {}  {:<16}  {}",
            position,
            style(id).dim(),
            item.name,
            detail
        )?;
    }
    Ok(())
}

/// Types of a loaded card, or its loading/error badge.
fn card_detail(card: &RecordView) -> String {
    if let Some(record) = &card.record {
        let tags: Vec<&str> = record.category_tags.iter().map(String::as_str).collect();
        return style(tags.join(", ")).dim().to_string();
    }
    if card.is_loading {
        style("loading").yellow().to_string()
    } else if card.is_not_found() {
        style("not found").red().to_string()
    } else if card.error.is_some() {
        style("details unavailable").red().to_string()
    } else {
        String::new()
    }
}

/// Message and retry hint for a view with nothing to show.
pub fn failure(status: &ViewStatus, retry_hint: &str) -> String {
    match status {
        ViewStatus::Failed { message, .. } => format!(
            "{} {}\n  {}\n",
            style("✗").red(),
            message,
            style(retry_hint).yellow()
        ),
        ViewStatus::Empty => format!("{}\n", style("Nothing to show.").dim()),
        ViewStatus::Loading => format!("{}\n", style("Loading…").dim()),
        ViewStatus::Ready => String::new(),
    }
}

/// One page of the paginated view.
pub fn page(
    snapshot: &PageSnapshot,
    status: &ViewStatus,
    cards: &[RecordView],
) -> Result<String, RenderError> {
    if snapshot.items.len() > snapshot.page_size as usize {
        return Err(RenderError::Shape(format!(
            "{} items on a page of {}",
            snapshot.items.len(),
            snapshot.page_size
        )));
    }

    let mut out = String::new();
    writeln!(
        out,
        "{}  page {} of {}  {}",
        style("Catalog").bold(),
        snapshot.current_page,
        snapshot.total_pages,
        status_badge(status)
    )?;

    if !status.is_ready() {
        out.push_str(&failure(status, "Retry with --retry."));
        return Ok(out);
    }

    let first = (snapshot.current_page.saturating_sub(1) * snapshot.page_size) as usize;
    for (i, item) in snapshot.items.iter().enumerate() {
        item_line(&mut out, first + i + 1, item, cards.get(i))?;
    }

    if snapshot.total_pages > 0 {
        writeln!(
            out,
            "\n  {}  {}  {}",
            control("‹ prev", snapshot.can_go_previous()),
            page_strip(&snapshot.page_numbers(), snapshot.current_page),
            control("next ›", snapshot.can_go_next())
        )?;
    }
    Ok(out)
}

/// The accumulated incremental view.
pub fn feed(
    snapshot: &FeedSnapshot,
    status: &ViewStatus,
    cards: &[RecordView],
) -> Result<String, RenderError> {
    let mut out = String::new();
    writeln!(
        out,
        "{}  {} items in {} pages  {}",
        style("Catalog").bold(),
        snapshot.items.len(),
        snapshot.pages_loaded,
        status_badge(status)
    )?;

    for (i, item) in snapshot.items.iter().enumerate() {
        item_line(&mut out, i + 1, item, cards.get(i))?;
    }

    if let Some(err) = &snapshot.error {
        if snapshot.items.is_empty() {
            out.push_str(&failure(status, "Retry with --retry."));
        } else {
            writeln!(
                out,
                "  {} {}",
                style("✗ Loading more failed:").red(),
                err
            )?;
        }
    } else if snapshot.has_more {
        writeln!(out, "  {}", style("… more below").dim())?;
    } else {
        writeln!(out, "  {}", style("· end of collection ·").dim())?;
    }
    Ok(out)
}

/// Detail view of one record.
pub fn record(record: &Record) -> Result<String, RenderError> {
    if record.name.is_empty() {
        return Err(RenderError::Missing(format!("name of record {}", record.id)));
    }

    let mut out = String::new();
    writeln!(
        out,
        "{} {}",
        style(format!("#{:03}", record.id)).dim(),
        style(&record.name).bold()
    )?;

    let tags: Vec<&str> = record.category_tags.iter().map(String::as_str).collect();
    writeln!(out, "  {}: {}", style("types").dim(), tags.join(", "))?;
    writeln!(
        out,
        "  {}: {:.1} m   {}: {:.1} kg",
        style("height").dim(),
        record.measurements.height_m(),
        style("weight").dim(),
        record.measurements.weight_kg()
    )?;
    if let Some(exp) = record.experience_value {
        writeln!(out, "  {}: {}", style("base experience").dim(), exp)?;
    }
    if let Some(image) = record.image_refs.preferred() {
        writeln!(out, "  {}: {}", style("image").dim(), image)?;
    }

    writeln!(out, "\n  {}", style("Abilities").underlined())?;
    for t in &record.traits {
        let marker = if t.is_rare {
            style(" (hidden)").magenta().to_string()
        } else {
            String::new()
        };
        writeln!(out, "    {}{}", t.name, marker)?;
    }

    writeln!(out, "\n  {}", style("Base stats").underlined())?;
    for stat in &record.base_stats {
        writeln!(
            out,
            "    {:<16} {:>3} {}",
            stat.stat_name,
            stat.value,
            stat_bar(stat.value, STAT_SCALE, STAT_BAR_WIDTH)
        )?;
    }
    writeln!(out, "    {:<16} {:>3}", "total", record.stat_total())?;
    Ok(out)
}

/// Static page for paths that lead nowhere.
pub fn not_found(path: &str) -> String {
    format!(
        "{}\n  {} {}\n",
        style("404 · Page not found").red().bold(),
        style("No page exists at").dim(),
        path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_data::{synthetic_record, FetchError};

    fn snapshot(items: Vec<ListItem>) -> PageSnapshot {
        PageSnapshot {
            current_page: 2,
            page_size: 2,
            items,
            total_pages: 3,
            is_loading: false,
            is_fetching: false,
            error: None,
        }
    }

    #[test]
    fn test_page_numbers_items_from_offset() {
        console::set_colors_enabled(false);
        let items = vec![
            ListItem::new("ivysaur", "https://host/pokemon/2/"),
            ListItem::new("venusaur", "https://host/pokemon/3/"),
        ];
        let text = page(&snapshot(items), &ViewStatus::Ready, &[]).unwrap();
        assert!(text.contains("page 2 of 3"));
        assert!(text.contains("     3  #2     ivysaur"));
        assert!(text.contains("1 [2] 3"));
    }

    #[test]
    fn test_cards_show_types_or_badge() {
        console::set_colors_enabled(false);
        let items = vec![
            ListItem::new("specimen-0004", "memory://catalog/4/"),
            ListItem::new("ghost", "memory://catalog/99/"),
        ];
        let record = synthetic_record(4);
        let tags: Vec<&str> = record.category_tags.iter().map(String::as_str).collect();
        let tags = tags.join(", ");
        let cards = vec![
            RecordView {
                id: "4".into(),
                record: Some(record.clone()),
                is_loading: false,
                is_fetching: false,
                error: None,
            },
            RecordView {
                id: "99".into(),
                record: None,
                is_loading: false,
                is_fetching: false,
                error: Some(FetchError::Http {
                    status: 404,
                    url: "memory://catalog/99/".into(),
                }),
            },
        ];

        let text = page(&snapshot(items), &ViewStatus::Ready, &cards).unwrap();
        assert!(text.contains(&format!("specimen-0004     {}", tags)));
        assert!(text.contains("ghost") && text.contains("not found"));
    }

    #[test]
    fn test_failed_page_shows_retry() {
        console::set_colors_enabled(false);
        let status = ViewStatus::Failed {
            message: "The catalog could not be reached.".into(),
            retryable: true,
            not_found: false,
        };
        let text = page(&snapshot(Vec::new()), &status, &[]).unwrap();
        assert!(text.contains("could not be reached"));
        assert!(text.contains("--retry"));
    }

    #[test]
    fn test_record_detail() {
        console::set_colors_enabled(false);
        let text = record(&synthetic_record(4)).unwrap();
        assert!(text.contains("#004 specimen-0004"));
        assert!(text.contains("(hidden)"));
        assert!(text.contains("total"));
    }

    #[test]
    fn test_overfull_page_is_a_defect() {
        let items = vec![
            ListItem::new("a", "memory://catalog/1/"),
            ListItem::new("b", "memory://catalog/2/"),
            ListItem::new("c", "memory://catalog/3/"),
        ];
        assert_eq!(
            page(&snapshot(items), &ViewStatus::Ready, &[]),
            Err(RenderError::Shape("3 items on a page of 2".into()))
        );
    }

    #[test]
    fn test_record_without_name_is_a_defect() {
        let mut broken = synthetic_record(9);
        broken.name.clear();
        assert_eq!(
            record(&broken),
            Err(RenderError::Missing("name of record 9".into()))
        );
    }

    #[test]
    fn test_feed_terminal_marker() {
        console::set_colors_enabled(false);
        let done = FeedSnapshot {
            items: vec![ListItem::new("a", "memory://catalog/1/")],
            pages_loaded: 1,
            has_more: false,
            is_loading: false,
            is_fetching_next: false,
            error: None,
        };
        let text = feed(&done, &ViewStatus::Ready, &[]).unwrap();
        assert!(text.contains("end of collection"));
    }
}
