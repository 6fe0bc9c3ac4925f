//! Printable HTML rendering of the saved trips.

use std::fmt::Write as _;

use thiserror::Error;

use roam_db::models::Trip;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("No trips to download!")]
    NoTrips,
}

const STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 30px; }
h1 { color: #004080; }
img { width: 200px; height: 120px; border-radius: 8px; margin: 10px 0; }
.trip { border-bottom: 1px solid #ccc; margin-bottom: 20px; padding-bottom: 10px; }";

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render every trip, numbered from 1 in stored order, as a standalone
/// HTML document.
pub fn render_printable(trips: &[Trip]) -> Result<String, ExportError> {
    if trips.is_empty() {
        return Err(ExportError::NoTrips);
    }

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>My Trip Itinerary</title>\n");
    let _ = writeln!(html, "<style>\n{STYLE}\n</style>");
    html.push_str("</head>\n<body>\n<h1>My Trip Itinerary</h1>\n");

    for (i, trip) in trips.iter().enumerate() {
        let destination = escape_html(&trip.destination);
        let notes = trip
            .notes
            .as_deref()
            .filter(|n| !n.is_empty())
            .map(escape_html)
            .unwrap_or_else(|| "None".to_owned());

        html.push_str("<div class=\"trip\">\n");
        let _ = writeln!(html, "<h2>{}. {destination}</h2>", i + 1);
        let _ = writeln!(html, "<p><strong>Days:</strong> {}</p>", trip.days);
        let _ = writeln!(html, "<p><strong>Notes:</strong> {notes}</p>");
        if let Some(image) = trip.image.as_deref().filter(|s| !s.is_empty()) {
            let _ = writeln!(
                html,
                "<img src=\"{}\" alt=\"{destination}\">",
                escape_html(image)
            );
        }
        html.push_str("</div>\n");
    }

    html.push_str(
        "<p style=\"text-align:center; font-size:12px;\">Generated by Trip Planner</p>\n",
    );
    html.push_str("</body>\n</html>\n");
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn trip(destination: &str, notes: Option<&str>, image: Option<&str>) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            destination: destination.to_owned(),
            days: 3,
            notes: notes.map(str::to_owned),
            budget: 0.0,
            image: image.map(str::to_owned),
            visited: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_collection_is_an_error() {
        let err = render_printable(&[]).unwrap_err();
        assert_eq!(err.to_string(), "No trips to download!");
    }

    #[test]
    fn trips_are_numbered_with_defaults() {
        let html = render_printable(&[
            trip("Goa", Some("beach days"), None),
            trip("Delhi", Some(""), Some("https://img.example/delhi.png")),
        ])
        .unwrap();

        assert!(html.contains("<title>My Trip Itinerary</title>"));
        assert!(html.contains("<h2>1. Goa</h2>"));
        assert!(html.contains("<p><strong>Notes:</strong> beach days</p>"));
        assert!(html.contains("<h2>2. Delhi</h2>"));
        assert!(html.contains("<p><strong>Notes:</strong> None</p>"));
        assert!(html.contains("<img src=\"https://img.example/delhi.png\" alt=\"Delhi\">"));
        assert_eq!(html.matches("<img").count(), 1);
        assert!(html.contains("Generated by Trip Planner"));
    }

    #[test]
    fn user_text_is_escaped() {
        let html = render_printable(&[trip(
            "<script>alert(1)</script>",
            Some("Tom & Jerry's \"trip\""),
            None,
        )])
        .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Tom &amp; Jerry&#39;s &quot;trip&quot;"));
    }
}
