//! HTML building blocks for the dashboard pages.

use axum::response::Html;
use newsdigest_core::{Article, Section, SentimentLabel};
use newsdigest_db::ArticleStatistics;
use newsdigest_pipeline::IngestReport;

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem;color:#222}\
nav a{margin-right:1rem}table{border-collapse:collapse;width:100%}\
td,th{border-bottom:1px solid #ddd;padding:.4rem;text-align:left;vertical-align:top}\
.error{background:#fde2e2;border:1px solid #e99;padding:.6rem}\
.notice{background:#e6f4ea;border:1px solid #9c9;padding:.6rem}\
.positive{color:#1a7f37}.negative{color:#c62828}.neutral{color:#666}\
.metric{display:inline-block;margin-right:2rem}.metric b{font-size:1.6rem;display:block}";

/// Escape text for use in HTML element content and quoted attributes.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a page body in the shared layout. `title` is escaped; `body` must
/// already be safe HTML.
pub(crate) fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"ko\"><head><meta charset=\"utf-8\">\
         <title>{title} · News Digest</title><style>{STYLE}</style></head><body>\
         <nav><a href=\"/dashboard\">Overview</a><a href=\"/dashboard/articles\">Articles</a>\
         <a href=\"/dashboard/statistics\">Statistics</a><a href=\"/dashboard/search\">Search</a></nav>\
         <h1>{title}</h1>{body}</body></html>",
        title = escape(title),
    ))
}

pub(crate) fn error_message(message: &str) -> String {
    format!("<p class=\"error\">{}</p>", escape(message))
}

pub(crate) fn notice(message: &str) -> String {
    format!("<p class=\"notice\">{}</p>", escape(message))
}

fn sentiment_cell(label: Option<SentimentLabel>, score: Option<f64>) -> String {
    match (label, score) {
        (Some(label), Some(score)) => {
            format!("<span class=\"{label}\">{label} ({score:.2})</span>")
        }
        (Some(label), None) => format!("<span class=\"{label}\">{label}</span>"),
        _ => "<span class=\"neutral\">-</span>".to_string(),
    }
}

/// `<select>` of all sections, with `selected` pre-chosen. `include_all`
/// adds an empty "all sections" option.
pub(crate) fn section_select(selected: Option<Section>, include_all: bool) -> String {
    let mut options = String::new();
    if include_all {
        options.push_str("<option value=\"\">All sections</option>");
    }
    for section in Section::ALL {
        let marker = if Some(section) == selected {
            " selected"
        } else {
            ""
        };
        options.push_str(&format!(
            "<option value=\"{}\"{marker}>{} ({})</option>",
            section.slug(),
            escape(section.label()),
            escape(section.portal_name()),
        ));
    }
    format!("<select name=\"section\">{options}</select>")
}

pub(crate) fn article_table(articles: &[Article]) -> String {
    if articles.is_empty() {
        return "<p>No articles stored yet.</p>".to_string();
    }
    let rows: String = articles
        .iter()
        .map(|a| {
            format!(
                "<tr><td>{created}</td><td>{section}</td>\
                 <td><a href=\"/dashboard/articles/{id}\">{title}</a></td>\
                 <td>{summary}</td><td>{sentiment}</td>\
                 <td><form method=\"post\" action=\"/dashboard/articles/{id}/delete\">\
                 <button type=\"submit\">Delete</button></form></td></tr>",
                created = a.created_at.format("%Y-%m-%d %H:%M"),
                section = escape(a.section.label()),
                id = a.id,
                title = escape(&a.title),
                summary = escape(a.summary.as_deref().unwrap_or("")),
                sentiment = sentiment_cell(a.sentiment, a.sentiment_score),
            )
        })
        .collect();
    format!(
        "<table><thead><tr><th>Stored</th><th>Section</th><th>Title</th>\
         <th>Summary</th><th>Sentiment</th><th></th></tr></thead><tbody>{rows}</tbody></table>"
    )
}

pub(crate) fn article_detail(article: &Article) -> String {
    format!(
        "<p><a href=\"{url}\" rel=\"noopener noreferrer\">{url}</a></p>\
         <p>{section} · stored {created} · {sentiment}</p>\
         <h2>Summary</h2><p>{summary}</p><h2>Content</h2><p>{content}</p>\
         <form method=\"post\" action=\"/dashboard/articles/{id}/delete\">\
         <button type=\"submit\">Delete</button></form>",
        url = escape(&article.url),
        section = escape(article.section.label()),
        created = article.created_at.format("%Y-%m-%d %H:%M UTC"),
        sentiment = sentiment_cell(article.sentiment, article.sentiment_score),
        summary = escape(article.summary.as_deref().unwrap_or("(no summary)")),
        content = escape(&article.content),
        id = article.id,
    )
}

pub(crate) fn metrics(stats: &ArticleStatistics) -> String {
    let average = stats
        .average_sentiment_score
        .map_or_else(|| "-".to_string(), |s| format!("{s:.2}"));
    format!(
        "<div><span class=\"metric\"><b>{}</b>articles</span>\
         <span class=\"metric\"><b>{}</b>stored today</span>\
         <span class=\"metric\"><b>{average}</b>avg. sentiment score</span></div>",
        stats.total_articles, stats.today_articles,
    )
}

pub(crate) fn statistics_tables(stats: &ArticleStatistics) -> String {
    let sections: String = stats
        .section_counts
        .iter()
        .map(|c| {
            format!(
                "<tr><td>{}</td><td>{}</td></tr>",
                escape(c.section.label()),
                c.count
            )
        })
        .collect();
    let sentiments: String = stats
        .sentiment_counts
        .iter()
        .map(|c| {
            format!(
                "<tr><td class=\"{label}\">{label}</td><td>{count}</td></tr>",
                label = c.label,
                count = c.count
            )
        })
        .collect();
    let days: String = stats
        .daily_counts
        .iter()
        .map(|d| format!("<tr><td>{}</td><td>{}</td></tr>", escape(&d.day), d.count))
        .collect();
    format!(
        "<h2>By section</h2><table><tbody>{sections}</tbody></table>\
         <h2>By sentiment</h2><table><tbody>{sentiments}</tbody></table>\
         <h2>By day</h2><table><tbody>{days}</tbody></table>"
    )
}

pub(crate) fn search_form(selected: Option<Section>, count: usize) -> String {
    format!(
        "<form method=\"post\" action=\"/dashboard/search\">{select} \
         <input type=\"number\" name=\"count\" min=\"1\" max=\"200\" value=\"{count}\"> \
         <button type=\"submit\">Fetch and analyse</button></form>",
        select = section_select(selected, false),
    )
}

pub(crate) fn ingest_result(report: &IngestReport) -> String {
    let summary_line = format!(
        "{}: {} fetched, {} stored, {} already known, {} skipped.",
        report.section.label(),
        report.fetched,
        report.stored.len(),
        report.duplicates,
        report.skipped,
    );
    let rows: String = report
        .stored
        .iter()
        .map(|a| {
            format!(
                "<tr><td><a href=\"/dashboard/articles/{id}\">{title}</a></td>\
                 <td>{summary}</td><td>{sentiment}</td></tr>",
                id = a.id,
                title = escape(&a.title),
                summary = escape(&a.summary),
                sentiment = sentiment_cell(a.sentiment, a.sentiment_score),
            )
        })
        .collect();
    format!(
        "{}<table><thead><tr><th>Title</th><th>Summary</th><th>Sentiment</th></tr></thead>\
         <tbody>{rows}</tbody></table>",
        notice(&summary_line)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_replaces_markup_characters() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape("정치 뉴스"), "정치 뉴스");
    }

    #[test]
    fn page_escapes_title() {
        let Html(html) = page("<script>", "<p>ok</p>");
        assert!(html.contains("<h1>&lt;script&gt;</h1>"));
        assert!(html.contains("<p>ok</p>"));
    }

    #[test]
    fn section_select_marks_selection() {
        let html = section_select(Some(Section::World), true);
        assert!(html.contains("<option value=\"world\" selected>"));
        assert!(html.contains("<option value=\"\">All sections</option>"));
        assert_eq!(html.matches("<option").count(), 7);
    }
}
