//! Server-rendered lead dashboard.
//!
//! Summary counts cover every stored lead; the table below them honours the
//! search, filter and pagination parameters.

use crate::models::Lead;
use serde::Deserialize;
use std::fmt::Write;

pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 100;

/// Query parameters accepted by `GET /`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    /// Case-insensitive search over name, industry and message.
    pub q: Option<String>,
    /// `hot`, `warm` or `cold`.
    pub score: Option<String>,
    /// `POSITIVE` or `NEGATIVE`.
    pub sentiment: Option<String>,
    /// `yes` or `no`.
    pub intent: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl DashboardQuery {
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(q) = non_blank(&self.q) {
            if !(contains_ci(&lead.name, q)
                || contains_ci(&lead.industry, q)
                || contains_ci(&lead.message, q))
            {
                return false;
            }
        }
        if let Some(score) = non_blank(&self.score) {
            if !lead.score_label.eq_ignore_ascii_case(score) {
                return false;
            }
        }
        if let Some(sentiment) = non_blank(&self.sentiment) {
            if !lead.sentiment_label.eq_ignore_ascii_case(sentiment) {
                return false;
            }
        }
        if let Some(intent) = non_blank(&self.intent) {
            let wanted = match intent.to_ascii_lowercase().as_str() {
                "yes" | "true" | "1" => true,
                "no" | "false" | "0" => false,
                _ => return false,
            };
            if lead.intent_detected != wanted {
                return false;
            }
        }
        if let Some(industry) = non_blank(&self.industry) {
            if !contains_ci(&lead.industry, industry) {
                return false;
            }
        }
        if let Some(location) = non_blank(&self.location) {
            if !contains_ci(&lead.location, location) {
                return false;
            }
        }
        true
    }

    pub fn per_page(&self) -> usize {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }
}

/// One page of filtered leads.
#[derive(Debug)]
pub struct LeadPage<'a> {
    pub leads: Vec<&'a Lead>,
    pub page: usize,
    pub total_pages: usize,
    pub total_matching: usize,
}

pub fn paginate<'a>(leads: &'a [Lead], query: &DashboardQuery) -> LeadPage<'a> {
    let matching: Vec<&Lead> = leads.iter().filter(|l| query.matches(l)).collect();
    let per_page = query.per_page();
    let total_pages = matching.len().div_ceil(per_page).max(1);
    let page = query.page().min(total_pages);
    let total_matching = matching.len();

    let leads = matching
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    LeadPage {
        leads,
        page,
        total_pages,
        total_matching,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadSummary {
    pub total: usize,
    pub hot: usize,
    pub warm: usize,
    pub cold: usize,
    pub positive: usize,
    pub negative: usize,
    pub with_intent: usize,
    pub average_score: Option<f64>,
}

impl LeadSummary {
    pub fn from_leads(leads: &[Lead]) -> Self {
        let mut summary = LeadSummary {
            total: leads.len(),
            ..Default::default()
        };
        for lead in leads {
            match lead.score_label.as_str() {
                "Hot" => summary.hot += 1,
                "Warm" => summary.warm += 1,
                _ => summary.cold += 1,
            }
            if lead.sentiment_label == "POSITIVE" {
                summary.positive += 1;
            } else {
                summary.negative += 1;
            }
            if lead.intent_detected {
                summary.with_intent += 1;
            }
        }
        if !leads.is_empty() {
            summary.average_score =
                Some(leads.iter().map(|l| l.score).sum::<f64>() / leads.len() as f64);
        }
        summary
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn query_string(query: &DashboardQuery, page: usize) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let text_params = [
        ("q", &query.q),
        ("score", &query.score),
        ("sentiment", &query.sentiment),
        ("intent", &query.intent),
        ("industry", &query.industry),
        ("location", &query.location),
    ];
    for (key, value) in text_params {
        if let Some(v) = non_blank(value) {
            serializer.append_pair(key, v);
        }
    }
    serializer
        .append_pair("page", &page.to_string())
        .append_pair("per_page", &query.per_page().to_string())
        .finish()
}

fn select(name: &str, current: Option<&str>, options: &[(&str, &str)]) -> String {
    let mut html = format!("<select name=\"{}\"><option value=\"\">Any {}</option>", name, name);
    for (value, label) in options {
        let selected = current.is_some_and(|c| c.eq_ignore_ascii_case(value));
        let _ = write!(
            html,
            "<option value=\"{}\"{}>{}</option>",
            value,
            if selected { " selected" } else { "" },
            label
        );
    }
    html.push_str("</select>");
    html
}

/// Engagement metrics of one lead as a compact cell.
fn engagement(lead: &Lead) -> String {
    format!(
        "Visits: {}<br>Email opens: {}<br>Time on site: {:.1} min<br>CTR: {:.1}%<br>\
Past purchases: {}<br>Inquiry responses: {}",
        lead.website_visits,
        lead.email_opens,
        lead.time_spent_on_site,
        lead.click_through_rate * 100.0,
        lead.past_purchases,
        lead.inquiry_responses
    )
}

pub fn render_dashboard(leads: &[Lead], query: &DashboardQuery) -> String {
    let summary = LeadSummary::from_leads(leads);
    let page = paginate(leads, query);

    let mut html = String::from(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Lead Management Dashboard</title>
    <style>
        body { font-family: sans-serif; margin: 2rem; }
        table { border-collapse: collapse; width: 100%; }
        th, td { border: 1px solid #ddd; padding: 0.4rem; vertical-align: top; }
        .summary span { margin-right: 1.5rem; }
        .Hot { color: #c0392b; } .Warm { color: #d68910; } .Cold { color: #2471a3; }
    </style>
</head>
<body>
<h1>Lead Management Dashboard</h1>
"#,
    );

    let average = summary
        .average_score
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "-".to_string());
    let _ = write!(
        html,
        "<div class=\"summary\"><span>Total: {}</span><span class=\"Hot\">Hot: {}</span>\
<span class=\"Warm\">Warm: {}</span><span class=\"Cold\">Cold: {}</span>\
<span>Positive: {}</span><span>Negative: {}</span><span>Intent: {}</span>\
<span>Average score: {}</span></div>\n",
        summary.total,
        summary.hot,
        summary.warm,
        summary.cold,
        summary.positive,
        summary.negative,
        summary.with_intent,
        average
    );

    let _ = write!(
        html,
        "<form method=\"get\" action=\"/\">\
<input type=\"text\" name=\"q\" placeholder=\"Search name, industry, message\" value=\"{}\">\
{}{}{}\
<input type=\"text\" name=\"industry\" placeholder=\"Industry\" value=\"{}\">\
<input type=\"text\" name=\"location\" placeholder=\"Location\" value=\"{}\">\
<input type=\"hidden\" name=\"per_page\" value=\"{}\">\
<button type=\"submit\">Filter</button> <a href=\"/\">Reset</a></form>\n",
        escape_html(non_blank(&query.q).unwrap_or("")),
        select(
            "score",
            non_blank(&query.score),
            &[("hot", "Hot"), ("warm", "Warm"), ("cold", "Cold")]
        ),
        select(
            "sentiment",
            non_blank(&query.sentiment),
            &[("POSITIVE", "Positive"), ("NEGATIVE", "Negative")]
        ),
        select(
            "intent",
            non_blank(&query.intent),
            &[("yes", "Yes"), ("no", "No")]
        ),
        escape_html(non_blank(&query.industry).unwrap_or("")),
        escape_html(non_blank(&query.location).unwrap_or("")),
        query.per_page()
    );

    let _ = write!(
        html,
        "<h2>Leads ({} matching)</h2>\n<table>\n<tr><th>ID</th><th>Name</th><th>Location</th>\
<th>Industry</th><th>Role</th><th>Company size</th><th>Source</th><th>Engagement</th>\
<th>Score</th><th>Sentiment</th><th>Intent</th><th>Message</th><th>Follow-up</th></tr>\n",
        page.total_matching
    );

    if page.leads.is_empty() {
        html.push_str("<tr><td colspan=\"13\">No leads found.</td></tr>\n");
    }
    for lead in &page.leads {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
<td>{}</td><td class=\"{}\">{:.2} ({})</td><td>{} ({:.2})</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            lead.id,
            escape_html(&lead.name),
            escape_html(&lead.location),
            escape_html(&lead.industry),
            escape_html(&lead.job_role),
            escape_html(&lead.company_size),
            escape_html(&lead.lead_source),
            engagement(lead),
            escape_html(&lead.score_label),
            lead.score,
            escape_html(&lead.score_label),
            escape_html(&lead.sentiment_label),
            lead.sentiment_score,
            escape_html(&lead.intent_label),
            escape_html(&lead.message),
            escape_html(&lead.followup),
        );
    }
    html.push_str("</table>\n");

    if page.total_pages > 1 {
        html.push_str("<nav>");
        if page.page > 1 {
            let _ = write!(
                html,
                "<a href=\"/?{}\">Previous</a> ",
                escape_html(&query_string(query, page.page - 1))
            );
        }
        let _ = write!(html, "Page {} of {}", page.page, page.total_pages);
        if page.page < page.total_pages {
            let _ = write!(
                html,
                " <a href=\"/?{}\">Next</a>",
                escape_html(&query_string(query, page.page + 1))
            );
        }
        html.push_str("</nav>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}
