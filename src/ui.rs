use crate::api::ApiError;
use crate::cache::Resource;
use crate::models::{Grant, GrantSummary};
use chrono::{DateTime, NaiveDateTime};

/// Seconds before a loading page asks the browser to try again.
const LOADING_REFRESH_SECS: u32 = 1;

pub fn render_landing() -> String {
    render_page("FundingPro", "", LANDING_HTML)
}

pub fn render_signup(email: &str, error: Option<&str>) -> String {
    let body = fill(
        SIGNUP_HTML,
        &[
            ("ERROR", error_banner(error).as_str()),
            ("EMAIL", escape_html(email).as_str()),
        ],
    );
    render_page("Sign Up", "", &body)
}

pub fn render_new_application(grant_id: &str, error: Option<&str>) -> String {
    let body = fill(
        NEW_APPLICATION_HTML,
        &[
            ("ERROR", error_banner(error).as_str()),
            ("GRANT_ID", escape_html(grant_id).as_str()),
        ],
    );
    render_page("New Application", "", &body)
}

pub fn render_dashboard(grants: &Resource<Vec<GrantSummary>>) -> String {
    let content = match grants {
        Resource::Loading => return loading_page("Available Grants"),
        Resource::Failed(err) => error_banner(Some(&describe_error(err))),
        Resource::Ready(list) if list.is_empty() => {
            "<p class=\"muted\">No grants are open right now.</p>".to_string()
        }
        Resource::Ready(list) => {
            let items: String = list
                .iter()
                .map(|grant| {
                    format!(
                        "\n    <li><a href=\"/grants/{}\">{}</a></li>",
                        grant.id,
                        escape_html(&grant.title)
                    )
                })
                .collect();
            format!("<ul class=\"grants\">{items}\n  </ul>")
        }
    };
    let body = format!(
        "<h1>Available Grants</h1>\n  {content}\n  <p><a href=\"/applications/new\">Start an application</a></p>"
    );
    render_page("Dashboard", "", &body)
}

pub fn render_grant_detail(grant: &Resource<Grant>) -> String {
    match grant {
        Resource::Loading => loading_page("Grant"),
        Resource::Failed(err) => {
            let body = format!(
                "<h1>Grant</h1>\n  {}\n  <p><a href=\"/dashboard\">Back to grants</a></p>",
                error_banner(Some(&describe_error(err)))
            );
            render_page("Grant", "", &body)
        }
        Resource::Ready(grant) => {
            let mut body = format!(
                "<h1>{}</h1>\n  <p>{}</p>\n  <p>Amount: ${}</p>",
                escape_html(&grant.title),
                escape_html(&grant.description),
                grant.amount
            );
            if let Some(deadline) = &grant.deadline {
                body.push_str(&format!(
                    "\n  <p>Deadline: {}</p>",
                    escape_html(&format_deadline(deadline))
                ));
            }
            if let Some(eligibility) = &grant.eligibility {
                body.push_str(&format!(
                    "\n  <p>Eligibility: {}</p>",
                    escape_html(eligibility)
                ));
            }
            body.push_str(&format!(
                "\n  <p><a href=\"/applications/new?grant_id={}\">Apply</a> · <a href=\"/dashboard\">Back to grants</a></p>",
                grant.id
            ));
            render_page(&grant.title, "", &body)
        }
    }
}

/// User-facing wording for an upstream failure.
pub fn describe_error(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized => {
            "Your session is missing or has expired. Please <a href=\"/signin\">sign in</a>.".to_string()
        }
        ApiError::Status { status: 404, .. } => "That grant could not be found.".to_string(),
        ApiError::Status { message, .. } => {
            format!("The grants service rejected the request: {}", escape_html(message))
        }
        ApiError::Request(_) | ApiError::ClientBuild(_) => {
            "The grants service could not be reached. Please try again.".to_string()
        }
        ApiError::Decode(_) => "The grants service sent an unexpected response.".to_string(),
    }
}

fn loading_page(title: &str) -> String {
    let head = format!("<meta http-equiv=\"refresh\" content=\"{LOADING_REFRESH_SECS}\" />");
    render_page(title, &head, "<p>Loading...</p>")
}

fn error_banner(message: Option<&str>) -> String {
    match message {
        Some(message) => format!("<p class=\"error\" role=\"alert\">{message}</p>"),
        None => String::new(),
    }
}

fn format_deadline(raw: &str) -> String {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return at.format("%B %-d, %Y").to_string();
    }
    match raw.parse::<NaiveDateTime>() {
        Ok(at) => at.format("%B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn render_page(title: &str, head: &str, body: &str) -> String {
    fill(
        LAYOUT_HTML,
        &[
            ("TITLE", escape_html(title).as_str()),
            ("HEAD", head),
            ("BODY", body),
        ],
    )
}

// Single pass over the template, so placeholders inside substituted values are
// left as text.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let Some(end) = tail.find("}}") else {
            rest = &rest[start..];
            break;
        };
        let name = &tail[..end];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &tail[end + 2..];
    }
    out.push_str(rest);
    out
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  {{HEAD}}
  <title>{{TITLE}}</title>
  <style>
    body {
      margin: 0;
      font-family: "Helvetica Neue", Arial, sans-serif;
      color: #1f2933;
      background: #f7f9fb;
    }

    main {
      max-width: 32rem;
      margin: 0 auto;
      padding: 2rem 1rem;
    }

    h1 {
      font-size: 1.6rem;
      margin: 0 0 1rem;
    }

    .grants {
      list-style: none;
      padding: 0;
    }

    .grants li {
      border: 1px solid #d9e2ec;
      padding: 0.5rem;
      margin-bottom: 0.5rem;
      background: white;
    }

    a {
      color: #2563eb;
    }

    input {
      display: block;
      width: 100%;
      box-sizing: border-box;
      padding: 0.5rem;
      margin-bottom: 0.5rem;
      border: 1px solid #bcccdc;
    }

    button {
      background: #2563eb;
      color: white;
      border: none;
      padding: 0.5rem 1rem;
      cursor: pointer;
    }

    .error {
      color: #b91c1c;
      border: 1px solid #fca5a5;
      background: #fef2f2;
      padding: 0.5rem;
    }

    .muted {
      color: #627d98;
    }

    .hero {
      min-height: 80vh;
      display: flex;
      flex-direction: column;
      align-items: center;
      justify-content: center;
      text-align: center;
    }

    .hero h1 {
      font-size: 2.4rem;
    }
  </style>
</head>
<body>
<main>
  {{BODY}}
</main>
</body>
</html>
"#;

const LANDING_HTML: &str = r#"<section class="hero">
    <h1>FundingPro</h1>
    <p>Discover and apply for grants with AI assistance.</p>
    <p><a href="/signup">Create an account</a> · <a href="/dashboard">Browse grants</a></p>
  </section>"#;

const SIGNUP_HTML: &str = r#"<form method="post" action="/signup">
    <h1>Sign Up</h1>
    {{ERROR}}
    <input name="email" type="email" placeholder="Email" value="{{EMAIL}}" />
    <input name="password" type="password" placeholder="Password" />
    <button type="submit">Create account</button>
  </form>"#;

const NEW_APPLICATION_HTML: &str = r#"<form method="post" action="/applications/new">
    <h1>New Application</h1>
    {{ERROR}}
    <input name="grant_id" placeholder="Grant ID" value="{{GRANT_ID}}" />
    <button type="submit">Create</button>
  </form>"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn grant() -> Grant {
        Grant {
            id: 1,
            title: "Community Grant".into(),
            description: "Support for local projects".into(),
            amount: 10000,
            deadline: Some("2030-01-01T00:00:00".into()),
            eligibility: Some("NPO".into()),
        }
    }

    #[test]
    fn landing_shows_brand() {
        let html = render_landing();
        assert!(html.contains("<title>FundingPro</title>"));
        assert!(html.contains("<h1>FundingPro</h1>"));
    }

    #[test]
    fn grant_detail_without_data_is_loading() {
        let html = render_grant_detail(&Resource::Loading);
        assert!(html.contains("Loading..."));
        assert!(html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn grant_detail_shows_fields() {
        let html = render_grant_detail(&Resource::Ready(grant()));
        assert!(html.contains("<h1>Community Grant</h1>"));
        assert!(html.contains("Support for local projects"));
        assert!(html.contains("Amount: $10000"));
        assert!(html.contains("Deadline: January 1, 2030"));
        assert!(html.contains("Eligibility: NPO"));
        assert!(!html.contains("Loading..."));
    }

    #[test]
    fn dashboard_links_each_grant() {
        let grants = vec![GrantSummary {
            id: 1,
            title: "Grant A".into(),
        }];
        let html = render_dashboard(&Resource::Ready(grants));
        assert_eq!(html.matches("<li>").count(), 1);
        assert!(html.contains("<li><a href=\"/grants/1\">Grant A</a></li>"));
    }

    #[test]
    fn dashboard_failure_is_explicit() {
        let html = render_dashboard(&Resource::Failed(ApiError::Unauthorized));
        assert!(html.contains("role=\"alert\""));
        assert!(html.contains("href=\"/signin\""));
        assert!(!html.contains("Loading..."));
    }

    #[test]
    fn user_content_is_escaped() {
        let grants = vec![GrantSummary {
            id: 2,
            title: "<script>alert(1)</script>".into(),
        }];
        let html = render_dashboard(&Resource::Ready(grants));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));

        let html = render_signup("\"><b>x", None);
        assert!(html.contains("value=\"&quot;&gt;&lt;b&gt;x\""));
    }

    #[test]
    fn placeholder_in_grant_title_stays_literal() {
        let mut grant = grant();
        grant.title = "{{BODY}} {{HEAD}}".into();
        let html = render_grant_detail(&Resource::Ready(grant));
        assert!(html.contains("<title>{{BODY}} {{HEAD}}</title>"));
        assert!(html.contains("<h1>{{BODY}} {{HEAD}}</h1>"));
        assert_eq!(html.matches("<title>").count(), 1);
        assert_eq!(html.matches("Support for local projects").count(), 1);
    }

    #[test]
    fn upstream_message_cannot_fill_other_fields() {
        let html = render_signup("a@b.com", Some("taken {{EMAIL}}"));
        assert!(html.contains("taken {{EMAIL}}"));
        assert_eq!(html.matches("a@b.com").count(), 1);
    }

    #[test]
    fn deadline_falls_back_to_raw_text() {
        assert_eq!(format_deadline("2030-05-02T10:00:00Z"), "May 2, 2030");
        assert_eq!(format_deadline("soon"), "soon");
    }
}
