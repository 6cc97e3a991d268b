// ABOUTME: HTML templates for transactional email
// ABOUTME: Welcome and generation-complete messages with escaped user content
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use chrono::{Datelike, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Product name shown in subjects and footers
pub const PRODUCT_NAME: &str = "MAaaSWC";

/// Subject line of the welcome email
pub const WELCOME_SUBJECT: &str = "Welcome to MAaaSWC!";

/// Subject line of the generation-complete email
pub const GENERATION_COMPLETE_SUBJECT: &str = "Your JSON generation is ready";

const STYLE: &str = r"
      body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; background-color: #f9f9f9; }
      .container { background-color: #ffffff; border-radius: 8px; padding: 30px; }
      .header { text-align: center; margin-bottom: 30px; }
      .info { background-color: #f2f8ff; border-left: 4px solid #00c853; padding: 15px; margin: 20px 0; }
      .button { display: inline-block; background-color: #6200ea; color: white; text-decoration: none; padding: 12px 24px; border-radius: 4px; font-weight: bold; }
      .footer { margin-top: 30px; font-size: 0.8em; color: #666; text-align: center; }";

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}
    </style>
  </head>
  <body>
    <div class="container">
{body}
      <div class="footer">
        <p>&copy; {year} {PRODUCT_NAME}. All rights reserved.</p>
      </div>
    </div>
  </body>
</html>
"#,
        title = encode_text(title),
        year = Utc::now().year(),
    )
}

/// Welcome email for a newly created account
#[must_use]
pub fn welcome_email(user_name: &str, login_url: &str) -> String {
    let body = format!(
        r#"      <div class="header"><h1>Welcome to {PRODUCT_NAME}!</h1></div>
      <p>Hi {name},</p>
      <p>Thanks for signing up for MultiAgent as a Service Workflow Creator.</p>
      <p>With the platform you can:</p>
      <ul>
        <li>Chat with the automation agent</li>
        <li>Generate JSON workflows for n8n</li>
        <li>See your flows as diagrams</li>
      </ul>
      <div style="text-align: center;">
        <a href="{url}" class="button">Get started</a>
      </div>
      <p>If you have any questions, just reply to this email.</p>
      <p>The {PRODUCT_NAME} team</p>"#,
        name = encode_text(user_name),
        url = encode_double_quoted_attribute(login_url),
    );
    page(WELCOME_SUBJECT, &body)
}

/// Notification that a generation finished
#[must_use]
pub fn generation_complete_email(
    user_name: &str,
    generation_id: &str,
    generation_name: Option<&str>,
    dashboard_url: &str,
) -> String {
    let display_name = generation_name
        .filter(|n| !n.trim().is_empty())
        .map_or_else(|| format!("Generation #{generation_id}"), ToOwned::to_owned);

    let body = format!(
        r#"      <div class="header"><h1>Your generation is ready!</h1></div>
      <p>Hi {name},</p>
      <p>Good news! Your n8n JSON generation completed successfully.</p>
      <div class="info">
        <p><strong>Name:</strong> {display}</p>
        <p><strong>ID:</strong> {id}</p>
        <p><strong>Status:</strong> Completed</p>
      </div>
      <div style="text-align: center;">
        <a href="{url}" class="button">View my generation</a>
      </div>
      <p>You can import the JSON file directly into n8n to create your workflow.</p>
      <p>The {PRODUCT_NAME} team</p>"#,
        name = encode_text(user_name),
        display = encode_text(&display_name),
        id = encode_text(generation_id),
        url = encode_double_quoted_attribute(dashboard_url),
    );
    page(GENERATION_COMPLETE_SUBJECT, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_content_is_escaped() {
        let html = welcome_email("<script>alert(1)</script>", "http://localhost:3000/chat");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains(r#"href="http://localhost:3000/chat""#));
    }

    #[test]
    fn test_generation_email_links_to_dashboard() {
        let html = generation_complete_email(
            "Ada",
            "42",
            None,
            "http://localhost:3000/generations/42",
        );
        assert!(html.contains("Generation #42"));
        assert!(html.contains("http://localhost:3000/generations/42"));
    }

    #[test]
    fn test_named_generation_uses_name() {
        let html = generation_complete_email("Ada", "42", Some("Onboarding & CRM"), "http://x/42");
        assert!(html.contains("Onboarding &amp; CRM"));
        assert!(!html.contains("Generation #42"));
    }
}
