use crate::model::quote_request::QuoteRequest;
use html_escape::{encode_double_quoted_attribute, encode_text};

pub const QUOTE_REQUEST_SUBJECT: &str = "Quote Request Confirmation";

/// Plain-text confirmation body
pub fn render_quote_request_text(quote_request: &QuoteRequest) -> String {
    format!(
        r#"Hello {first_name},

Thank you for your quote request. Our team has received the following details and will get back to you shortly.

First name: {first_name}
Last name: {last_name}
Job title: {job_title}
Zip code: {zip_code}
Email: {email}
Number: {number}
City: {city}
Country: {country}

Message:
{message}

Best regards,
The Sales Team

---
This is an automated message. Please do not reply to this email."#,
        first_name = quote_request.firstName,
        last_name = quote_request.lastName,
        job_title = quote_request.jobTitle,
        zip_code = quote_request.zipCode,
        email = quote_request.email,
        number = quote_request.number,
        city = quote_request.city,
        country = quote_request.country,
        message = quote_request.message,
    )
}

/// HTML confirmation body. Every submitted value is escaped before it is
/// placed in the markup; the logo is referenced as `cid:<logo_content_id>`.
pub fn render_quote_request_html(quote_request: &QuoteRequest, logo_content_id: &str) -> String {
    let message = encode_text(&quote_request.message).replace('\n', "<br>");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Quote Request Confirmation</title>
    <style>
        body {{
            font-family: Arial, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 600px;
            margin: 0 auto;
            padding: 20px;
        }}
        .header {{
            background-color: #f8f9fa;
            padding: 20px;
            text-align: center;
            border-radius: 8px 8px 0 0;
        }}
        .header img {{
            max-width: 180px;
            height: auto;
        }}
        .content {{
            background-color: #ffffff;
            padding: 30px;
            border: 1px solid #dee2e6;
        }}
        table.details {{
            width: 100%;
            border-collapse: collapse;
            margin: 20px 0;
        }}
        table.details th {{
            text-align: left;
            width: 35%;
            padding: 8px;
            background-color: #f1f3f5;
            border-bottom: 1px solid #dee2e6;
        }}
        table.details td {{
            padding: 8px;
            border-bottom: 1px solid #dee2e6;
        }}
        .message {{
            background-color: #f8f9fa;
            padding: 15px;
            border-radius: 4px;
            white-space: normal;
            word-break: break-word;
        }}
        .footer {{
            background-color: #f8f9fa;
            padding: 15px;
            text-align: center;
            font-size: 12px;
            color: #6c757d;
            border-radius: 0 0 8px 8px;
        }}
    </style>
</head>
<body>
    <div class="header">
        <img src="cid:{logo_cid}" alt="Logo">
        <h2>Quote Request Confirmation</h2>
    </div>

    <div class="content">
        <p>Hello {first_name},</p>

        <p>Thank you for your quote request. Our team has received the following details and will get back to you shortly.</p>

        <table class="details">
            <tr><th>First name</th><td>{first_name}</td></tr>
            <tr><th>Last name</th><td>{last_name}</td></tr>
            <tr><th>Job title</th><td>{job_title}</td></tr>
            <tr><th>Zip code</th><td>{zip_code}</td></tr>
            <tr><th>Email</th><td>{email}</td></tr>
            <tr><th>Number</th><td>{number}</td></tr>
            <tr><th>City</th><td>{city}</td></tr>
            <tr><th>Country</th><td>{country}</td></tr>
        </table>

        <p><strong>Message:</strong></p>
        <div class="message">{message}</div>

        <p>Best regards,<br>The Sales Team</p>
    </div>

    <div class="footer">
        <p>This is an automated message. Please do not reply to this email.</p>
    </div>
</body>
</html>"#,
        logo_cid = encode_double_quoted_attribute(logo_content_id),
        first_name = encode_text(&quote_request.firstName),
        last_name = encode_text(&quote_request.lastName),
        job_title = encode_text(&quote_request.jobTitle),
        zip_code = encode_text(&quote_request.zipCode),
        email = encode_text(&quote_request.email),
        number = encode_text(&quote_request.number),
        city = encode_text(&quote_request.city),
        country = encode_text(&quote_request.country),
        message = message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QuoteRequest {
        QuoteRequest {
            id: None,
            firstName: "Jane".to_string(),
            lastName: "Doe".to_string(),
            jobTitle: "Facilities Manager".to_string(),
            zipCode: "10115".to_string(),
            email: "jane.doe@example.com".to_string(),
            number: "+49 30 1234567".to_string(),
            city: "Berlin".to_string(),
            country: "Germany".to_string(),
            message: "We need 40 desks.\nDelivery in May.".to_string(),
            createdAt: None,
        }
    }

    #[test]
    fn test_html_contains_every_field() {
        let html = render_quote_request_html(&sample(), "logo");
        for value in [
            "Jane",
            "Doe",
            "Facilities Manager",
            "10115",
            "jane.doe@example.com",
            "+49 30 1234567",
            "Berlin",
            "Germany",
        ] {
            assert!(html.contains(value), "missing {}", value);
        }
        assert!(html.contains("We need 40 desks.<br>Delivery in May."));
        assert!(html.contains(r#"src="cid:logo""#));
    }

    #[test]
    fn test_html_escapes_markup() {
        let mut quote_request = sample();
        quote_request.firstName = "<script>alert(1)</script>".to_string();
        quote_request.message = "<b>bold</b> & \"quoted\"".to_string();
        let html = render_quote_request_html(&quote_request, "logo");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<b>bold</b>"));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt; &amp;"));
    }

    #[test]
    fn test_content_id_is_attribute_escaped() {
        let html = render_quote_request_html(&sample(), "lo\"go");
        assert!(html.contains("cid:lo&quot;go"));
    }

    #[test]
    fn test_text_contains_every_field() {
        let text = render_quote_request_text(&sample());
        assert!(text.starts_with("Hello Jane,"));
        assert!(text.contains("Zip code: 10115"));
        assert!(text.contains("Number: +49 30 1234567"));
        assert!(text.contains("We need 40 desks.\nDelivery in May."));
    }
}
