use crate::model::quote_request::QuoteRequest;
use crate::util::email_address::normalize_email;
use serde::{Deserialize, Deserializer, Serialize};

use validator::{Validate, ValidationErrors};

/// JSON names of the submitted fields, in form order.
pub const QUOTE_REQUEST_FIELDS: [&str; 9] = [
    "firstName",
    "lastName",
    "jobTitle",
    "zipCode",
    "email",
    "number",
    "city",
    "country",
    "message",
];

/// One rejected field of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// --- Validated DTO for the public form ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateQuoteRequest {
    #[serde(rename = "firstName", default, deserialize_with = "string_or_empty")]
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[serde(rename = "lastName", default, deserialize_with = "string_or_empty")]
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[serde(rename = "jobTitle", default, deserialize_with = "string_or_empty")]
    #[validate(length(min = 1, message = "Job title is required"))]
    pub job_title: String,

    #[serde(rename = "zipCode", default, deserialize_with = "string_or_empty")]
    #[validate(length(min = 1, message = "Zip code is required"))]
    pub zip_code: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email must be a valid email address")
    )]
    pub email: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    #[validate(length(min = 1, message = "Number is required"))]
    pub number: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

impl CreateQuoteRequest {
    /// Trim surrounding whitespace from every field.
    pub fn sanitized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            job_title: self.job_title.trim().to_string(),
            zip_code: self.zip_code.trim().to_string(),
            email: self.email.trim().to_string(),
            number: self.number.trim().to_string(),
            city: self.city.trim().to_string(),
            country: self.country.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }

    /// Trim, validate and normalize the submission into a record ready to
    /// be stored. Nothing is stored or sent here.
    pub fn into_quote_request(self) -> Result<QuoteRequest, Vec<FieldViolation>> {
        let request = self.sanitized();
        request.validate().map_err(violations_from)?;

        let email = normalize_email(&request.email).ok_or_else(|| {
            vec![FieldViolation::new("email", "Email must be a valid email address")]
        })?;

        Ok(QuoteRequest {
            id: None,
            firstName: request.first_name,
            lastName: request.last_name,
            jobTitle: request.job_title,
            zipCode: request.zip_code,
            email,
            number: request.number,
            city: request.city,
            country: request.country,
            message: request.message,
            createdAt: None,
        })
    }
}

/// Flatten validator output into one violation per field, ordered like the
/// form. A failed `length` check (empty value) wins over format checks.
pub fn violations_from(errors: ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, field_errors)| {
            let error = field_errors
                .iter()
                .find(|e| e.code == "length")
                .or_else(|| field_errors.first())?;
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", error.code));
            Some(FieldViolation::new(camel_case(&field.to_string()), message))
        })
        .collect();
    violations.sort_by_key(|v| field_position(&v.field));
    violations
}

fn field_position(field: &str) -> usize {
    QUOTE_REQUEST_FIELDS
        .iter()
        .position(|name| *name == field)
        .unwrap_or(QUOTE_REQUEST_FIELDS.len())
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

// `null` is treated like a missing field
fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Stored record as returned to API callers
#[allow(non_snake_case)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequestResponseDto {
    pub id: Option<String>,
    pub firstName: String,
    pub lastName: String,
    pub jobTitle: String,
    pub zipCode: String,
    pub email: String,
    pub number: String,
    pub city: String,
    pub country: String,
    pub message: String,
    pub createdAt: Option<String>,
}

impl From<QuoteRequest> for QuoteRequestResponseDto {
    fn from(record: QuoteRequest) -> Self {
        Self {
            id: record.id.map(|id| id.to_hex()),
            firstName: record.firstName,
            lastName: record.lastName,
            jobTitle: record.jobTitle,
            zipCode: record.zipCode,
            email: record.email,
            number: record.number,
            city: record.city,
            country: record.country,
            message: record.message,
            createdAt: record.createdAt,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequestCreatedResponse {
    pub message: String,
    pub data: QuoteRequestResponseDto,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> serde_json::Value {
        json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "jobTitle": "Facilities Manager",
            "zipCode": "10115",
            "email": "Jane.Doe@Example.com",
            "number": "+49 30 1234567",
            "city": "Berlin",
            "country": "Germany",
            "message": "We need a quote for 40 desks."
        })
    }

    #[test]
    fn test_valid_request_converts() {
        let request: CreateQuoteRequest = serde_json::from_value(valid_body()).unwrap();
        let record = request.into_quote_request().expect("valid request");
        assert_eq!(record.firstName, "Jane");
        assert_eq!(record.email, "jane.doe@example.com");
        assert_eq!(record.zipCode, "10115");
        assert!(record.id.is_none());
    }

    #[test]
    fn test_fields_are_trimmed() {
        let mut body = valid_body();
        body["city"] = json!("   Berlin \n");
        let request: CreateQuoteRequest = serde_json::from_value(body).unwrap();
        let record = request.into_quote_request().unwrap();
        assert_eq!(record.city, "Berlin");
    }

    #[test]
    fn test_blank_field_reports_json_name() {
        let mut body = valid_body();
        body["jobTitle"] = json!("   ");
        let request: CreateQuoteRequest = serde_json::from_value(body).unwrap();
        let violations = request.into_quote_request().unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "jobTitle");
        assert_eq!(violations[0].message, "Job title is required");
    }

    #[test]
    fn test_missing_and_null_fields_are_required() {
        let body = json!({ "firstName": null });
        let request: CreateQuoteRequest = serde_json::from_value(body).unwrap();
        let violations = request.into_quote_request().unwrap_err();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        for name in QUOTE_REQUEST_FIELDS {
            assert!(fields.contains(&name), "missing violation for {}", name);
        }
        assert_eq!(fields[0], "firstName");
        assert_eq!(*fields.last().unwrap(), "message");
    }

    #[test]
    fn test_invalid_email() {
        let mut body = valid_body();
        body["email"] = json!("jane.example.com");
        let request: CreateQuoteRequest = serde_json::from_value(body).unwrap();
        let violations = request.into_quote_request().unwrap_err();
        assert_eq!(violations, vec![FieldViolation::new("email", "Email must be a valid email address")]);
    }

    #[test]
    fn test_blank_email_reports_one_violation() {
        for blank in ["", "   "] {
            let mut body = valid_body();
            body["email"] = json!(blank);
            let request: CreateQuoteRequest = serde_json::from_value(body).unwrap();
            let violations = request.into_quote_request().unwrap_err();
            assert_eq!(violations, vec![FieldViolation::new("email", "Email is required")]);
        }
    }

    #[test]
    fn test_email_that_normalizes_to_nothing() {
        let mut body = valid_body();
        body["email"] = json!("+quotes@gmail.com");
        let request: CreateQuoteRequest = serde_json::from_value(body).unwrap();
        let violations = request.into_quote_request().unwrap_err();
        assert_eq!(violations[0].field, "email");
    }

    #[test]
    fn test_non_string_field_is_rejected() {
        let mut body = valid_body();
        body["zipCode"] = json!(10115);
        assert!(serde_json::from_value::<CreateQuoteRequest>(body).is_err());
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("first_name"), "firstName");
        assert_eq!(camel_case("zipCode"), "zipCode");
        assert_eq!(camel_case("email"), "email");
    }

    #[test]
    fn test_response_dto_uses_hex_id() {
        let request: CreateQuoteRequest = serde_json::from_value(valid_body()).unwrap();
        let mut record = request.into_quote_request().unwrap();
        let id = bson::oid::ObjectId::new();
        record.id = Some(id);
        let dto = QuoteRequestResponseDto::from(record);
        assert_eq!(dto.id, Some(id.to_hex()));
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["id"], id.to_hex());
    }
}
