//! Canonical form for submitter email addresses.
//!
//! Addresses are lowercased and provider specific aliases are folded so the
//! same mailbox is always stored the same way: Gmail ignores dots and `+tag`
//! suffixes, Outlook/iCloud ignore `+tag`, Yahoo ignores `-tag`.

const GMAIL_DOMAINS: &[&str] = &["gmail.com", "googlemail.com"];

const OUTLOOK_DOMAINS: &[&str] = &[
    "hotmail.at", "hotmail.be", "hotmail.ca", "hotmail.cl", "hotmail.co.il", "hotmail.co.nz",
    "hotmail.co.th", "hotmail.co.uk", "hotmail.com", "hotmail.com.ar", "hotmail.com.au",
    "hotmail.com.br", "hotmail.com.gr", "hotmail.com.mx", "hotmail.com.pe", "hotmail.com.tr",
    "hotmail.com.vn", "hotmail.cz", "hotmail.de", "hotmail.dk", "hotmail.es", "hotmail.fr",
    "hotmail.hu", "hotmail.id", "hotmail.ie", "hotmail.in", "hotmail.it", "hotmail.jp",
    "hotmail.kr", "hotmail.lv", "hotmail.my", "hotmail.ph", "hotmail.pt", "hotmail.sa",
    "hotmail.sg", "hotmail.sk", "live.be", "live.co.uk", "live.com", "live.com.ar",
    "live.com.mx", "live.de", "live.es", "live.eu", "live.fr", "live.it", "live.nl", "msn.com",
    "outlook.at", "outlook.be", "outlook.cl", "outlook.co.il", "outlook.co.nz", "outlook.co.th",
    "outlook.com", "outlook.com.ar", "outlook.com.au", "outlook.com.br", "outlook.com.gr",
    "outlook.com.pe", "outlook.com.tr", "outlook.com.vn", "outlook.cz", "outlook.de",
    "outlook.dk", "outlook.es", "outlook.fr", "outlook.hu", "outlook.id", "outlook.ie",
    "outlook.in", "outlook.it", "outlook.jp", "outlook.kr", "outlook.lv", "outlook.my",
    "outlook.ph", "outlook.pt", "outlook.sa", "outlook.sg", "outlook.sk", "passport.com",
];

const YAHOO_DOMAINS: &[&str] = &[
    "rocketmail.com", "yahoo.ca", "yahoo.co.uk", "yahoo.com", "yahoo.de", "yahoo.fr",
    "yahoo.in", "yahoo.it", "ycorp.com", "ymail.com", "y7mail.com",
];

const ICLOUD_DOMAINS: &[&str] = &["icloud.com", "me.com", "mac.com"];

/// Normalize an already format-checked address.
///
/// Returns `None` when the address has no `@` or when folding leaves the
/// local part empty (for example `+tag@gmail.com`).
pub fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let (local, domain) = trimmed.rsplit_once('@')?;
    let mut local = local.to_lowercase();
    let mut domain = domain.to_lowercase();

    if GMAIL_DOMAINS.contains(&domain.as_str()) {
        local = strip_subaddress(&local, '+').replace('.', "");
        domain = "gmail.com".to_string();
    } else if OUTLOOK_DOMAINS.contains(&domain.as_str()) || ICLOUD_DOMAINS.contains(&domain.as_str()) {
        local = strip_subaddress(&local, '+');
    } else if YAHOO_DOMAINS.contains(&domain.as_str()) {
        local = strip_last_subaddress(&local, '-');
    }

    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some(format!("{}@{}", local, domain))
}

fn strip_subaddress(local: &str, separator: char) -> String {
    match local.split_once(separator) {
        Some((mailbox, _)) => mailbox.to_string(),
        None => local.to_string(),
    }
}

fn strip_last_subaddress(local: &str, separator: char) -> String {
    match local.rsplit_once(separator) {
        Some((mailbox, _)) => mailbox.to_string(),
        None => local.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_generic_addresses() {
        assert_eq!(
            normalize_email("Jane.Doe@Example.COM"),
            Some("jane.doe@example.com".to_string())
        );
        assert_eq!(
            normalize_email("  jane+sales@example.com "),
            Some("jane+sales@example.com".to_string())
        );
    }

    #[test]
    fn test_gmail_folding() {
        assert_eq!(
            normalize_email("Jane.Doe+quotes@GoogleMail.com"),
            Some("janedoe@gmail.com".to_string())
        );
        assert_eq!(normalize_email("j.a.n.e@gmail.com"), Some("jane@gmail.com".to_string()));
    }

    #[test]
    fn test_outlook_and_icloud_subaddress() {
        assert_eq!(
            normalize_email("Jane.Doe+work@Outlook.com"),
            Some("jane.doe@outlook.com".to_string())
        );
        assert_eq!(normalize_email("jane+x@me.com"), Some("jane@me.com".to_string()));
    }

    #[test]
    fn test_yahoo_subaddress() {
        assert_eq!(
            normalize_email("jane-doe-quotes@yahoo.com"),
            Some("jane-doe@yahoo.com".to_string())
        );
    }

    #[test]
    fn test_rejects_empty_local_part() {
        assert_eq!(normalize_email("+tag@gmail.com"), None);
        assert_eq!(normalize_email("...@gmail.com"), None);
        assert_eq!(normalize_email("no-at-sign"), None);
    }
}
