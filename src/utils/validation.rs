use regex::Regex;

pub fn validate_email(email: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    re.is_match(email)
}

pub fn validate_username(username: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_]{3,30}$").unwrap();
    re.is_match(username)
}

pub fn validate_password(password: &str) -> bool {
    password.len() >= 8
}

pub fn generate_otp() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let otp: u32 = rng.gen_range(100000..999999);
    otp.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_emails() {
        assert!(validate_email("buyer@example.com"));
        assert!(validate_email("some.seller+tag@mail.co.uk"));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("missing@tld"));
        assert!(!validate_email("@example.com"));
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("freelancer_42"));
        assert!(!validate_username("ab"));
        assert!(!validate_username("has spaces"));
        assert!(!validate_username("way_too_long_username_over_thirty_chars"));
    }

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..32 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
