use uuid::Uuid;

/// Opaque payment reference: a v4 UUID as 32 lowercase hex characters.
pub fn new_reference() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::new_reference;

    #[test]
    fn reference_is_dashless_hex() {
        let r = new_reference();
        assert_eq!(r.len(), 32);
        assert!(r.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(r, new_reference());
    }
}
