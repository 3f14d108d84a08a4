use crate::auth::password;

/// Request-scoped sanitizer chain over a single string value. One instance
/// per field; never shared.
#[derive(Debug, Clone)]
pub struct Sanitize(String);

impl Sanitize {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn trim(self) -> Self {
        Self(self.0.trim().to_string())
    }

    pub fn trim_start(self) -> Self {
        Self(self.0.trim_start().to_string())
    }

    pub fn trim_end(self) -> Self {
        Self(self.0.trim_end().to_string())
    }

    pub fn upper(self) -> Self {
        Self(self.0.to_uppercase())
    }

    pub fn lower(self) -> Self {
        Self(self.0.to_lowercase())
    }

    /// Uppercases the first letter of each word; the tail of every word is
    /// left untouched.
    pub fn capitalize(self) -> Self {
        let capitalized = self
            .0
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        Self(capitalized)
    }

    /// Terminal step for password fields: replaces the value with its hash.
    pub fn into_hash(self, cost: u32) -> anyhow::Result<String> {
        password::hash_password(&self.0, cost)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_variants() {
        assert_eq!(Sanitize::new("  jane  ").trim().into_inner(), "jane");
        assert_eq!(Sanitize::new("  jane  ").trim_start().into_inner(), "jane  ");
        assert_eq!(Sanitize::new("  jane  ").trim_end().into_inner(), "  jane");
    }

    #[test]
    fn case_conversions() {
        assert_eq!(Sanitize::new("Jane").upper().into_inner(), "JANE");
        assert_eq!(Sanitize::new("JANE@Example.COM").lower().into_inner(), "jane@example.com");
        assert_eq!(
            Sanitize::new("jane mary doe").capitalize().into_inner(),
            "Jane Mary Doe"
        );
    }

    #[test]
    fn capitalize_leaves_word_tails_alone() {
        assert_eq!(Sanitize::new("mcDonald").capitalize().into_inner(), "McDonald");
    }

    #[test]
    fn trim_and_case_are_idempotent() {
        let once = Sanitize::new("  jane doe  ").trim().capitalize().into_inner();
        let twice = Sanitize::new(once.clone()).trim().capitalize().into_inner();
        assert_eq!(once, twice);

        let once = Sanitize::new(" JANE@EXAMPLE.COM ").trim().lower().into_inner();
        let twice = Sanitize::new(once.clone()).trim().lower().into_inner();
        assert_eq!(once, twice);
    }
}
