//! Placeholder tokens usable inside generator patterns.
//!
//! `{users}`, `{emails}` and `{names}` stand for one value drawn from a
//! curated pool. They let a pattern such as `{users}@corp\.example` produce
//! realistic output instead of random letters.

/// A placeholder token recognized by the pattern parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Users,
    Emails,
    Names,
}

const USERS: &[&str] = &[
    "alice", "bruno", "carmen", "dmitri", "elena", "farid", "greta", "hiro", "ingrid", "jonas",
    "keiko", "lars", "mariana", "nadia", "oliver", "priya", "quentin", "rosa", "stefan", "tamara",
    "ulrich", "valeria", "wesley", "ximena", "yusuf", "zora",
];

const EMAILS: &[&str] = &[
    "alice.moreau@example.com",
    "bruno.keller@example.org",
    "carmen.ortiz@example.net",
    "dmitri.volkov@example.com",
    "elena.rossi@example.io",
    "farid.haddad@example.org",
    "greta.lindqvist@example.com",
    "hiro.tanaka@example.net",
    "ingrid.berg@example.io",
    "jonas.weber@example.com",
    "keiko.sato@example.org",
    "lars.nilsen@example.net",
    "mariana.silva@example.com",
    "nadia.petrova@example.io",
    "oliver.grant@example.org",
    "priya.raman@example.com",
];

const NAMES: &[&str] = &[
    "Alice Moreau",
    "Bruno Keller",
    "Carmen Ortiz",
    "Dmitri Volkov",
    "Elena Rossi",
    "Farid Haddad",
    "Greta Lindqvist",
    "Hiro Tanaka",
    "Ingrid Berg",
    "Jonas Weber",
    "Keiko Sato",
    "Lars Nilsen",
    "Mariana Silva",
    "Nadia Petrova",
    "Oliver Grant",
    "Priya Raman",
];

impl Placeholder {
    pub const ALL: &'static [Placeholder] =
        &[Placeholder::Users, Placeholder::Emails, Placeholder::Names];

    /// The token as written in a pattern, braces included.
    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::Users => "{users}",
            Placeholder::Emails => "{emails}",
            Placeholder::Names => "{names}",
        }
    }

    /// Parse the name between the braces.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "users" => Some(Placeholder::Users),
            "emails" => Some(Placeholder::Emails),
            "names" => Some(Placeholder::Names),
            _ => None,
        }
    }

    /// The pool of values this placeholder is replaced with.
    pub fn values(&self) -> &'static [&'static str] {
        match self {
            Placeholder::Users => USERS,
            Placeholder::Emails => EMAILS,
            Placeholder::Names => NAMES,
        }
    }

    /// Non-capturing alternation of the escaped pool values.
    pub fn as_regex(&self) -> String {
        let alternatives: Vec<String> = self.values().iter().map(|v| regex::escape(v)).collect();
        format!("(?:{})", alternatives.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pools_are_not_numeric() {
        for placeholder in Placeholder::ALL {
            for value in placeholder.values() {
                assert!(!value.chars().all(|c| c.is_ascii_digit()), "{}", value);
            }
        }
    }

    #[test]
    fn test_regex_matches_pool_only() {
        let re = regex::Regex::new(&format!("^{}$", Placeholder::Users.as_regex())).unwrap();
        assert!(re.is_match("alice"));
        assert!(!re.is_match("alice2"));
        assert!(!re.is_match("{users}"));
    }

    #[test]
    fn test_token_round_trip() {
        for placeholder in Placeholder::ALL {
            let name = placeholder.token().trim_matches(|c| c == '{' || c == '}');
            assert_eq!(Placeholder::from_name(name), Some(*placeholder));
        }
    }
}
