//! Realistic replacements for usernames, email addresses and home paths.
//!
//! Every generator is deterministic for a given seed and caches its
//! answers, so one original keeps one replacement for the whole run.
//! Replacements are drawn from word pools rather than hashes so that the
//! redacted output still reads like real data.

mod pools;

use crate::seeded::seeded_hash;
use once_cell::sync::Lazy;
use pools::{DOMAIN_WORDS, FIRST_NAMES, FOLDER_NAMES, LAST_NAMES, TLDS};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Attempts at a fresh pool combination before falling back to a suffix.
const MAX_ATTEMPTS: u64 = 64;

/// Home-directory path: prefix, user segment, remainder.
static HOME_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(/home/|/Users/|C:\\Users\\)([^/\\]+)(.*)$").unwrap());

fn pick<'a>(pool: &[&'a str], hash: u128) -> &'a str {
    pool[(hash % pool.len() as u128) as usize]
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Generator of plausible, consistent replacement values.
#[derive(Debug, Clone)]
pub struct RealisticDataGenerator {
    seed: u64,
    usernames: HashMap<String, String>,
    used_usernames: HashSet<String>,
    emails: HashMap<String, String>,
    domains: HashMap<String, String>,
    used_domains: HashSet<String>,
    folders: HashMap<String, String>,
    used_folders: HashSet<String>,
    /// Folder pool in seed-derived assignment order.
    folder_order: Vec<&'static str>,
    folder_cursor: usize,
    combined_cursor: usize,
}

impl RealisticDataGenerator {
    pub fn new(seed: u64) -> Self {
        let mut folder_order = FOLDER_NAMES.to_vec();
        folder_order.shuffle(&mut StdRng::seed_from_u64(seed));

        Self {
            seed,
            usernames: HashMap::new(),
            used_usernames: HashSet::new(),
            emails: HashMap::new(),
            domains: HashMap::new(),
            used_domains: HashSet::new(),
            folders: HashMap::new(),
            used_folders: HashSet::new(),
            folder_order,
            folder_cursor: 0,
            combined_cursor: 0,
        }
    }

    /// Plausible handle for `original`, keeping its `.` or `_` separator.
    pub fn generate_username(&mut self, original: &str) -> String {
        if original.is_empty() {
            return String::new();
        }
        if let Some(hit) = self.usernames.get(original) {
            return hit.clone();
        }

        let separator = original.chars().find(|c| *c == '.' || *c == '_');
        let mut attempt = 0;
        let handle = loop {
            let h = seeded_hash(self.seed, &["username", original], attempt);
            let first = pick(FIRST_NAMES, h);
            let last = pick(LAST_NAMES, h >> 64);
            let candidate = match separator {
                Some(sep) => format!("{}{}{}", first, sep, last),
                None => format!("{}{}", first, last),
            };
            attempt += 1;

            if !self.used_usernames.contains(&candidate) && !candidate.eq_ignore_ascii_case(original)
            {
                break candidate;
            }
            if attempt >= MAX_ATTEMPTS {
                // Suffix grows with every assignment, so it cannot repeat.
                break format!("{}{}", candidate, self.used_usernames.len());
            }
        };

        self.used_usernames.insert(handle.clone());
        self.usernames.insert(original.to_string(), handle.clone());
        handle
    }

    /// Replacement email, or `original` unchanged when it has no `@`.
    pub fn generate_email(&mut self, original: &str) -> String {
        let Some((local, domain)) = original.split_once('@') else {
            return original.to_string();
        };
        if let Some(hit) = self.emails.get(original) {
            return hit.clone();
        }

        let local = self.generate_username(local);
        let domain = self.generate_domain(domain);
        let email = format!("{}@{}", local, domain);
        self.emails.insert(original.to_string(), email.clone());
        email
    }

    fn generate_domain(&mut self, original: &str) -> String {
        let key = original.to_ascii_lowercase();
        if let Some(hit) = self.domains.get(&key) {
            return hit.clone();
        }

        let mut attempt = 0;
        let domain = loop {
            let h = seeded_hash(self.seed, &["domain", &key], attempt);
            let word = pick(DOMAIN_WORDS, h);
            let tld = pick(TLDS, h >> 64);
            let candidate = format!("{}{}", word, tld);
            attempt += 1;

            if !self.used_domains.contains(&candidate) && candidate != key {
                break candidate;
            }
            if attempt >= MAX_ATTEMPTS {
                break format!("{}{}{}", word, self.used_domains.len(), tld);
            }
        };

        self.used_domains.insert(domain.clone());
        self.domains.insert(key, domain.clone());
        domain
    }

    /// Replace the user segment of a home-directory path.
    ///
    /// Paths outside `/home/`, `/Users/` and `C:\Users\` are returned as-is.
    pub fn generate_path(&mut self, original: &str) -> String {
        let Some(caps) = HOME_PATH.captures(original) else {
            return original.to_string();
        };
        let prefix = &caps[1];
        let folder = self.generate_user_folder(&caps[2]);
        let folder = if prefix.contains('\\') {
            capitalize(&folder)
        } else {
            folder
        };
        format!("{}{}{}", prefix, folder, &caps[3])
    }

    /// Folder name for `original`, assigned in seed-derived pool order.
    ///
    /// After the pool is used up, new originals get two pool names joined.
    pub fn generate_user_folder(&mut self, original: &str) -> String {
        if original.is_empty() {
            return String::new();
        }
        if let Some(hit) = self.folders.get(original) {
            return hit.clone();
        }

        let folder = self.next_folder_name(original);
        self.used_folders.insert(folder.clone());
        self.folders.insert(original.to_string(), folder.clone());
        folder
    }

    fn next_folder_name(&mut self, original: &str) -> String {
        while let Some(name) = self.folder_order.get(self.folder_cursor) {
            self.folder_cursor += 1;
            if !name.eq_ignore_ascii_case(original) {
                return name.to_string();
            }
        }

        let n = self.folder_order.len();
        loop {
            let k = self.combined_cursor;
            self.combined_cursor += 1;
            let first = self.folder_order[k % n];
            let second = self.folder_order[(k / n) % n];
            if first == second {
                continue;
            }
            let round = k / (n * n);
            let candidate = if round == 0 {
                format!("{}{}", first, second)
            } else {
                format!("{}{}{}", first, second, round)
            };
            if !self.used_folders.contains(&candidate) && !candidate.eq_ignore_ascii_case(original)
            {
                return candidate;
            }
        }
    }

    /// Dispatch on the value's shape: email, then path, then username.
    pub fn generate_replacement(&mut self, original: &str) -> String {
        if original.contains('@') {
            self.generate_email(original)
        } else if original.contains('/') || original.contains('\\') {
            self.generate_path(original)
        } else {
            self.generate_username(original)
        }
    }

    /// Forget all assignments and rewind the folder pool.
    pub fn clear_cache(&mut self) {
        self.usernames.clear();
        self.used_usernames.clear();
        self.emails.clear();
        self.domains.clear();
        self.used_domains.clear();
        self.folders.clear();
        self.used_folders.clear();
        self.folder_cursor = 0;
        self.combined_cursor = 0;
    }
}
