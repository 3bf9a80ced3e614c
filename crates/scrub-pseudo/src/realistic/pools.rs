//! Word pools for realistic replacements.

pub(crate) const FIRST_NAMES: &[&str] = &[
    "maria", "james", "sofia", "daniel", "lucia", "thomas", "amara", "kenji", "olga", "samir",
    "helena", "marco", "isabel", "viktor", "leila", "pedro", "anika", "tobias", "chloe", "rafael",
    "yara", "felix", "nora", "andre", "mei", "lukas", "ines", "omar", "clara", "ravi",
];

pub(crate) const LAST_NAMES: &[&str] = &[
    "garcia", "novak", "schmidt", "okafor", "tanaka", "larsen", "moreno", "kowalski", "dubois",
    "rossi", "nguyen", "fischer", "haddad", "jensen", "silva", "petrov", "kaur", "walsh", "ito",
    "bauer", "costa", "lindgren", "mendes", "varga", "obrien", "castillo", "weiss", "sato",
];

/// Names used for home-directory folders; kept apart from the handle pools
/// so folder assignment order does not depend on username traffic.
pub(crate) const FOLDER_NAMES: &[&str] = &[
    "emma", "liam", "olivia", "noah", "ava", "elias", "mila", "hugo", "zoe", "arthur", "luna",
    "oscar", "alma", "theo", "ida", "leon", "vera", "milo", "rosa", "adam", "elsa", "jonah",
    "nina", "sami",
];

pub(crate) const DOMAIN_WORDS: &[&str] = &[
    "northwind", "bluepeak", "riverside", "ironleaf", "silverline", "greenfield", "brightwave",
    "stonebridge", "oakmont", "clearwater", "redwood", "sunhaven", "lakeshore", "highgate",
    "meadowbrook", "fairview",
];

pub(crate) const TLDS: &[&str] = &[".com", ".org", ".net", ".io"];
