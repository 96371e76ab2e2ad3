//! Word lists behind the placeholder and apology rules.

/// Case-sensitive markers; matched as substrings.
pub const PLACEHOLDER_MARKERS: &[&str] = &["TODO", "FIXME", "TBD"];

/// Case-insensitive phrases that stand in for content instead of being content.
pub const PLACEHOLDER_PHRASES: &[&str] = &[
    "implementation details here",
    "your code here",
    "insert code here",
    "add logic here",
    "rest of the code",
    "rest of the implementation",
    "remaining implementation",
    "<placeholder>",
    "lorem ipsum",
];

/// Case-insensitive; matched on word boundaries.
pub const APOLOGY_PHRASES: &[&str] = &[
    "i apologize",
    "i apologise",
    "apologies",
    "sorry",
    "as an ai",
    "as a language model",
    "i cannot",
    "i can't",
    "i can not",
    "i am unable",
    "i'm unable",
    "unfortunately, i",
    "unfortunately i",
    "my mistake",
    "my bad",
];
