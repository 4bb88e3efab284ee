//! Built-in English stopword list for the classic battery. The engine
//! takes any injected set; this is only the default one. Function words,
//! auxiliaries, and degree adverbs, all as lowercase surface forms.

use std::collections::HashSet;

pub const ENGLISH: &[&str] = &[
    "a", "about", "above", "after", "all", "along", "am", "amid", "among", "an", "and",
    "another", "any", "anybody", "anyone", "anyplace", "anything", "anytime", "anywhere",
    "are", "as", "at",
    "be", "been", "being", "both", "but", "by",
    "can", "cannot", "could",
    "different", "each", "either", "enough", "especially", "even", "every", "everybody",
    "everyday", "everyone", "everyplace", "everything", "everywhere",
    "for", "from",
    "get", "gets", "getting", "got", "gotten",
    "had", "has", "have", "having", "he", "her", "hers", "him", "his", "how",
    "i", "if", "in", "into", "is", "it", "its",
    "just",
    "least", "less", "like",
    "may", "me", "mere", "merely", "might", "mine", "minus", "more", "most", "much",
    "must", "my",
    "namely", "near", "need", "neither", "no", "not",
    "of", "off", "on", "only", "onto", "or", "ought", "our", "ours", "out", "over",
    "past", "per", "plus", "pretty",
    "quite", "rather", "right",
    "same", "seem", "seemed", "seeming", "seems", "shall", "she", "sheer", "should",
    "since", "so", "some", "somewhat", "sufficiently", "such",
    "that", "the", "their", "theirs", "them", "these", "they", "this", "those", "till",
    "to", "too",
    "under", "until", "up", "us",
    "via", "vs",
    "was", "we", "were", "what", "whatever", "when", "whenever", "where", "wherever",
    "whether", "which", "whichever", "who", "whoever", "whom", "whomever", "whose",
    "why", "will", "with", "would",
    "you", "your", "yours",
];

/// The built-in list as an owned set.
pub fn english() -> HashSet<String> {
    ENGLISH.iter().map(|word| (*word).to_string()).collect()
}
