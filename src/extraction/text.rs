use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::schema::models::Node;
use crate::safe_truncate_ellipsis;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[\p{L}\p{N}'-]+").expect("word pattern is valid");

    pub static ref STOPWORDS: HashSet<&'static str> = [
        // articles, determiners, pronouns
        "a", "an", "the", "this", "that", "these", "those", "it", "its", "it's", "they",
        "them", "their", "theirs", "we", "us", "our", "you", "your", "he", "him", "his",
        "she", "her", "hers", "i", "me", "my", "who", "whom", "whose", "which", "what",
        "each", "every", "some", "any", "all", "both", "either", "neither", "another",
        "other", "others", "such", "own", "same", "one", "ones",
        // prepositions and conjunctions
        "of", "in", "on", "at", "by", "for", "with", "about", "against", "between",
        "into", "through", "during", "before", "after", "above", "below", "to", "from",
        "up", "down", "out", "off", "over", "under", "again", "further", "and", "but",
        "or", "nor", "so", "yet", "if", "because", "as", "until", "while", "than",
        "then", "once", "when", "where", "why", "how", "whether", "although", "though",
        "unless", "since", "via", "per", "upon", "within", "without", "across", "among",
        "around", "toward", "towards", "onto", "like",
        // auxiliaries and modals
        "is", "are", "was", "were", "be", "been", "being", "am", "have", "has", "had",
        "having", "do", "does", "did", "doing", "done", "can", "could", "will", "would",
        "shall", "should", "may", "might", "must", "isn't", "aren't", "wasn't", "don't",
        "doesn't", "didn't", "can't", "won't",
        // generic verbs that carry little topical meaning
        "study", "studies", "use", "uses", "used", "using", "make", "makes", "made",
        "show", "shows", "shown", "get", "gets", "got", "give", "gives", "given",
        "take", "takes", "took", "help", "helps", "allow", "allows", "need", "needs",
        "become", "becomes", "seem", "seems", "provide", "provides", "describe",
        "describes", "explain", "explains", "involve", "involves", "include",
        "includes", "contain", "contains", "lead", "leads", "cause", "causes",
        // adverbs and fillers
        "not", "no", "only", "very", "too", "also", "just", "more", "most", "less",
        "much", "many", "few", "several", "well", "even", "still", "often", "always",
        "never", "here", "there", "now", "however", "therefore", "thus", "hence",
        "first", "second", "next", "finally", "last", "ie", "eg", "etc",
    ]
    .into_iter()
    .collect();
}


pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Splits on sentence-terminal punctuation, keeping the terminator and dropping empty segments.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if c == '.' || c == '!' || c == '?' {
            let end = i + c.len_utf8();
            let sentence = text[start..end].trim();
            if has_content(sentence) {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let remaining = text[start..].trim();
    if has_content(remaining) {
        sentences.push(remaining);
    }

    sentences
}

fn has_content(segment: &str) -> bool {
    segment.chars().any(char::is_alphanumeric)
}

/// Lowercased words of at least two characters; apostrophes and hyphens are kept inside words.
pub fn tokenize(sentence: &str) -> Vec<String> {
    let lower = sentence.to_lowercase();
    WORD.find_iter(&lower)
        .map(|m| m.as_str().trim_matches(|c: char| c == '\'' || c == '-'))
        .filter(|w| w.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

/// Maximal runs of non-stopword tokens.
pub fn candidate_phrases(tokens: &[String]) -> Vec<Vec<String>> {
    let mut phrases = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for token in tokens {
        if is_stopword(token) {
            if !current.is_empty() {
                phrases.push(std::mem::take(&mut current));
            }
        } else {
            current.push(token.clone());
        }
    }
    if !current.is_empty() {
        phrases.push(current);
    }

    phrases
}

/// Single-node stand-in for non-empty text that yielded no candidates.
pub fn fallback_node(text: &str) -> Node {
    let label = safe_truncate_ellipsis(text.trim(), 40);
    Node::new("n0", label)
        .with_details("No salient phrases found")
        .with_weight(1.0)
}


pub fn node_id(index: usize) -> String {
    format!("n{index}")
}
