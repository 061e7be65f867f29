use crate::models::FallacyMatch;
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::Path;

const EXCERPT_RADIUS: usize = 60;

/// (name, definition, counterpoint, patterns)
const BUILTIN: &[(&str, &str, &str, &[&str])] = &[
    (
        "Appeal to fear",
        "Uses alarming language about consequences to win agreement instead of evidence.",
        "The outlet may be relaying a genuine, documented risk in urgent terms.",
        &[
            r"\bcatastroph\w*",
            r"\bdisaster\b",
            r"\bwill (?:destroy|devastate|ruin)\b",
            r"\bterrifying\b",
            r"\bexistential threat\b",
        ],
    ),
    (
        "Appeal to authority",
        "Treats an unnamed or generic authority as proof in place of the evidence itself.",
        "Citing expert consensus is reasonable shorthand when the underlying sources are public.",
        &[
            r"\bexperts (?:say|agree|warn)\b",
            r"\bscientists (?:say|agree)\b",
            r"\bstudies show\b",
        ],
    ),
    (
        "Bandwagon",
        "Argues something is true or right because many people believe or do it.",
        "Reporting broad public sentiment can be newsworthy in its own right.",
        &[
            r"\beveryone (?:knows|agrees|is)\b",
            r"\bmost people (?:agree|believe|think)\b",
            r"\bmillions of (?:people|americans|voters) (?:agree|believe)\b",
        ],
    ),
    (
        "Hasty generalization",
        "Draws a sweeping conclusion from a small or unrepresentative sample.",
        "Absolute phrasing may be rhetorical emphasis rather than a literal universal claim.",
        &[
            r"\ball (?:of them|\w+s) are\b",
            r"\bnone of them\b",
            r"\bevery single\b",
        ],
    ),
    (
        "False dilemma",
        "Presents two options as the only possibilities when more exist.",
        "In some decisions the practical choices genuinely are narrowed to two.",
        &[
            r"\beither\b[^.]{1,80}\bor else\b",
            r"\bthe only (?:option|choice|alternative)\b",
            r"\bno other (?:option|choice)\b",
        ],
    ),
    (
        "Slippery slope",
        "Claims one step will inevitably trigger a chain of extreme consequences.",
        "Some policy chains are well documented, so the warning may rest on precedent.",
        &[
            r"\bwill inevitably\b",
            r"\bslippery slope\b",
            r"\bopen the floodgates\b",
        ],
    ),
    (
        "Ad hominem",
        "Attacks the person making an argument rather than the argument.",
        "Character can be relevant when the story concerns the person's own conduct.",
        &[
            r"\b(?:idiot|moron|liar|crook|clown)s?\b",
            r"\bso-called expert\b",
        ],
    ),
    (
        "Anonymous sourcing",
        "Rests key assertions on sources readers cannot identify or evaluate.",
        "Anonymity is sometimes the only way to report on sensitive matters safely.",
        &[
            r"\bsources (?:say|said|familiar)\b",
            r"\bpeople familiar with\b",
            r"\bspeaking on condition of anonymity\b",
        ],
    ),
    (
        "Loaded language",
        "Uses emotionally charged wording that presumes a conclusion.",
        "Vivid wording can accurately describe events that really were extreme.",
        &[
            r"\bshocking\b",
            r"\boutrageous\b",
            r"\bslams?\b",
            r"\bblasts?\b",
            r"\bbombshell\b",
        ],
    ),
];

#[derive(Debug, Clone)]
pub struct FallacyEntry {
    pub name: String,
    pub definition: String,
    pub counterpoint: String,
    patterns: Vec<Regex>,
}

impl FallacyEntry {
    pub fn new(name: &str, definition: &str, counterpoint: &str, patterns: &[&str]) -> Self {
        let mut compiled: Vec<Regex> = patterns
            .iter()
            .filter_map(|p| match compile(p) {
                Ok(re) => Some(re),
                Err(err) => {
                    tracing::warn!(fallacy = name, pattern = p, error = %err, "skipping invalid pattern");
                    None
                }
            })
            .collect();
        if compiled.is_empty() {
            if let Ok(re) = compile(&regex::escape(name)) {
                compiled.push(re);
            }
        }
        Self {
            name: name.to_string(),
            definition: definition.to_string(),
            counterpoint: counterpoint.to_string(),
            patterns: compiled,
        }
    }

    fn scan(&self, text: &str) -> Option<FallacyMatch> {
        let mut hits = 0;
        let mut first: Option<(usize, usize)> = None;
        for re in &self.patterns {
            for m in re.find_iter(text) {
                hits += 1;
                if first.map_or(true, |(start, _)| m.start() < start) {
                    first = Some((m.start(), m.end()));
                }
            }
        }
        let (start, end) = first?;
        Some(FallacyMatch {
            name: self.name.clone(),
            definition: self.definition.clone(),
            counterpoint: self.counterpoint.clone(),
            hits,
            excerpt: excerpt(text, start, end),
        })
    }
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn excerpt(text: &str, start: usize, end: usize) -> String {
    let mut from = start.saturating_sub(EXCERPT_RADIUS);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + EXCERPT_RADIUS).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    text[from..to].split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Static reference list of fallacies and red flags, matched against article text.
#[derive(Debug, Clone)]
pub struct FallacyKnowledgeBase {
    entries: Vec<FallacyEntry>,
}

impl Default for FallacyKnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FallacyKnowledgeBase {
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(name, definition, counterpoint, patterns)| {
                    FallacyEntry::new(name, definition, counterpoint, patterns)
                })
                .collect(),
        }
    }

    pub fn from_entries(entries: Vec<FallacyEntry>) -> Self {
        Self { entries }
    }

    /// Reads `name|definition|counterpoint|pattern;pattern` lines; `#` starts a comment.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let mut parts = line.splitn(4, '|').map(str::trim);
                let name = parts.next().filter(|n| !n.is_empty())?;
                let definition = parts.next().unwrap_or_default();
                let counterpoint = parts.next().unwrap_or_default();
                let patterns: Vec<&str> = parts
                    .next()
                    .map(|raw| raw.split(';').map(str::trim).filter(|p| !p.is_empty()).collect())
                    .unwrap_or_default();
                Some(FallacyEntry::new(name, definition, counterpoint, &patterns))
            })
            .collect();
        Self::from_entries(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matches ordered by hit count, most frequent first; ties keep list order.
    pub fn scan(&self, text: &str) -> Vec<FallacyMatch> {
        let mut matches: Vec<FallacyMatch> =
            self.entries.iter().filter_map(|e| e.scan(text)).collect();
        matches.sort_by(|a, b| b.hits.cmp(&a.hits));
        matches
    }
}

/// Ethics narrative built from scan results.
pub fn narrative(matches: &[FallacyMatch]) -> String {
    let Some(top) = matches.first() else {
        return "1) Most impactful fallacy: None found\n\
                2) Why this could mislead readers: No pattern from the fallacy reference list \
                occurs in the article text.\n\
                3) Counterfactual/counterpoint: Absence of surface patterns does not rule out \
                subtler framing problems."
            .to_string();
    };

    let mut out = format!(
        "1) Most impactful fallacy: {} ({} occurrence{})\n\
         2) Why this could mislead readers: {} Example: \"{}\"\n\
         3) Counterfactual/counterpoint: {}",
        top.name,
        top.hits,
        if top.hits == 1 { "" } else { "s" },
        top.definition,
        top.excerpt,
        top.counterpoint
    );
    if matches.len() > 1 {
        let others: Vec<String> = matches[1..]
            .iter()
            .map(|m| format!("{} ({})", m.name, m.hits))
            .collect();
        out.push_str(&format!("\nOther signals: {}", others.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_list_loads_every_entry() {
        let kb = FallacyKnowledgeBase::builtin();
        assert_eq!(kb.len(), BUILTIN.len());
        assert!(kb.entries.iter().all(|e| !e.patterns.is_empty()));
    }

    #[test]
    fn scan_ranks_by_hits() {
        let kb = FallacyKnowledgeBase::builtin();
        let text = "A shocking, outrageous bombshell. Experts say it will be fine.";
        let matches = kb.scan(text);
        assert_eq!(matches[0].name, "Loaded language");
        assert_eq!(matches[0].hits, 3);
        assert!(matches.iter().any(|m| m.name == "Appeal to authority"));
    }

    #[test]
    fn clean_text_has_no_matches() {
        let kb = FallacyKnowledgeBase::builtin();
        assert!(kb.scan("The council met on Tuesday and approved the budget.").is_empty());
    }

    #[test]
    fn entries_built_in_code_scan_like_builtins() {
        let kb = FallacyKnowledgeBase::from_entries(vec![FallacyEntry::new(
            "Whataboutism",
            "Deflects criticism by pointing at someone else.",
            "Comparisons can be legitimate context.",
            &[r"\bwhat about\b"],
        )]);
        assert_eq!(kb.len(), 1);
        let matches = kb.scan("What about the other party? And what about last year?");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Whataboutism");
        assert_eq!(matches[0].hits, 2);
    }

    #[test]
    fn parse_reads_custom_entries_and_skips_comments() {
        let kb = FallacyKnowledgeBase::parse(
            "# name|definition|counterpoint|patterns\n\
             Straw man|Misrepresents an argument.|May be a fair summary.|\\bso you're saying\\b\n\
             Red herring|Distracts from the issue.||\n\
             |missing name|x|y\n",
        );
        assert_eq!(kb.len(), 2);
        let matches = kb.scan("So you're saying we should do nothing? What a red herring.");
        let names: Vec<_> = matches.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"Straw man"));
        assert!(names.contains(&"Red herring"));
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        let text = format!("{}shocking{}", "é".repeat(40), "ü".repeat(40));
        let matches = FallacyKnowledgeBase::builtin().scan(&text);
        assert!(matches[0].excerpt.contains("shocking"));
    }

    #[test]
    fn narrative_without_matches_says_none_found() {
        assert!(narrative(&[]).contains("None found"));
    }

    #[test]
    fn narrative_names_top_match_and_others() {
        let kb = FallacyKnowledgeBase::builtin();
        let text = "Shocking! Shocking! Sources say it will inevitably collapse.";
        let story = narrative(&kb.scan(text));
        assert!(story.starts_with("1) Most impactful fallacy: Loaded language (2 occurrences)"));
        assert!(story.contains("Other signals:"));
    }
}
