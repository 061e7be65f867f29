use crate::models::Tier;
use url::Url;

const TIER_1: &[&str] = &[
    "reuters.com",
    "apnews.com",
    "ap.org",
    "bbc.com",
    "bbc.co.uk",
    "npr.org",
    "pbs.org",
    "afp.com",
    "factcheck.org",
    "snopes.com",
    "politifact.com",
    "fullfact.org",
    "nature.com",
    "science.org",
    "nejm.org",
    "thelancet.com",
];

const TIER_2: &[&str] = &[
    "cnn.com",
    "nytimes.com",
    "washingtonpost.com",
    "wsj.com",
    "theguardian.com",
    "economist.com",
    "ft.com",
    "bloomberg.com",
    "time.com",
    "newsweek.com",
];

const TIER_3: &[&str] = &[
    "foxnews.com",
    "breitbart.com",
    "huffpost.com",
    "vox.com",
    "reason.com",
    "libertarianism.org",
];

/// Public-institution suffixes ranked with the major outlets.
const TIER_2_SUFFIXES: &[&str] = &[".gov", ".edu", ".int", ".gov.uk", ".ac.uk"];

/// Maps a source domain to its reliability tier. Total and side-effect free.
pub fn tier_of(domain: &str) -> Tier {
    let domain = normalize_domain(domain);
    if domain.is_empty() {
        return Tier::Unranked;
    }
    if matches_any(&domain, TIER_1) {
        Tier::Tier1
    } else if matches_any(&domain, TIER_2)
        || TIER_2_SUFFIXES.iter().any(|suffix| domain.ends_with(suffix))
    {
        Tier::Tier2
    } else if matches_any(&domain, TIER_3) {
        Tier::Tier3
    } else {
        Tier::Unranked
    }
}

/// Host of `url` with any `www.` prefix removed; empty when the URL has no host.
pub fn domain_of(url: &Url) -> String {
    url.host_str().map(normalize_domain).unwrap_or_default()
}

fn normalize_domain(raw: &str) -> String {
    let lowered = raw.trim().trim_end_matches('.').to_lowercase();
    lowered
        .strip_prefix("www.")
        .map(str::to_string)
        .unwrap_or(lowered)
}

/// Exact match or subdomain match (`edition.cnn.com` matches `cnn.com`).
fn matches_any(domain: &str, table: &[&str]) -> bool {
    table.iter().any(|known| {
        domain == *known
            || domain
                .strip_suffix(known)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_domains_map_to_their_tier() {
        assert_eq!(tier_of("reuters.com"), Tier::Tier1);
        assert_eq!(tier_of("www.nytimes.com"), Tier::Tier2);
        assert_eq!(tier_of("foxnews.com"), Tier::Tier3);
    }

    #[test]
    fn subdomains_inherit_the_tier() {
        assert_eq!(tier_of("edition.cnn.com"), Tier::Tier2);
        assert_eq!(tier_of("uk.reuters.com"), Tier::Tier1);
    }

    #[test]
    fn lookalike_domains_do_not_match() {
        assert_eq!(tier_of("notreuters.com"), Tier::Unranked);
        assert_eq!(tier_of("reuters.com.evil.net"), Tier::Unranked);
    }

    #[test]
    fn institution_suffixes_rank_as_tier_2() {
        assert_eq!(tier_of("cdc.gov"), Tier::Tier2);
        assert_eq!(tier_of("stats.ox.ac.uk"), Tier::Tier2);
    }

    #[test]
    fn unknown_and_empty_domains_are_unranked() {
        assert_eq!(tier_of("myblog.example"), Tier::Unranked);
        assert_eq!(tier_of(""), Tier::Unranked);
    }

    #[test]
    fn lookup_is_repeatable() {
        for domain in ["apnews.com", "vox.com", "unknown.io"] {
            assert_eq!(tier_of(domain), tier_of(domain));
        }
    }

    #[test]
    fn domain_strips_www_and_case() {
        let url = Url::parse("https://WWW.BBC.com/news/1").expect("static url");
        assert_eq!(domain_of(&url), "bbc.com");
    }
}
