//! Demonstration articles shown when a feed cannot be fetched or parsed.

use crate::normalize::format_timestamp;
use crate::types::{Article, Category, FeedDescriptor};
use chrono::{DateTime, Duration, Utc};

struct FallbackEntry {
    title: &'static str,
    link: &'static str,
    description: &'static str,
    days_ago: i64,
}

const CERT_ENTRIES: &[FallbackEntry] = &[
    FallbackEntry {
        title: "Alerte CERT-FR : Vulnérabilités critiques dans les solutions VPN",
        link: "https://www.cert.ssi.gouv.fr/",
        description: "Le CERT-FR publie un avis concernant des vulnérabilités critiques affectant plusieurs solutions VPN largement déployées.",
        days_ago: 0,
    },
    FallbackEntry {
        title: "Campagne de cyberattaques ciblant le secteur santé",
        link: "https://www.cert.ssi.gouv.fr/",
        description: "Alerte sur une campagne d'attaques par ransomware visant spécifiquement les établissements de santé français.",
        days_ago: 2,
    },
];

const ANSSI_ENTRIES: &[FallbackEntry] = &[
    FallbackEntry {
        title: "L'ANSSI lance un nouveau référentiel de sécurité cloud",
        link: "https://www.ssi.gouv.fr/",
        description: "Publication du référentiel SecNumCloud 3.5 avec de nouvelles exigences pour la souveraineté numérique.",
        days_ago: 0,
    },
    FallbackEntry {
        title: "Campagne de sensibilisation aux rançongiciels",
        link: "https://www.ssi.gouv.fr/",
        description: "L'ANSSI intensifie sa campagne de formation pour prévenir les attaques par rançongiciels dans les PME.",
        days_ago: 5,
    },
];

/// Fallback set for the descriptor's category, dated relative to `now`.
/// Categories without demonstration content yield nothing.
pub fn fallback_articles(feed: &FeedDescriptor, now: DateTime<Utc>) -> Vec<Article> {
    let entries = match feed.category {
        Category::Cert => CERT_ENTRIES,
        Category::Anssi => ANSSI_ENTRIES,
        _ => &[],
    };

    entries
        .iter()
        .map(|entry| Article {
            title: entry.title.to_string(),
            link: entry.link.to_string(),
            description: entry.description.to_string(),
            published: format_timestamp(&(now - Duration::days(entry.days_ago))),
            source_name: feed.name.clone(),
            category: feed.category.clone(),
        })
        .collect()
}
