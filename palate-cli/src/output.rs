/// Output formatting: terminal tables and JSON.
use palate_core::{NeighborCandidate, Observation, Profile, Recommendation, RecommendationSource};
use serde::Serialize;

#[derive(Serialize, Debug, PartialEq)]
struct JsonRecommendedItem {
    rank: usize,
    name: String,
    /// The active user's own CPI for the item, if they have seen it.
    your_cpi: Option<f64>,
}

#[derive(Serialize, Debug, PartialEq)]
struct JsonNeighbor {
    identity: String,
    distance: f64,
    shared_items: usize,
}

#[derive(Serialize, Debug, PartialEq)]
struct JsonRecommendation {
    user: String,
    source: &'static str,
    items: Vec<JsonRecommendedItem>,
    neighbors: Vec<JsonNeighbor>,
}

#[derive(Serialize, Debug, PartialEq)]
struct JsonAgreement {
    item: String,
    agreement: f64,
}

#[derive(Serialize, Debug, PartialEq)]
struct JsonComparison {
    user: String,
    peer: String,
    distance: f64,
    shared_items: usize,
    click_agreement: Vec<JsonAgreement>,
}

/// Summary of two profiles side by side, for `palate compare`.
pub struct ComparisonReport {
    pub user: String,
    pub peer: String,
    pub distance: f64,
    pub shared_items: usize,
    pub click_agreement: Vec<(String, f64)>,
}

fn source_label(source: RecommendationSource) -> &'static str {
    match source {
        RecommendationSource::Neighbors => "neighbors",
        RecommendationSource::Catalog => "catalog",
    }
}

fn build_json(profile: &Profile, rec: &Recommendation) -> JsonRecommendation {
    JsonRecommendation {
        user: profile.identity.clone(),
        source: source_label(rec.source),
        items: rec
            .items
            .iter()
            .enumerate()
            .map(|(i, name)| JsonRecommendedItem {
                rank: i + 1,
                name: name.clone(),
                your_cpi: profile.stats.cpi.get(name),
            })
            .collect(),
        neighbors: rec
            .neighbors
            .iter()
            .map(|n: &NeighborCandidate| JsonNeighbor {
                identity: n.identity.clone(),
                distance: n.distance,
                shared_items: n.shared_items,
            })
            .collect(),
    }
}

/// Print the chain of comparisons from one round.
pub fn print_round(observations: &[Observation]) {
    println!("\nThis round:");
    for (i, o) in observations.iter().enumerate() {
        println!("{:>2}. {} over {}", i + 1, o.winner, o.loser);
    }
}

/// Print a recommendation list as a formatted terminal table.
pub fn print_table(profile: &Profile, rec: &Recommendation) {
    let name_width = rec.items.iter().map(|s| s.len()).max().unwrap_or(4).max(4);

    println!(" # | {:<name_width$} | Your CPI", "Item");
    println!("---|-{}-|---------", "-".repeat(name_width));
    for (i, name) in rec.items.iter().enumerate() {
        let cpi = match profile.stats.cpi.get(name) {
            Some(v) => format!("{v:>7.1}%"),
            None => format!("{:>8}", "new"),
        };
        println!("{:>2} | {:<name_width$} | {}", i + 1, name, cpi);
    }

    match rec.source {
        RecommendationSource::Neighbors => {
            let names: Vec<String> = rec
                .neighbors
                .iter()
                .map(|n| format!("{} ({:.1})", n.identity, n.distance))
                .collect();
            println!("\nBased on {} nearest profile(s): {}", rec.neighbors.len(), names.join(", "));
        }
        RecommendationSource::Catalog => {
            println!("\nNo similar profiles yet: picked from the full menu.");
        }
    }
}

/// Print a recommendation list as JSON.
pub fn print_json(profile: &Profile, rec: &Recommendation) {
    let output = build_json(profile, rec);
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

/// Print a profile comparison as a table or JSON.
pub fn print_comparison(report: &ComparisonReport, json: bool) {
    if json {
        let output = JsonComparison {
            user: report.user.clone(),
            peer: report.peer.clone(),
            distance: report.distance,
            shared_items: report.shared_items,
            click_agreement: report
                .click_agreement
                .iter()
                .map(|(item, agreement)| JsonAgreement { item: item.clone(), agreement: *agreement })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return;
    }

    if report.shared_items == 0 {
        println!("{} and {} have not rated any of the same items.", report.user, report.peer);
    } else {
        println!(
            "CPI distance between {} and {}: {:.2} over {} shared item(s)",
            report.user, report.peer, report.distance, report.shared_items,
        );
    }
    for (item, agreement) in &report.click_agreement {
        println!("  {item}: {:.2}% click agreement", agreement * 100.0);
    }
}
